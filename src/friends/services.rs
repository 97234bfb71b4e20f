use std::collections::HashMap;

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::auth::dto::PublicUser;
use crate::auth::repo::User;
use crate::error::ApiError;
use crate::friends::dto::{Decision, FriendItem, PendingRequestItem};
use crate::friends::repo::Friendship;
use crate::profiles::dto::ProfileSummary;
use crate::profiles::repo::Profile;

/// Guards for a new request: no self-edges, no second edge between a
/// pair that already has one in either direction.
pub(crate) fn ensure_requestable(
    requester: Uuid,
    recipient: Uuid,
    already_linked: bool,
) -> Result<(), ApiError> {
    if requester == recipient {
        return Err(ApiError::validation(
            "Cannot send a friend request to yourself",
        ));
    }
    if already_linked {
        return Err(ApiError::conflict(
            "A friendship or pending request already exists",
        ));
    }
    Ok(())
}

/// The side of an edge that is not `me`.
pub(crate) fn other_party(edge: &Friendship, me: Uuid) -> Uuid {
    if edge.requester_id == me {
        edge.recipient_id
    } else {
        edge.requester_id
    }
}

pub async fn send_request(
    db: &PgPool,
    requester: Uuid,
    recipient: Uuid,
) -> Result<Friendship, ApiError> {
    // Check and insert are separate statements, so two concurrent
    // requests for the same pair can both pass the check.
    let existing = Friendship::find_between(db, requester, recipient).await?;
    ensure_requestable(requester, recipient, existing.is_some())?;

    let edge = Friendship::create_pending(db, requester, recipient).await?;
    info!(requester = %requester, recipient = %recipient, "friend request sent");
    Ok(edge)
}

/// Resolves a request by its original direction: the edge must have
/// been sent by `requester_id` to `recipient_id`. A request the
/// responder sent themselves never matches, even though it links the
/// same pair.
pub async fn respond(
    db: &PgPool,
    requester_id: Uuid,
    recipient_id: Uuid,
    decision: Decision,
) -> Result<Friendship, ApiError> {
    let updated =
        Friendship::set_status_directional(db, requester_id, recipient_id, decision.as_status())
            .await?
            .ok_or_else(|| ApiError::not_found("Friend request not found"))?;
    info!(
        requester = %requester_id,
        recipient = %recipient_id,
        decision = ?decision,
        "friend request resolved"
    );
    Ok(updated)
}

pub async fn list_friends(db: &PgPool, user_id: Uuid) -> Result<Vec<FriendItem>, ApiError> {
    let edges = Friendship::list_accepted_for(db, user_id).await?;
    let friend_ids: Vec<Uuid> = edges.iter().map(|e| other_party(e, user_id)).collect();

    let users = User::list_by_ids(db, &friend_ids).await?;
    let users: HashMap<Uuid, User> = users.into_iter().map(|u| (u.id, u)).collect();
    let profiles = Profile::list_by_user_ids(db, &friend_ids).await?;
    let profiles: HashMap<Uuid, Profile> =
        profiles.into_iter().map(|p| (p.user_id, p)).collect();

    // Edges whose other side no longer resolves to a user are skipped;
    // nothing removes edges when an account goes away.
    let items = friend_ids
        .into_iter()
        .filter_map(|id| {
            let user = users.get(&id)?;
            Some(FriendItem {
                user: PublicUser {
                    id: user.id,
                    email: user.email.clone(),
                },
                profile: profiles.get(&id).map(ProfileSummary::from_profile),
            })
        })
        .collect();
    Ok(items)
}

pub async fn list_pending(db: &PgPool, user_id: Uuid) -> Result<Vec<PendingRequestItem>, ApiError> {
    let edges = Friendship::list_pending_to(db, user_id).await?;
    let requester_ids: Vec<Uuid> = edges.iter().map(|e| e.requester_id).collect();

    let users = User::list_by_ids(db, &requester_ids).await?;
    let users: HashMap<Uuid, User> = users.into_iter().map(|u| (u.id, u)).collect();
    let profiles = Profile::list_by_user_ids(db, &requester_ids).await?;
    let profiles: HashMap<Uuid, Profile> =
        profiles.into_iter().map(|p| (p.user_id, p)).collect();

    let items = edges
        .into_iter()
        .filter_map(|edge| {
            let user = users.get(&edge.requester_id)?;
            Some(PendingRequestItem {
                requester: PublicUser {
                    id: user.id,
                    email: user.email.clone(),
                },
                profile: profiles
                    .get(&edge.requester_id)
                    .map(ProfileSummary::from_profile),
                requested_at: edge.created_at,
            })
        })
        .collect();
    Ok(items)
}

/// Drops every edge between the pair, regardless of status or of who
/// asked whom. Removing a pair with no edges is not an error.
pub async fn remove(db: &PgPool, user_id: Uuid, friend_id: Uuid) -> Result<u64, ApiError> {
    let removed = Friendship::delete_between(db, user_id, friend_id).await?;
    info!(user = %user_id, friend = %friend_id, removed, "friendship removed");
    Ok(removed)
}

#[cfg(test)]
mod graph_tests {
    use super::*;
    use crate::friends::repo::FriendshipStatus;
    use time::OffsetDateTime;

    fn edge(requester: Uuid, recipient: Uuid) -> Friendship {
        Friendship {
            id: Uuid::new_v4(),
            requester_id: requester,
            recipient_id: recipient,
            status: FriendshipStatus::Accepted,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn other_party_resolves_both_directions() {
        let me = Uuid::new_v4();
        let them = Uuid::new_v4();

        assert_eq!(other_party(&edge(me, them), me), them);
        assert_eq!(other_party(&edge(them, me), me), them);
    }

    #[test]
    fn self_request_rejected() {
        let me = Uuid::new_v4();
        let err = ensure_requestable(me, me, false).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn duplicate_edge_rejected_regardless_of_direction() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let err = ensure_requestable(a, b, true).unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[test]
    fn fresh_pair_is_requestable() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert!(ensure_requestable(a, b, false).is_ok());
    }

    #[test]
    fn decision_maps_to_status() {
        assert_eq!(Decision::Accepted.as_status(), FriendshipStatus::Accepted);
        assert_eq!(Decision::Rejected.as_status(), FriendshipStatus::Rejected);
    }
}
