use std::collections::{HashMap, HashSet};

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::auth::dto::PublicUser;
use crate::auth::repo::User;
use crate::capsules::dto::{
    CapsuleFeedItem, CapsuleForm, CapsuleResponse, FormFile, NestedCapsuleResponse,
    PublicCapsuleItem,
};
use crate::capsules::repo::{
    Capsule, CapsuleKind, NestedCapsule, NewCapsule, NewNestedCapsule, SharedCapsule,
};
use crate::capsules::visibility;
use crate::comments::repo::Comment;
use crate::error::ApiError;
use crate::likes::repo::Like;
use crate::profiles::dto::ProfileSummary;
use crate::profiles::repo::Profile;
use crate::state::AppState;
use crate::storage::{store_upload, MediaKind, StorageClient, StoredUpload};

pub const MAX_UPLOAD_FILES: usize = 10;

#[derive(Debug)]
pub(crate) struct CapsuleAttrs {
    pub title: String,
    pub description: String,
    pub unlock_date: OffsetDateTime,
    pub kind: CapsuleKind,
}

#[derive(Debug)]
pub(crate) struct NestedAttrs {
    pub title: String,
    pub description: String,
    pub unlock_date: OffsetDateTime,
}

fn parse_unlock_date(raw: Option<&str>) -> Result<OffsetDateTime, ApiError> {
    let raw = raw.ok_or_else(|| ApiError::validation("unlock_date is required"))?;
    OffsetDateTime::parse(raw.trim(), &Rfc3339)
        .map_err(|_| ApiError::validation("Invalid unlock_date, expected an RFC 3339 timestamp"))
}

fn required_title(title: Option<&str>) -> Result<String, ApiError> {
    let title = title.map(str::trim).unwrap_or_default();
    if title.is_empty() {
        return Err(ApiError::validation("Title is required"));
    }
    Ok(title.to_string())
}

fn ensure_file_limit(count: usize) -> Result<(), ApiError> {
    if count > MAX_UPLOAD_FILES {
        return Err(ApiError::validation(format!(
            "Too many files, the limit is {MAX_UPLOAD_FILES}"
        )));
    }
    Ok(())
}

pub(crate) fn validate_capsule_form(form: &CapsuleForm) -> Result<CapsuleAttrs, ApiError> {
    ensure_file_limit(form.files.len())?;
    let title = required_title(form.title.as_deref())?;
    let unlock_date = parse_unlock_date(form.unlock_date.as_deref())?;
    let kind = match form.kind.as_deref() {
        None => CapsuleKind::Personal,
        Some(raw) => CapsuleKind::parse_top_level(raw)
            .ok_or_else(|| ApiError::validation(format!("Unknown capsule kind '{raw}'")))?,
    };
    if kind == CapsuleKind::Shared && form.friend_ids.is_empty() {
        return Err(ApiError::validation(
            "A shared capsule needs at least one friend",
        ));
    }
    Ok(CapsuleAttrs {
        title,
        description: form.description.clone().unwrap_or_default(),
        unlock_date,
        kind,
    })
}

pub(crate) fn validate_nested_form(form: &CapsuleForm) -> Result<NestedAttrs, ApiError> {
    ensure_file_limit(form.files.len())?;
    let title = required_title(form.title.as_deref())?;
    let unlock_date = parse_unlock_date(form.unlock_date.as_deref())?;
    Ok(NestedAttrs {
        title,
        description: form.description.clone().unwrap_or_default(),
        unlock_date,
    })
}

/// A description that is a file path rather than prose: a `file://`
/// URI, or a whitespace-free absolute path (Unix or Windows drive).
pub(crate) fn is_local_file_ref(s: &str) -> bool {
    if s.starts_with("file://") {
        return true;
    }
    if s.is_empty() || s.chars().any(char::is_whitespace) {
        return false;
    }
    if s.starts_with('/') {
        return true;
    }
    let b = s.as_bytes();
    b.len() >= 3 && b[0].is_ascii_alphabetic() && b[1] == b':' && (b[2] == b'\\' || b[2] == b'/')
}

/// Media override rule for capsule creation. The first image upload
/// becomes the capsule media; when an audio upload is present and the
/// description looks like a placeholder file path, the audio key
/// replaces the description. One request can carry a cover image and a
/// voice-memo description together this way.
pub(crate) fn apply_media_rule(
    uploads: &[StoredUpload],
    description: &mut String,
) -> Option<String> {
    let media = uploads
        .iter()
        .find(|u| u.kind == MediaKind::Image)
        .map(|u| u.key.clone());
    if is_local_file_ref(description) {
        if let Some(audio) = uploads.iter().find(|u| u.kind == MediaKind::Audio) {
            *description = audio.key.clone();
        }
    }
    media
}

async fn store_files(
    storage: &dyn StorageClient,
    owner_id: Uuid,
    files: &[FormFile],
) -> anyhow::Result<Vec<StoredUpload>> {
    let mut uploads = Vec::with_capacity(files.len());
    for file in files {
        uploads.push(store_upload(storage, owner_id, file.body.clone(), &file.content_type).await?);
    }
    Ok(uploads)
}

pub async fn create_capsule(
    state: &AppState,
    owner_id: Uuid,
    form: CapsuleForm,
) -> Result<CapsuleResponse, ApiError> {
    let attrs = validate_capsule_form(&form)?;
    let uploads = store_files(state.storage.as_ref(), owner_id, &form.files).await?;

    let mut description = attrs.description;
    let media = apply_media_rule(&uploads, &mut description);

    let capsule = Capsule::insert(
        &state.db,
        NewCapsule {
            owner_id,
            title: attrs.title,
            description,
            unlock_date: attrs.unlock_date,
            kind: attrs.kind,
            media,
        },
    )
    .await?;

    if attrs.kind == CapsuleKind::Shared {
        let grant = SharedCapsule::insert(&state.db, capsule.id, owner_id, &form.friend_ids).await?;
        info!(grant = %grant.id, friends = grant.friend_ids.len(), "capsule shared");
    }

    info!(capsule = %capsule.id, owner = %owner_id, kind = ?capsule.kind, "capsule created");
    let now = OffsetDateTime::now_utc();
    let status = visibility::effective_status(capsule.unlock_date, capsule.status, now);
    Ok(CapsuleResponse::with_status(capsule, status))
}

pub async fn create_nested(
    state: &AppState,
    owner_id: Uuid,
    parent_id: Uuid,
    form: CapsuleForm,
) -> Result<NestedCapsuleResponse, ApiError> {
    let parent = owned_parent(&state.db, parent_id, owner_id).await?;
    let attrs = validate_nested_form(&form)?;
    let uploads = store_files(state.storage.as_ref(), owner_id, &form.files).await?;

    let mut description = attrs.description;
    let media = apply_media_rule(&uploads, &mut description);

    let nested = NestedCapsule::insert(
        &state.db,
        NewNestedCapsule {
            parent_id,
            owner_id,
            title: attrs.title,
            description,
            unlock_date: attrs.unlock_date,
            media,
        },
    )
    .await?;

    info!(nested = %nested.id, parent = %parent_id, owner = %owner_id, "nested capsule created");
    let now = OffsetDateTime::now_utc();
    let status = visibility::inherited_status(parent.unlock_date, nested.status, now);
    Ok(NestedCapsuleResponse::with_status(nested, status))
}

/// Parent lookup with the ownership rule folded in: a parent that
/// exists but belongs to someone else answers the same NotFound as a
/// missing one, so the route does not leak capsule existence.
async fn owned_parent(
    db: &sqlx::PgPool,
    parent_id: Uuid,
    owner_id: Uuid,
) -> Result<Capsule, ApiError> {
    let parent = Capsule::find_by_id(db, parent_id)
        .await?
        .filter(|c| c.owner_id == owner_id)
        .ok_or_else(|| ApiError::not_found("Capsule not found"))?;
    Ok(parent)
}

pub async fn get_capsule(
    db: &sqlx::PgPool,
    id: Uuid,
    owner_id: Uuid,
) -> Result<CapsuleResponse, ApiError> {
    let capsule = owned_parent(db, id, owner_id).await?;
    let now = OffsetDateTime::now_utc();
    let status = visibility::effective_status(capsule.unlock_date, capsule.status, now);
    Ok(CapsuleResponse::with_status(capsule, status))
}

pub async fn delete_capsule(db: &sqlx::PgPool, id: Uuid, owner_id: Uuid) -> Result<(), ApiError> {
    let deleted = Capsule::delete_owned(db, id, owner_id).await?;
    if !deleted {
        return Err(ApiError::not_found("Capsule not found"));
    }
    info!(capsule = %id, owner = %owner_id, "capsule deleted");
    Ok(())
}

/// Presigned URL for the capsule media. Not owner-scoped: shared and
/// public viewers fetch media through the same route.
pub async fn media_url(state: &AppState, id: Uuid) -> Result<String, ApiError> {
    let capsule = Capsule::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Capsule not found"))?;
    let key = capsule
        .media
        .ok_or_else(|| ApiError::not_found("Capsule has no media"))?;
    let url = state
        .storage
        .presign_get(&key, crate::storage::MEDIA_URL_TTL_SECS)
        .await?;
    Ok(url)
}

pub async fn feed_for_user(
    db: &sqlx::PgPool,
    user_id: Uuid,
) -> Result<Vec<CapsuleFeedItem>, ApiError> {
    let owned = Capsule::list_by_owner(db, user_id).await?;
    let grants = SharedCapsule::list_for_friend(db, user_id).await?;

    let capsule_ids: Vec<Uuid> = grants.iter().map(|g| g.capsule_id).collect();
    let shared: HashMap<Uuid, Capsule> = Capsule::list_by_ids(db, &capsule_ids)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();

    let creator_ids: Vec<Uuid> = grants.iter().map(|g| g.created_by).collect();
    let creators: HashMap<Uuid, User> = User::list_by_ids(db, &creator_ids)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();
    let creator_profiles: HashMap<Uuid, Profile> = Profile::list_by_user_ids(db, &creator_ids)
        .await?
        .into_iter()
        .map(|p| (p.user_id, p))
        .collect();

    Ok(compose_feed(
        owned,
        &grants,
        &shared,
        &creators,
        &creator_profiles,
        OffsetDateTime::now_utc(),
    ))
}

/// Own capsules first, then capsules granted through shares, each with
/// its effective status for this read. Shared entries carry the
/// creator's identity and profile so the feed can say who shared them.
pub(crate) fn compose_feed(
    owned: Vec<Capsule>,
    grants: &[SharedCapsule],
    shared: &HashMap<Uuid, Capsule>,
    creators: &HashMap<Uuid, User>,
    creator_profiles: &HashMap<Uuid, Profile>,
    now: OffsetDateTime,
) -> Vec<CapsuleFeedItem> {
    let mut items: Vec<CapsuleFeedItem> = owned
        .into_iter()
        .map(|c| {
            let status = visibility::effective_status(c.unlock_date, c.status, now);
            CapsuleFeedItem {
                capsule: CapsuleResponse::with_status(c, status),
                is_shared: false,
                created_by: None,
                creator_profile: None,
            }
        })
        .collect();

    for grant in grants {
        // A grant can outlive its capsule; skip those.
        let Some(capsule) = shared.get(&grant.capsule_id) else {
            continue;
        };
        let status = visibility::effective_status(capsule.unlock_date, capsule.status, now);
        items.push(CapsuleFeedItem {
            capsule: CapsuleResponse::with_status(capsule.clone(), status),
            is_shared: true,
            created_by: creators.get(&grant.created_by).map(|u| PublicUser {
                id: u.id,
                email: u.email.clone(),
            }),
            creator_profile: creator_profiles
                .get(&grant.created_by)
                .map(ProfileSummary::from_profile),
        });
    }
    items
}

#[derive(Debug, Default)]
pub(crate) struct EngagementTotals {
    pub likes: HashMap<Uuid, i64>,
    pub comments: HashMap<Uuid, i64>,
    pub liked_by_viewer: HashSet<Uuid>,
}

pub async fn public_capsules_for_user(
    db: &sqlx::PgPool,
    target_user_id: Uuid,
    viewer_id: Uuid,
) -> Result<Vec<PublicCapsuleItem>, ApiError> {
    let capsules = Capsule::list_public_by_owner(db, target_user_id).await?;
    let capsule_ids: Vec<Uuid> = capsules.iter().map(|c| c.id).collect();

    // One grouped query per aggregate over the whole candidate set.
    let totals = EngagementTotals {
        likes: Like::count_by_capsules(db, &capsule_ids).await?,
        comments: Comment::count_by_capsules(db, &capsule_ids).await?,
        liked_by_viewer: Like::liked_capsule_ids(db, viewer_id, &capsule_ids).await?,
    };
    let children =
        NestedCapsule::list_by_parents_for_owner(db, &capsule_ids, target_user_id).await?;

    Ok(compose_public_listing(
        capsules,
        children,
        &totals,
        OffsetDateTime::now_utc(),
    ))
}

pub(crate) fn compose_public_listing(
    capsules: Vec<Capsule>,
    children: Vec<NestedCapsule>,
    totals: &EngagementTotals,
    now: OffsetDateTime,
) -> Vec<PublicCapsuleItem> {
    let mut by_parent: HashMap<Uuid, Vec<NestedCapsule>> = HashMap::new();
    for child in children {
        by_parent.entry(child.parent_id).or_default().push(child);
    }

    capsules
        .into_iter()
        .map(|c| {
            let nested_capsules = by_parent
                .remove(&c.id)
                .unwrap_or_default()
                .into_iter()
                .map(|n| {
                    let status = visibility::inherited_status(c.unlock_date, n.status, now);
                    NestedCapsuleResponse::with_status(n, status)
                })
                .collect();
            let likes_count = totals.likes.get(&c.id).copied().unwrap_or(0);
            let comments_count = totals.comments.get(&c.id).copied().unwrap_or(0);
            let is_liked_by_user = totals.liked_by_viewer.contains(&c.id);
            let status = visibility::effective_status(c.unlock_date, c.status, now);
            PublicCapsuleItem {
                capsule: CapsuleResponse::with_status(c, status),
                likes_count,
                comments_count,
                is_liked_by_user,
                nested_capsules,
            }
        })
        .collect()
}

pub async fn nested_for_parent(
    db: &sqlx::PgPool,
    parent_id: Uuid,
    owner_id: Uuid,
) -> Result<Vec<NestedCapsuleResponse>, ApiError> {
    let parent = owned_parent(db, parent_id, owner_id).await?;
    let children = NestedCapsule::list_by_parent(db, parent_id).await?;
    let now = OffsetDateTime::now_utc();
    Ok(children
        .into_iter()
        .map(|n| {
            let status = visibility::inherited_status(parent.unlock_date, n.status, now);
            NestedCapsuleResponse::with_status(n, status)
        })
        .collect())
}

pub async fn all_nested_for_user(
    db: &sqlx::PgPool,
    owner_id: Uuid,
) -> Result<Vec<NestedCapsuleResponse>, ApiError> {
    let children = NestedCapsule::list_by_owner(db, owner_id).await?;
    let parent_ids: Vec<Uuid> = children.iter().map(|n| n.parent_id).collect();
    let parents: HashMap<Uuid, Capsule> = Capsule::list_by_ids(db, &parent_ids)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();
    Ok(compose_all_nested(
        children,
        &parents,
        OffsetDateTime::now_utc(),
    ))
}

/// Children whose parent is gone keep their stored status; there is no
/// parent date left to derive from.
pub(crate) fn compose_all_nested(
    children: Vec<NestedCapsule>,
    parents: &HashMap<Uuid, Capsule>,
    now: OffsetDateTime,
) -> Vec<NestedCapsuleResponse> {
    children
        .into_iter()
        .map(|n| {
            let status = match parents.get(&n.parent_id) {
                Some(parent) => visibility::inherited_status(parent.unlock_date, n.status, now),
                None => n.status,
            };
            NestedCapsuleResponse::with_status(n, status)
        })
        .collect()
}

#[cfg(test)]
mod composition_tests {
    use super::*;
    use crate::capsules::repo::CapsuleStatus;
    use time::Duration;

    fn capsule(owner: Uuid, unlock: OffsetDateTime, kind: CapsuleKind) -> Capsule {
        Capsule {
            id: Uuid::new_v4(),
            owner_id: owner,
            title: "t".into(),
            description: String::new(),
            unlock_date: unlock,
            kind,
            status: CapsuleStatus::Locked,
            media: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn nested(parent: &Capsule, unlock: OffsetDateTime) -> NestedCapsule {
        NestedCapsule {
            id: Uuid::new_v4(),
            parent_id: parent.id,
            owner_id: parent.owner_id,
            title: "child".into(),
            description: String::new(),
            unlock_date: unlock,
            kind: CapsuleKind::Nested,
            status: CapsuleStatus::Locked,
            media: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn grant(capsule: &Capsule, friend: Uuid) -> SharedCapsule {
        SharedCapsule {
            id: Uuid::new_v4(),
            capsule_id: capsule.id,
            created_by: capsule.owner_id,
            friend_ids: vec![friend],
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn user(email: &str) -> User {
        User {
            id: Uuid::new_v4(),
            email: email.into(),
            password_hash: "x".into(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn owned_capsule_unlocked_yesterday_lists_open() {
        let now = OffsetDateTime::now_utc();
        let me = Uuid::new_v4();
        let c = capsule(me, now - Duration::days(1), CapsuleKind::Personal);

        let feed = compose_feed(
            vec![c],
            &[],
            &HashMap::new(),
            &HashMap::new(),
            &HashMap::new(),
            now,
        );
        assert_eq!(feed.len(), 1);
        assert!(!feed[0].is_shared);
        assert_eq!(feed[0].capsule.status, CapsuleStatus::Open);
    }

    #[test]
    fn shared_capsule_is_tagged_with_its_creator() {
        let now = OffsetDateTime::now_utc();
        let creator = user("a@example.com");
        let friend = Uuid::new_v4();
        let c = capsule(creator.id, now + Duration::days(7), CapsuleKind::Shared);
        let g = grant(&c, friend);

        let shared: HashMap<Uuid, Capsule> = [(c.id, c)].into_iter().collect();
        let creators: HashMap<Uuid, User> = [(creator.id, creator.clone())].into_iter().collect();

        let feed = compose_feed(
            Vec::new(),
            &[g],
            &shared,
            &creators,
            &HashMap::new(),
            now,
        );
        assert_eq!(feed.len(), 1);
        assert!(feed[0].is_shared);
        assert_eq!(
            feed[0].created_by.as_ref().map(|u| u.id),
            Some(creator.id)
        );
        assert_eq!(feed[0].capsule.status, CapsuleStatus::Locked);
    }

    #[test]
    fn grant_without_a_capsule_is_skipped() {
        let now = OffsetDateTime::now_utc();
        let c = capsule(Uuid::new_v4(), now, CapsuleKind::Shared);
        let g = grant(&c, Uuid::new_v4());
        // Capsule map deliberately left empty.
        let feed = compose_feed(
            Vec::new(),
            &[g],
            &HashMap::new(),
            &HashMap::new(),
            &HashMap::new(),
            now,
        );
        assert!(feed.is_empty());
    }

    #[test]
    fn owned_come_before_shared() {
        let now = OffsetDateTime::now_utc();
        let me = Uuid::new_v4();
        let mine = capsule(me, now + Duration::days(1), CapsuleKind::Personal);
        let theirs = capsule(Uuid::new_v4(), now + Duration::days(1), CapsuleKind::Shared);
        let g = grant(&theirs, me);
        let shared: HashMap<Uuid, Capsule> = [(theirs.id, theirs)].into_iter().collect();

        let feed = compose_feed(
            vec![mine],
            &[g],
            &shared,
            &HashMap::new(),
            &HashMap::new(),
            now,
        );
        assert_eq!(feed.len(), 2);
        assert!(!feed[0].is_shared);
        assert!(feed[1].is_shared);
    }

    #[test]
    fn public_listing_merges_engagement_totals() {
        let now = OffsetDateTime::now_utc();
        let owner = Uuid::new_v4();
        let c = capsule(owner, now + Duration::days(3), CapsuleKind::Public);

        let totals = EngagementTotals {
            likes: [(c.id, 2)].into_iter().collect(),
            comments: [(c.id, 1)].into_iter().collect(),
            liked_by_viewer: [c.id].into_iter().collect(),
        };

        let items = compose_public_listing(vec![c], Vec::new(), &totals, now);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].likes_count, 2);
        assert_eq!(items[0].comments_count, 1);
        assert!(items[0].is_liked_by_user);
    }

    #[test]
    fn public_listing_defaults_missing_aggregates_to_zero() {
        let now = OffsetDateTime::now_utc();
        let c = capsule(Uuid::new_v4(), now, CapsuleKind::Public);
        let items =
            compose_public_listing(vec![c], Vec::new(), &EngagementTotals::default(), now);
        assert_eq!(items[0].likes_count, 0);
        assert_eq!(items[0].comments_count, 0);
        assert!(!items[0].is_liked_by_user);
    }

    #[test]
    fn nested_children_follow_the_parent_unlock() {
        let now = OffsetDateTime::now_utc();
        let parent = capsule(Uuid::new_v4(), now - Duration::days(1), CapsuleKind::Public);
        // Child's own unlock date is far in the future and ignored.
        let child = nested(&parent, now + Duration::days(365));

        let items =
            compose_public_listing(vec![parent], vec![child], &EngagementTotals::default(), now);
        assert_eq!(items[0].nested_capsules.len(), 1);
        assert_eq!(items[0].nested_capsules[0].status, CapsuleStatus::Open);
    }

    #[test]
    fn orphaned_nested_keeps_stored_status() {
        let now = OffsetDateTime::now_utc();
        let parent = capsule(Uuid::new_v4(), now - Duration::days(2), CapsuleKind::Personal);
        let adopted = nested(&parent, now + Duration::days(1));
        let orphan = nested(&parent, now - Duration::days(10));
        let orphan = NestedCapsule {
            parent_id: Uuid::new_v4(),
            ..orphan
        };

        let parents: HashMap<Uuid, Capsule> = [(parent.id, parent)].into_iter().collect();
        let out = compose_all_nested(vec![adopted, orphan], &parents, now);
        assert_eq!(out[0].status, CapsuleStatus::Open);
        assert_eq!(out[1].status, CapsuleStatus::Locked);
    }
}

#[cfg(test)]
mod form_tests {
    use super::*;
    use bytes::Bytes;
    use crate::capsules::dto::FormFile;

    fn form(title: &str, unlock: &str) -> CapsuleForm {
        CapsuleForm {
            title: Some(title.into()),
            unlock_date: Some(unlock.into()),
            ..CapsuleForm::default()
        }
    }

    #[test]
    fn personal_form_parses_with_defaults() {
        let attrs = validate_capsule_form(&form("Trip", "2030-01-01T00:00:00Z")).unwrap();
        assert_eq!(attrs.kind, CapsuleKind::Personal);
        assert_eq!(attrs.title, "Trip");
        assert_eq!(attrs.description, "");
    }

    #[test]
    fn missing_title_is_rejected() {
        let mut f = form("  ", "2030-01-01T00:00:00Z");
        let err = validate_capsule_form(&f).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        f.title = None;
        assert!(validate_capsule_form(&f).is_err());
    }

    #[test]
    fn malformed_unlock_date_is_rejected() {
        let err = validate_capsule_form(&form("t", "next tuesday")).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn kind_is_parsed_case_insensitively() {
        let mut f = form("t", "2030-01-01T00:00:00Z");
        f.kind = Some("Public".into());
        assert_eq!(validate_capsule_form(&f).unwrap().kind, CapsuleKind::Public);

        f.kind = Some("nested".into());
        assert!(validate_capsule_form(&f).is_err());
    }

    #[test]
    fn shared_without_friends_is_rejected() {
        let mut f = form("t", "2030-01-01T00:00:00Z");
        f.kind = Some("shared".into());
        let err = validate_capsule_form(&f).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        f.friend_ids = vec![Uuid::new_v4()];
        assert_eq!(validate_capsule_form(&f).unwrap().kind, CapsuleKind::Shared);
    }

    #[test]
    fn file_count_is_capped() {
        let mut f = form("t", "2030-01-01T00:00:00Z");
        f.files = (0..MAX_UPLOAD_FILES + 1)
            .map(|_| FormFile {
                content_type: "image/png".into(),
                body: Bytes::new(),
            })
            .collect();
        assert!(validate_capsule_form(&f).is_err());

        f.files.pop();
        assert!(validate_capsule_form(&f).is_ok());
    }
}

#[cfg(test)]
mod media_rule_tests {
    use super::*;

    fn upload(key: &str, kind: MediaKind) -> StoredUpload {
        StoredUpload {
            key: key.into(),
            kind,
        }
    }

    #[test]
    fn local_file_refs_are_recognized() {
        assert!(is_local_file_ref("file:///tmp/memo.m4a"));
        assert!(is_local_file_ref("/var/mobile/recording.wav"));
        assert!(is_local_file_ref("C:\\voice\\memo.m4a"));
        assert!(is_local_file_ref("D:/voice/memo.m4a"));

        assert!(!is_local_file_ref(""));
        assert!(!is_local_file_ref("my trip to rome"));
        assert!(!is_local_file_ref("hello"));
        assert!(!is_local_file_ref("C: drive notes"));
    }

    #[test]
    fn first_image_becomes_media() {
        let uploads = vec![
            upload("capsules/u/a.pdf", MediaKind::Other),
            upload("capsules/u/b.png", MediaKind::Image),
            upload("capsules/u/c.jpg", MediaKind::Image),
        ];
        let mut description = String::from("a real description");
        let media = apply_media_rule(&uploads, &mut description);
        assert_eq!(media.as_deref(), Some("capsules/u/b.png"));
        assert_eq!(description, "a real description");
    }

    #[test]
    fn audio_replaces_placeholder_description() {
        let uploads = vec![
            upload("capsules/u/cover.jpg", MediaKind::Image),
            upload("capsules/u/memo.m4a", MediaKind::Audio),
        ];
        let mut description = String::from("file:///tmp/memo.m4a");
        let media = apply_media_rule(&uploads, &mut description);
        assert_eq!(media.as_deref(), Some("capsules/u/cover.jpg"));
        assert_eq!(description, "capsules/u/memo.m4a");
    }

    #[test]
    fn audio_leaves_real_description_alone() {
        let uploads = vec![upload("capsules/u/memo.m4a", MediaKind::Audio)];
        let mut description = String::from("what I sounded like in 2025");
        let media = apply_media_rule(&uploads, &mut description);
        assert_eq!(media, None);
        assert_eq!(description, "what I sounded like in 2025");
    }

    #[test]
    fn no_uploads_changes_nothing() {
        let mut description = String::from("/holiday/note");
        let media = apply_media_rule(&[], &mut description);
        assert_eq!(media, None);
        assert_eq!(description, "/holiday/note");
    }
}
