use time::OffsetDateTime;

use crate::capsules::repo::CapsuleStatus;

/// Effective status at `now`. A capsule opens once its unlock date has
/// passed; until then the stored status is kept as-is. The stored field
/// is never rewritten, so this must run on every read.
pub fn effective_status(
    unlock_date: OffsetDateTime,
    stored: CapsuleStatus,
    now: OffsetDateTime,
) -> CapsuleStatus {
    if unlock_date < now {
        CapsuleStatus::Open
    } else {
        stored
    }
}

/// Nested capsules open with their parent. The child's own unlock date
/// carries no meaning here.
pub fn inherited_status(
    parent_unlock_date: OffsetDateTime,
    child_stored: CapsuleStatus,
    now: OffsetDateTime,
) -> CapsuleStatus {
    effective_status(parent_unlock_date, child_stored, now)
}

#[cfg(test)]
mod visibility_tests {
    use super::*;
    use time::Duration;

    #[test]
    fn past_unlock_date_opens_the_capsule() {
        let now = OffsetDateTime::now_utc();
        let yesterday = now - Duration::days(1);
        assert_eq!(
            effective_status(yesterday, CapsuleStatus::Locked, now),
            CapsuleStatus::Open
        );
    }

    #[test]
    fn future_unlock_date_keeps_the_stored_status() {
        let now = OffsetDateTime::now_utc();
        let tomorrow = now + Duration::days(1);
        assert_eq!(
            effective_status(tomorrow, CapsuleStatus::Locked, now),
            CapsuleStatus::Locked
        );
    }

    #[test]
    fn stored_open_survives_a_future_unlock_date() {
        let now = OffsetDateTime::now_utc();
        let tomorrow = now + Duration::days(1);
        assert_eq!(
            effective_status(tomorrow, CapsuleStatus::Open, now),
            CapsuleStatus::Open
        );
    }

    #[test]
    fn unlock_exactly_now_is_still_locked() {
        let now = OffsetDateTime::now_utc();
        assert_eq!(
            effective_status(now, CapsuleStatus::Locked, now),
            CapsuleStatus::Locked
        );
    }

    #[test]
    fn child_follows_parent_not_its_own_date() {
        let now = OffsetDateTime::now_utc();
        let parent_unlock = now - Duration::days(1);
        // Child stored as locked with a far-future date of its own.
        assert_eq!(
            inherited_status(parent_unlock, CapsuleStatus::Locked, now),
            CapsuleStatus::Open
        );

        let parent_locked = now + Duration::days(30);
        assert_eq!(
            inherited_status(parent_locked, CapsuleStatus::Locked, now),
            CapsuleStatus::Locked
        );
    }
}
