//! Publication state machine.
//!
//! States: draft, published, scheduled. Fully connected — every state is
//! reachable from every other via these operations; documents start as
//! drafts. Operates on the `Publication` fields shared by pages and posts.

use chrono::{DateTime, Utc};

use crate::document::model::{Publication, PublishStatus};
use crate::error::{EngineError, EngineResult};

/// Transition to published. Idempotent on status: re-publishing an already
/// published document refreshes `published_at`. Clears `scheduled_at`.
pub fn publish(publication: &mut Publication, now: DateTime<Utc>) {
    publication.status = PublishStatus::Published;
    publication.published_at = Some(now);
    publication.scheduled_at = None;
}

/// Transition back to draft. `published_at` is retained as the record of
/// the last time the document went live.
pub fn unpublish(publication: &mut Publication) {
    publication.status = PublishStatus::Draft;
    publication.scheduled_at = None;
}

/// Transition to scheduled for a strictly-future instant. Calling this on an
/// already-scheduled document just moves `scheduled_at` (idempotent
/// re-schedule).
pub fn schedule(
    publication: &mut Publication,
    publish_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> EngineResult<()> {
    if publish_at <= now {
        return Err(EngineError::Validation(
            "scheduled publish time must be in the future".to_string(),
        ));
    }
    publication.status = PublishStatus::Scheduled;
    publication.scheduled_at = Some(publish_at);
    Ok(())
}

/// A scheduled document whose time has arrived is due for the sweep.
pub fn is_due(publication: &Publication, now: DateTime<Utc>) -> bool {
    publication.status.is_scheduled()
        && publication.scheduled_at.is_some_and(|at| at <= now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn draft_to_published_sets_timestamp() {
        let mut publication = Publication::default();
        let now = Utc::now();
        publish(&mut publication, now);

        assert_eq!(publication.status, PublishStatus::Published);
        assert_eq!(publication.published_at, Some(now));
        assert!(publication.scheduled_at.is_none());
    }

    #[test]
    fn scheduled_to_published_clears_schedule() {
        let mut publication = Publication::default();
        let now = Utc::now();
        schedule(&mut publication, now + Duration::hours(1), now).unwrap();
        publish(&mut publication, now + Duration::hours(1));

        assert_eq!(publication.status, PublishStatus::Published);
        assert!(publication.scheduled_at.is_none());
    }

    #[test]
    fn unpublish_retains_published_at() {
        let mut publication = Publication::default();
        let now = Utc::now();
        publish(&mut publication, now);
        unpublish(&mut publication);

        assert_eq!(publication.status, PublishStatus::Draft);
        assert_eq!(publication.published_at, Some(now));
    }

    #[test]
    fn republish_refreshes_published_at() {
        let mut publication = Publication::default();
        let first = Utc::now();
        publish(&mut publication, first);
        let second = first + Duration::minutes(5);
        publish(&mut publication, second);

        assert_eq!(publication.published_at, Some(second));
    }

    #[test]
    fn schedule_rejects_past_instants() {
        let mut publication = Publication::default();
        let now = Utc::now();
        let result = schedule(&mut publication, now - Duration::seconds(1), now);
        assert!(matches!(result, Err(EngineError::Validation(_))));
        assert_eq!(publication.status, PublishStatus::Draft);
    }

    #[test]
    fn reschedule_moves_the_instant() {
        let mut publication = Publication::default();
        let now = Utc::now();
        schedule(&mut publication, now + Duration::hours(1), now).unwrap();
        schedule(&mut publication, now + Duration::hours(2), now).unwrap();

        assert_eq!(publication.status, PublishStatus::Scheduled);
        assert_eq!(publication.scheduled_at, Some(now + Duration::hours(2)));
    }

    #[test]
    fn due_only_when_scheduled_time_passed() {
        let mut publication = Publication::default();
        let now = Utc::now();
        assert!(!is_due(&publication, now));

        schedule(&mut publication, now + Duration::hours(1), now).unwrap();
        assert!(!is_due(&publication, now));
        assert!(is_due(&publication, now + Duration::hours(1)));
        assert!(is_due(&publication, now + Duration::hours(2)));
    }
}
