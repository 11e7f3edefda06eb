use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Events emitted by the engine after successful mutations. Callers (webhook
/// dispatchers, cache invalidators) subscribe via the bus; the engine itself
/// never delivers webhooks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ContentEvent {
    PageCreated { id: Uuid },
    PageUpdated { id: Uuid },
    PagePublished { id: Uuid },
    PageUnpublished { id: Uuid },
    PageScheduled { id: Uuid, at: DateTime<Utc> },
    PageDeleted { id: Uuid },
    RevisionRestored { id: Uuid, revision_id: Uuid },
    PostCreated { id: Uuid },
    PostUpdated { id: Uuid },
    PostPublished { id: Uuid },
    PostUnpublished { id: Uuid },
    PostScheduled { id: Uuid, at: DateTime<Utc> },
    PostDeleted { id: Uuid },
    SweepCompleted { pages_published: usize, posts_published: usize },
}
