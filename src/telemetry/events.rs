use serde::Serialize;
use tracing::info;
use uuid::Uuid;

/// Domain-level events emitted alongside the request logs.
#[derive(Debug, Serialize)]
#[serde(tag = "event_type")]
pub enum BusinessEvent {
    CommentCreated {
        comment_id: Uuid,
        parent_id: Option<Uuid>,
        depth: usize,
    },
    ThreadDeleted {
        root_id: Uuid,
        removed: u64,
    },
}

impl BusinessEvent {
    pub fn log(&self) {
        let event_json = serde_json::to_string(self).unwrap_or_else(|_| format!("{:?}", self));
        info!(
            target: "business_events",
            event = %event_json,
            "Business event occurred"
        );
    }
}
