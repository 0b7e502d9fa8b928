use serde::{Deserialize, Serialize};

use crate::listing::ThreadListing;
use crate::update::UiUpdate;

/// Pipeline stage names, used to tag failures and no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    EnsureThread,
    Guard,
    RecordTurn,
    RenameTitle,
    Stream,
    Settle,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::EnsureThread => "ensure_thread",
            Stage::Guard => "guard",
            Stage::RecordTurn => "record_turn",
            Stage::RenameTitle => "rename_title",
            Stage::Stream => "stream",
            Stage::Settle => "settle",
        };
        f.write_str(name)
    }
}

/// Everything the pipeline tells the presentation layer, in emission order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    /// The submission is bound to a thread (possibly created just now)
    ThreadAssigned {
        thread_id: String,
        created: bool,
    },

    /// Guard stage result; `go` is false for empty input
    Guarded {
        go: bool,
        update: UiUpdate,
    },

    /// Refreshed thread list, emitted after the title stage
    Listing {
        threads: Vec<ThreadListing>,
        #[serde(skip_serializing_if = "Option::is_none")]
        renamed: Option<String>,
    },

    /// One generated fragment, with the transcript as accumulated so far
    Fragment {
        content: String,
        update: UiUpdate,
    },

    /// Generation finished and the reply was stored
    Completed {
        message_id: String,
        content: String,
        update: UiUpdate,
    },

    /// Generation stopped on request; nothing was stored for the reply
    Cancelled {
        update: UiUpdate,
    },

    /// A stage failed; the run is over
    Failed {
        stage: Stage,
        message: String,
        update: UiUpdate,
    },

    /// A stage ran without changing anything
    NoOp {
        stage: Stage,
        update: UiUpdate,
    },

    /// Post-completion status reset
    Settled {
        update: UiUpdate,
    },
}

impl PipelineEvent {
    pub fn name(&self) -> &'static str {
        match self {
            PipelineEvent::ThreadAssigned { .. } => "thread_assigned",
            PipelineEvent::Guarded { .. } => "guarded",
            PipelineEvent::Listing { .. } => "listing",
            PipelineEvent::Fragment { .. } => "fragment",
            PipelineEvent::Completed { .. } => "completed",
            PipelineEvent::Cancelled { .. } => "cancelled",
            PipelineEvent::Failed { .. } => "failed",
            PipelineEvent::NoOp { .. } => "no_op",
            PipelineEvent::Settled { .. } => "settled",
        }
    }

    pub fn update(&self) -> Option<&UiUpdate> {
        match self {
            PipelineEvent::Guarded { update, .. }
            | PipelineEvent::Fragment { update, .. }
            | PipelineEvent::Completed { update, .. }
            | PipelineEvent::Cancelled { update }
            | PipelineEvent::Failed { update, .. }
            | PipelineEvent::NoOp { update, .. }
            | PipelineEvent::Settled { update } => Some(update),
            PipelineEvent::ThreadAssigned { .. } | PipelineEvent::Listing { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_tagging() {
        let event = PipelineEvent::ThreadAssigned {
            thread_id: "t1".to_string(),
            created: true,
        };
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "thread_assigned");
        assert_eq!(json["thread_id"], "t1");
        assert_eq!(event.name(), "thread_assigned");
    }

    #[test]
    fn test_guard_and_no_op_leave_ui_unchanged() {
        let no_op = PipelineEvent::NoOp {
            stage: Stage::Stream,
            update: UiUpdate::unchanged(),
        };
        let guard = PipelineEvent::Guarded {
            go: false,
            update: UiUpdate::unchanged(),
        };

        assert!(no_op.update().unwrap().is_unchanged());
        assert!(guard.update().unwrap().is_unchanged());
    }
}
