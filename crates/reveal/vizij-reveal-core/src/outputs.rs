//! Output contracts from the stage.
//!
//! Outputs carry the presentation state that changed during one dispatch,
//! keyed by instance and target handle, plus a list of semantic events.
//! Adapters (wasm/DOM) apply the changes synchronously to the page.

use serde::{Deserialize, Serialize};

use crate::ids::{InstId, TargetHandle};

/// Presentation state to reflect on one element.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Change {
    Reveal {
        inst: InstId,
        target: TargetHandle,
        visible: bool,
        class_list: String,
        transition_delay_ms: u32,
    },
    Counter {
        inst: InstId,
        target: TargetHandle,
        value: u64,
        text: String,
    },
}

impl Change {
    pub fn inst(&self) -> InstId {
        match self {
            Change::Reveal { inst, .. } | Change::Counter { inst, .. } => *inst,
        }
    }

    pub fn target(&self) -> &str {
        match self {
            Change::Reveal { target, .. } | Change::Counter { target, .. } => target,
        }
    }
}

/// Discrete semantic signals emitted during dispatch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum CoreEvent {
    /// Observation postponed: no target yet, or the host could not resolve it.
    Deferred { inst: InstId },
    Revealed { inst: InstId },
    CounterStarted { inst: InstId, target: u64 },
    CounterFinished { inst: InstId, value: u64 },
    /// Instance torn down while it still held host resources or was unfinished.
    Cancelled { inst: InstId },
}

/// Outputs returned by each stage dispatch.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Outputs {
    #[serde(default)]
    pub changes: Vec<Change>,
    #[serde(default)]
    pub events: Vec<CoreEvent>,
}

impl Outputs {
    #[inline]
    pub fn clear(&mut self) {
        self.changes.clear();
        self.events.clear();
    }

    #[inline]
    pub fn push_change(&mut self, change: Change) {
        self.changes.push(change);
    }

    #[inline]
    pub fn push_event(&mut self, event: CoreEvent) {
        self.events.push(event);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.events.is_empty()
    }
}
