//! Host seams: visibility observation and animation-frame scheduling.
//!
//! The core never talks to a browser. Adapters implement these traits (the
//! wasm crate wraps IntersectionObserver and requestAnimationFrame) and feed
//! the resulting callbacks back into a [`crate::Stage`]. Every acquisition has
//! a matching release, and releases must be idempotent.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::ids::{FrameHandle, SubscriptionId, TargetHandle};
use crate::observer::ObserverOptions;

/// Passive visibility observation of one element per subscription.
pub trait IntersectionHost {
    /// Start observing `target`. Returns `None` when the target cannot be
    /// resolved yet (not mounted); the caller defers and may retry.
    fn observe(&mut self, target: &str, options: &ObserverOptions) -> Option<SubscriptionId>;

    /// Stop delivering records for `subscription`. Unknown ids are ignored.
    fn unobserve(&mut self, subscription: SubscriptionId);
}

/// Display-refresh scheduling; one callback per request.
pub trait FrameHost {
    /// Request a single frame callback. `None` if no scheduler is available.
    fn request_frame(&mut self) -> Option<FrameHandle>;

    /// Cancel a pending request. Unknown or already-fired handles are ignored.
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Everything a stage needs from its environment.
pub trait Host: IntersectionHost + FrameHost {}

impl<T: IntersectionHost + FrameHost> Host for T {}

/// Recorded host interaction, in call order.
#[derive(Clone, Debug, PartialEq)]
pub enum HostCall {
    Observe {
        subscription: SubscriptionId,
        target: TargetHandle,
        threshold: f64,
    },
    Unobserve(SubscriptionId),
    RequestFrame(FrameHandle),
    CancelFrame(FrameHandle),
}

/// Deterministic in-memory host.
///
/// Tracks live subscriptions and pending frames so drivers (tests, headless
/// renderers) can decide which callbacks to deliver and assert that every
/// acquisition was released.
#[derive(Debug, Default)]
pub struct ManualHost {
    next_subscription: u32,
    next_frame: u32,
    subscriptions: BTreeMap<SubscriptionId, (TargetHandle, ObserverOptions)>,
    frames: BTreeSet<FrameHandle>,
    detached: HashSet<TargetHandle>,
    calls: Vec<HostCall>,
    frames_disabled: bool,
}

impl ManualHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat `target` as not mounted; `observe` on it returns `None`.
    pub fn detach_target(&mut self, target: &str) {
        self.detached.insert(target.to_string());
    }

    pub fn attach_target(&mut self, target: &str) {
        self.detached.remove(target);
    }

    /// Simulate an environment without a frame scheduler.
    pub fn disable_frames(&mut self) {
        self.frames_disabled = true;
    }

    pub fn subscription_for(&self, target: &str) -> Option<SubscriptionId> {
        self.subscriptions
            .iter()
            .find_map(|(id, (t, _))| (t == target).then_some(*id))
    }

    pub fn options_for(&self, subscription: SubscriptionId) -> Option<&ObserverOptions> {
        self.subscriptions.get(&subscription).map(|(_, o)| o)
    }

    pub fn active_subscriptions(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn pending_frames(&self) -> Vec<FrameHandle> {
        self.frames.iter().copied().collect()
    }

    /// Remove and return the oldest pending frame, as a display tick would.
    pub fn next_frame(&mut self) -> Option<FrameHandle> {
        self.frames.pop_first()
    }

    pub fn calls(&self) -> &[HostCall] {
        &self.calls
    }

    pub fn count_calls(&self, pred: impl Fn(&HostCall) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }
}

impl IntersectionHost for ManualHost {
    fn observe(&mut self, target: &str, options: &ObserverOptions) -> Option<SubscriptionId> {
        if self.detached.contains(target) {
            return None;
        }
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription = self.next_subscription.wrapping_add(1);
        self.subscriptions.insert(id, (target.to_string(), options.clone()));
        self.calls.push(HostCall::Observe {
            subscription: id,
            target: target.to_string(),
            threshold: options.threshold(),
        });
        Some(id)
    }

    fn unobserve(&mut self, subscription: SubscriptionId) {
        if self.subscriptions.remove(&subscription).is_some() {
            self.calls.push(HostCall::Unobserve(subscription));
        }
    }
}

impl FrameHost for ManualHost {
    fn request_frame(&mut self) -> Option<FrameHandle> {
        if self.frames_disabled {
            return None;
        }
        let handle = FrameHandle(self.next_frame);
        self.next_frame = self.next_frame.wrapping_add(1);
        self.frames.insert(handle);
        self.calls.push(HostCall::RequestFrame(handle));
        Some(handle)
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.frames.remove(&handle) {
            self.calls.push(HostCall::CancelFrame(handle));
        }
    }
}
