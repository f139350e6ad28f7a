//! Eased numeric counter gated by visibility.
//!
//! Idle until its observer fires, then one frame request at a time until the
//! elapsed fraction reaches 1, at which point the value is exactly `target`.
//!
//! ```text
//! Idle --visible--> Animating --elapsed = 1--> Done
//!   \                  |
//!    +---teardown------+-----> Cancelled
//! ```

use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

use crate::config::{CounterConfig, CounterDefaults};
use crate::easing::EasingCurve;
use crate::error::ConfigError;
use crate::host::{Host, IntersectionHost};
use crate::ids::{FrameHandle, SubscriptionId};
use crate::observer::{IntersectionSample, VisibilityObserver};

/// Externally visible lifecycle of a counter.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CounterPhase {
    Idle,
    Animating,
    Done,
    Cancelled,
}

#[derive(Debug)]
enum Run {
    Idle,
    Animating {
        /// Latched from the first frame callback, never reset.
        start: Option<f64>,
        pending: Option<FrameHandle>,
    },
    Done,
    Cancelled,
}

#[derive(Debug)]
pub struct CounterAnimator {
    observer: VisibilityObserver,
    target: u64,
    duration_ms: f64,
    suffix: String,
    easing: Box<dyn EasingCurve>,
    value: u64,
    run: Run,
}

/// Normalized elapsed time; a non-positive duration means "already finished".
#[inline]
pub fn elapsed_fraction(elapsed_ms: f64, duration_ms: f64) -> f64 {
    if duration_ms <= 0.0 {
        return 1.0;
    }
    (elapsed_ms / duration_ms).clamp(0.0, 1.0)
}

impl CounterAnimator {
    pub fn new(cfg: &CounterConfig, defaults: &CounterDefaults) -> Result<Self, ConfigError> {
        let target = u64::try_from(cfg.target).unwrap_or_else(|_| {
            warn!("counter target {} is negative; clamped to 0", cfg.target);
            0
        });
        let mut duration_ms = cfg.duration_ms.unwrap_or(defaults.duration_ms);
        if duration_ms.is_nan() || duration_ms <= 0.0 {
            warn!("counter duration {duration_ms}ms is not positive; counter will jump to target");
            duration_ms = 0.0;
        }
        let easing = cfg.easing.unwrap_or(defaults.easing);
        Ok(Self {
            observer: VisibilityObserver::new(cfg.observer_options(defaults)?),
            target,
            duration_ms,
            suffix: cfg.suffix.clone(),
            easing: Box::new(easing),
            value: 0,
            run: Run::Idle,
        })
    }

    /// Replace the easing strategy.
    pub fn with_easing(mut self, easing: impl EasingCurve + 'static) -> Self {
        self.easing = Box::new(easing);
        self
    }

    #[inline]
    pub fn value(&self) -> u64 {
        self.value
    }

    #[inline]
    pub fn target(&self) -> u64 {
        self.target
    }

    pub fn duration_ms(&self) -> f64 {
        self.duration_ms
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Displayed text: the current value followed by the suffix label.
    pub fn text(&self) -> String {
        format!("{}{}", self.value, self.suffix)
    }

    pub fn phase(&self) -> CounterPhase {
        match self.run {
            Run::Idle => CounterPhase::Idle,
            Run::Animating { .. } => CounterPhase::Animating,
            Run::Done => CounterPhase::Done,
            Run::Cancelled => CounterPhase::Cancelled,
        }
    }

    pub fn pending_frame(&self) -> Option<FrameHandle> {
        match self.run {
            Run::Animating { pending, .. } => pending,
            _ => None,
        }
    }

    pub fn observer(&self) -> &VisibilityObserver {
        &self.observer
    }

    pub fn target_handle(&self) -> Option<&str> {
        self.observer.target()
    }

    pub fn attach<H>(&mut self, target: Option<&str>, host: &mut H) -> Option<SubscriptionId>
    where
        H: IntersectionHost + ?Sized,
    {
        self.observer.attach(target, host)
    }

    /// Retry a deferred observation.
    pub fn engage<H>(&mut self, host: &mut H) -> Option<SubscriptionId>
    where
        H: IntersectionHost + ?Sized,
    {
        self.observer.engage(host)
    }

    /// Feed one record; on the visibility edge, request the first frame.
    /// Returns `true` when the animation started.
    pub fn on_intersection<H>(
        &mut self,
        subscription: SubscriptionId,
        sample: IntersectionSample,
        host: &mut H,
    ) -> bool
    where
        H: Host + ?Sized,
    {
        if !self.observer.on_intersection(subscription, sample, host) {
            return false;
        }
        if !matches!(self.run, Run::Idle) {
            return false;
        }
        let pending = host.request_frame();
        if pending.is_none() {
            warn!("no frame scheduler available; counter holds at {}", self.value);
        }
        self.run = Run::Animating {
            start: None,
            pending,
        };
        debug!("counter started: 0 -> {} over {}ms", self.target, self.duration_ms);
        true
    }

    /// Advance on a frame tick. Frames this counter did not request (stale,
    /// cancelled, or foreign) are ignored and `false` is returned.
    ///
    /// A tick without a finite timestamp leaves the value alone and asks for
    /// another frame. The value never decreases, even if the clock does.
    pub fn on_frame<H>(&mut self, handle: FrameHandle, timestamp_ms: f64, host: &mut H) -> bool
    where
        H: Host + ?Sized,
    {
        let start = match &mut self.run {
            Run::Animating { start, pending } if *pending == Some(handle) => {
                if !timestamp_ms.is_finite() {
                    trace!("frame {handle:?} has timestamp {timestamp_ms}; waiting for the next");
                    *pending = host.request_frame();
                    return true;
                }
                *pending = None;
                *start.get_or_insert(timestamp_ms)
            }
            _ => {
                trace!("ignoring frame {handle:?}: not the pending request");
                return false;
            }
        };

        let fraction = elapsed_fraction(timestamp_ms - start, self.duration_ms);
        self.value = self.value.max(self.value_at(fraction));

        if fraction < 1.0 && self.target > 0 {
            let pending = host.request_frame();
            self.run = Run::Animating {
                start: Some(start),
                pending,
            };
        } else {
            self.value = self.target;
            self.run = Run::Done;
            debug!("counter finished at {}", self.value);
        }
        true
    }

    /// `floor(ease(p) × target)`, exactly `target` once `p` reaches 1.
    pub fn value_at(&self, fraction: f64) -> u64 {
        if fraction >= 1.0 {
            return self.target;
        }
        let ease = self.easing.apply(fraction).clamp(0.0, 1.0);
        ((ease * self.target as f64).floor() as u64).min(self.target)
    }

    /// Release the observation and cancel any pending frame. Idempotent.
    pub fn teardown<H>(&mut self, host: &mut H)
    where
        H: Host + ?Sized,
    {
        self.observer.teardown(host);
        match self.run {
            Run::Animating { pending, .. } => {
                if let Some(handle) = pending {
                    host.cancel_frame(handle);
                }
                self.run = Run::Cancelled;
            }
            Run::Idle => self.run = Run::Cancelled,
            Run::Done | Run::Cancelled => {}
        }
    }
}
