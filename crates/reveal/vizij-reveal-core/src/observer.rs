//! One-shot visibility detection.
//!
//! A [`VisibilityObserver`] owns at most one host subscription. The first
//! record that satisfies its threshold latches `has_been_visible`, releases
//! the subscription and moves the latch into a terminal state; nothing can
//! re-arm it. Entrance animations therefore never replay on scroll-back.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::host::IntersectionHost;
use crate::ids::{SubscriptionId, TargetHandle};
use crate::margin::RootMargin;

/// Observation parameters: visible-area threshold and root margins.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObserverOptions {
    threshold: f64,
    root_margin: RootMargin,
}

impl Default for ObserverOptions {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            root_margin: RootMargin::default(),
        }
    }
}

impl ObserverOptions {
    /// Thresholds outside `[0, 1]` are clamped; NaN is rejected.
    pub fn new(threshold: f64, root_margin: RootMargin) -> Result<Self, ConfigError> {
        if threshold.is_nan() {
            return Err(ConfigError::InvalidThreshold { value: threshold });
        }
        let clamped = threshold.clamp(0.0, 1.0);
        if clamped != threshold {
            warn!("visibility threshold {threshold} clamped to {clamped}");
        }
        Ok(Self {
            threshold: clamped,
            root_margin,
        })
    }

    pub fn with_threshold(threshold: f64) -> Result<Self, ConfigError> {
        Self::new(threshold, RootMargin::default())
    }

    #[inline]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    #[inline]
    pub fn root_margin(&self) -> &RootMargin {
        &self.root_margin
    }

    /// Whether a record counts as "entered the viewport".
    #[inline]
    pub fn is_satisfied_by(&self, sample: &IntersectionSample) -> bool {
        sample.is_intersecting && sample.ratio >= self.threshold
    }
}

/// One observation record delivered by the host.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntersectionSample {
    /// Fraction of the element's area inside the (margin-adjusted) viewport.
    pub ratio: f64,
    pub is_intersecting: bool,
}

impl IntersectionSample {
    pub fn new(ratio: f64, is_intersecting: bool) -> Self {
        Self {
            ratio,
            is_intersecting,
        }
    }

    /// Record derived from the ratio alone; any positive area intersects.
    pub fn from_ratio(ratio: f64) -> Self {
        Self::new(ratio, ratio > 0.0)
    }

    pub fn hidden() -> Self {
        Self::new(0.0, false)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Latch {
    /// Not yet observing: no target, or the host could not resolve it.
    Pending,
    Observing(SubscriptionId),
    /// Terminal: the element was seen.
    Fired,
    /// Terminal: torn down before the element was seen.
    Released,
}

/// Single-fire visibility latch around one host subscription.
#[derive(Debug)]
pub struct VisibilityObserver {
    options: ObserverOptions,
    target: Option<TargetHandle>,
    latch: Latch,
}

impl VisibilityObserver {
    pub fn new(options: ObserverOptions) -> Self {
        Self {
            options,
            target: None,
            latch: Latch::Pending,
        }
    }

    pub fn options(&self) -> &ObserverOptions {
        &self.options
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// Monotonic: once true, true for the rest of this observer's life.
    #[inline]
    pub fn has_been_visible(&self) -> bool {
        self.latch == Latch::Fired
    }

    pub fn subscription(&self) -> Option<SubscriptionId> {
        match self.latch {
            Latch::Observing(sub) => Some(sub),
            _ => None,
        }
    }

    /// Fired or released; no further host interaction will happen.
    pub fn is_finished(&self) -> bool {
        matches!(self.latch, Latch::Fired | Latch::Released)
    }

    /// Bind the observer to `target` and start observing it.
    ///
    /// With no target, or a target the host cannot resolve yet, observation is
    /// deferred. Re-attaching to a different target moves the single
    /// subscription. Returns the live subscription, if any.
    pub fn attach<H>(&mut self, target: Option<&str>, host: &mut H) -> Option<SubscriptionId>
    where
        H: IntersectionHost + ?Sized,
    {
        match self.latch {
            Latch::Fired | Latch::Released => return None,
            Latch::Observing(sub) => {
                if target.is_none() || target == self.target.as_deref() {
                    return Some(sub);
                }
                host.unobserve(sub);
                self.latch = Latch::Pending;
            }
            Latch::Pending => {}
        }
        if let Some(t) = target {
            self.target = Some(t.to_string());
        }
        self.engage(host)
    }

    /// Retry a deferred observation against the current target.
    pub fn engage<H>(&mut self, host: &mut H) -> Option<SubscriptionId>
    where
        H: IntersectionHost + ?Sized,
    {
        if let Latch::Observing(sub) = self.latch {
            return Some(sub);
        }
        if self.latch != Latch::Pending {
            return None;
        }
        let target = self.target.as_deref()?;
        match host.observe(target, &self.options) {
            Some(sub) => {
                self.latch = Latch::Observing(sub);
                Some(sub)
            }
            None => {
                debug!("observation of '{target}' deferred: target not resolvable");
                None
            }
        }
    }

    /// Feed one record. Returns `true` exactly once, on the record that
    /// latches visibility; the subscription is released before returning.
    pub fn on_intersection<H>(
        &mut self,
        subscription: SubscriptionId,
        sample: IntersectionSample,
        host: &mut H,
    ) -> bool
    where
        H: IntersectionHost + ?Sized,
    {
        let Latch::Observing(sub) = self.latch else {
            return false;
        };
        if sub != subscription || !self.options.is_satisfied_by(&sample) {
            return false;
        }
        self.latch = Latch::Fired;
        host.unobserve(sub);
        debug!(
            "'{}' became visible (ratio {:.3} >= {:.3})",
            self.target.as_deref().unwrap_or_default(),
            sample.ratio,
            self.options.threshold
        );
        true
    }

    /// Release the subscription if still engaged. Idempotent; never clears
    /// `has_been_visible`.
    pub fn teardown<H>(&mut self, host: &mut H)
    where
        H: IntersectionHost + ?Sized,
    {
        match self.latch {
            Latch::Observing(sub) => {
                host.unobserve(sub);
                self.latch = Latch::Released;
            }
            Latch::Pending => self.latch = Latch::Released,
            Latch::Fired | Latch::Released => {}
        }
    }
}
