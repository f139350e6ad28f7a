//! Reveal controller: hidden → visible, exactly once.
//!
//! The controller does no timing. `delay_ms` is handed to the rendering layer
//! as a CSS transition delay so sibling elements can stagger their entrance.

use crate::config::{RevealConfig, RevealDefaults};
use crate::error::ConfigError;
use crate::host::IntersectionHost;
use crate::ids::SubscriptionId;
use crate::observer::{IntersectionSample, VisibilityObserver};

#[derive(Debug)]
pub struct RevealController {
    observer: VisibilityObserver,
    delay_ms: u32,
    class_name: String,
    base_class: String,
    visible_class: String,
}

impl RevealController {
    pub fn new(cfg: &RevealConfig, defaults: &RevealDefaults) -> Result<Self, ConfigError> {
        Ok(Self {
            observer: VisibilityObserver::new(cfg.observer_options(defaults)?),
            delay_ms: cfg.delay_ms,
            class_name: cfg.class_name.clone(),
            base_class: defaults.base_class.clone(),
            visible_class: defaults.visible_class.clone(),
        })
    }

    #[inline]
    pub fn visible(&self) -> bool {
        self.observer.has_been_visible()
    }

    #[inline]
    pub fn transition_delay_ms(&self) -> u32 {
        self.delay_ms
    }

    /// CSS value for `transition-delay`.
    pub fn transition_delay(&self) -> String {
        format!("{}ms", self.delay_ms)
    }

    /// `"<base> [visible] <extra>"`, skipping empty parts.
    pub fn class_list(&self) -> String {
        let visible = if self.visible() {
            self.visible_class.as_str()
        } else {
            ""
        };
        [self.base_class.as_str(), visible, self.class_name.as_str()]
            .iter()
            .filter(|s| !s.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn observer(&self) -> &VisibilityObserver {
        &self.observer
    }

    pub fn target(&self) -> Option<&str> {
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

    /// Returns `true` when this record flipped `visible`.
    pub fn on_intersection<H>(
        &mut self,
        subscription: SubscriptionId,
        sample: IntersectionSample,
        host: &mut H,
    ) -> bool
    where
        H: IntersectionHost + ?Sized,
    {
        self.observer.on_intersection(subscription, sample, host)
    }

    pub fn teardown<H>(&mut self, host: &mut H)
    where
        H: IntersectionHost + ?Sized,
    {
        self.observer.teardown(host);
    }
}
