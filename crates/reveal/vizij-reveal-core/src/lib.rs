//! Vizij Reveal Core (engine-agnostic)
//!
//! Visibility-driven animation for scroll-revealed content: a one-shot
//! visibility latch, a reveal controller built on it, and an eased numeric
//! counter gated by the same latch. Hosts (browser, tests, headless drivers)
//! plug in through [`host::IntersectionHost`] and [`host::FrameHost`]; the
//! [`Stage`] routes their callbacks and returns [`Outputs`] for adapters to
//! apply.

pub mod config;
pub mod counter;
pub mod easing;
pub mod error;
pub mod host;
pub mod ids;
pub mod margin;
pub mod observer;
pub mod outputs;
pub mod reveal;
pub mod stage;

// Re-exports for consumers (adapters)
pub use config::{Config, CounterConfig, CounterDefaults, RevealConfig, RevealDefaults};
pub use counter::{CounterAnimator, CounterPhase};
pub use easing::{Easing, EasingCurve};
pub use error::ConfigError;
pub use host::{FrameHost, Host, IntersectionHost, ManualHost};
pub use ids::{FrameHandle, IdAllocator, InstId, SubscriptionId, TargetHandle};
pub use margin::{MarginLength, RootMargin};
pub use observer::{IntersectionSample, ObserverOptions, VisibilityObserver};
pub use outputs::{Change, CoreEvent, Outputs};
pub use reveal::RevealController;
pub use stage::Stage;
