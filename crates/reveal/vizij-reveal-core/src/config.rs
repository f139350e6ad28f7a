//! Stage-wide defaults and per-instance configuration.
//!
//! Per-instance configs come from the content layer (often as JSON) and are
//! resolved against [`Config`] defaults when an instance is mounted.

use serde::{Deserialize, Serialize};

use crate::easing::Easing;
use crate::error::ConfigError;
use crate::margin::RootMargin;
use crate::observer::ObserverOptions;

/// Defaults applied to reveal instances.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealDefaults {
    /// Fraction of the element that must be on screen before revealing.
    pub threshold: f64,
    pub root_margin: RootMargin,
    /// Class always present on a reveal wrapper.
    pub base_class: String,
    /// Class added once the wrapper has been seen.
    pub visible_class: String,
}

impl Default for RevealDefaults {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            root_margin: RootMargin::default(),
            base_class: "reveal-item".to_string(),
            visible_class: "visible".to_string(),
        }
    }
}

/// Defaults applied to counter instances.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterDefaults {
    /// Stricter than reveal: a counter animating while barely visible looks broken.
    pub threshold: f64,
    pub root_margin: RootMargin,
    pub duration_ms: f64,
    pub easing: Easing,
}

impl Default for CounterDefaults {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            root_margin: RootMargin::default(),
            duration_ms: 2000.0,
            easing: Easing::EaseOutExpo,
        }
    }
}

/// Configuration for a stage.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub reveal: RevealDefaults,
    pub counter: CounterDefaults,
}

impl Config {
    pub fn from_json(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }
}

/// Per-instance reveal configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealConfig {
    /// Offset applied to the CSS transition start; lets siblings stagger.
    pub delay_ms: u32,
    /// Extra classes appended after the base/visible classes.
    pub class_name: String,
    pub threshold: Option<f64>,
    pub root_margin: Option<String>,
}

impl RevealConfig {
    pub fn with_delay(delay_ms: u32) -> Self {
        Self {
            delay_ms,
            ..Self::default()
        }
    }

    pub fn observer_options(
        &self,
        defaults: &RevealDefaults,
    ) -> Result<ObserverOptions, ConfigError> {
        resolve_options(
            self.threshold.unwrap_or(defaults.threshold),
            self.root_margin.as_deref(),
            &defaults.root_margin,
        )
    }
}

/// Per-instance counter configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterConfig {
    /// Final value; negative targets are clamped to 0.
    pub target: i64,
    /// Animation length; `<= 0` jumps straight to the target.
    pub duration_ms: Option<f64>,
    /// Label rendered after the number, e.g. `"+"` or `"%"`.
    pub suffix: String,
    pub threshold: Option<f64>,
    pub root_margin: Option<String>,
    pub easing: Option<Easing>,
}

impl CounterConfig {
    pub fn new(target: i64) -> Self {
        Self {
            target,
            ..Self::default()
        }
    }

    pub fn observer_options(
        &self,
        defaults: &CounterDefaults,
    ) -> Result<ObserverOptions, ConfigError> {
        resolve_options(
            self.threshold.unwrap_or(defaults.threshold),
            self.root_margin.as_deref(),
            &defaults.root_margin,
        )
    }
}

fn resolve_options(
    threshold: f64,
    margin: Option<&str>,
    default_margin: &RootMargin,
) -> Result<ObserverOptions, ConfigError> {
    let root_margin = match margin {
        Some(m) => RootMargin::parse(m)?,
        None => default_margin.clone(),
    };
    ObserverOptions::new(threshold, root_margin)
}
