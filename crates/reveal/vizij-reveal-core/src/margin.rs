//! Root margins in CSS margin shorthand (`"10px"`, `"0px 0px -10% 0px"`).
//!
//! Margins grow or shrink the viewport box used for intersection tests. The
//! core only validates and normalizes them; hosts pass the canonical string
//! form to their observation facility.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A single margin length. Only absolute pixels and percentages are accepted,
/// matching what IntersectionObserver accepts for `rootMargin`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum MarginLength {
    Px(f64),
    Percent(f64),
}

impl Default for MarginLength {
    fn default() -> Self {
        MarginLength::Px(0.0)
    }
}

impl fmt::Display for MarginLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarginLength::Px(v) => write!(f, "{v}px"),
            MarginLength::Percent(v) => write!(f, "{v}%"),
        }
    }
}

fn parse_length(input: &str, token: &str) -> Result<MarginLength, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidRootMargin {
        input: input.to_string(),
        reason: reason.to_string(),
    };
    let (number, percent) = if let Some(n) = token.strip_suffix("px") {
        (n, false)
    } else if let Some(n) = token.strip_suffix('%') {
        (n, true)
    } else if token == "0" {
        ("0", false)
    } else {
        return Err(invalid(&format!("'{token}' must be in px or %")));
    };
    let v: f64 = number
        .parse()
        .map_err(|_| invalid(&format!("'{token}' is not a number")))?;
    if !v.is_finite() {
        return Err(invalid(&format!("'{token}' is not finite")));
    }
    Ok(if percent {
        MarginLength::Percent(v)
    } else {
        MarginLength::Px(v)
    })
}

/// Four-sided margin around the observation root.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RootMargin {
    pub top: MarginLength,
    pub right: MarginLength,
    pub bottom: MarginLength,
    pub left: MarginLength,
}

impl RootMargin {
    /// Parse CSS shorthand with one to four lengths. An empty string means no margin.
    pub fn parse(input: &str) -> Result<Self, ConfigError> {
        let lengths = input
            .split_whitespace()
            .map(|tok| parse_length(input, tok))
            .collect::<Result<Vec<_>, _>>()?;
        let (top, right, bottom, left) = match lengths.as_slice() {
            [] => return Ok(Self::default()),
            [all] => (*all, *all, *all, *all),
            [v, h] => (*v, *h, *v, *h),
            [t, h, b] => (*t, *h, *b, *h),
            [t, r, b, l] => (*t, *r, *b, *l),
            _ => {
                return Err(ConfigError::InvalidRootMargin {
                    input: input.to_string(),
                    reason: format!("expected 1 to 4 lengths, got {}", lengths.len()),
                })
            }
        };
        Ok(Self {
            top,
            right,
            bottom,
            left,
        })
    }

    pub fn is_zero(&self) -> bool {
        [self.top, self.right, self.bottom, self.left]
            .iter()
            .all(|l| match l {
                MarginLength::Px(v) | MarginLength::Percent(v) => *v == 0.0,
            })
    }
}

impl fmt::Display for RootMargin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.top, self.right, self.bottom, self.left)
    }
}

impl FromStr for RootMargin {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RootMargin {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<RootMargin> for String {
    fn from(m: RootMargin) -> Self {
        m.to_string()
    }
}
