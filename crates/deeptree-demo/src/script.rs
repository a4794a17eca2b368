#![forbid(unsafe_code)]

//! Trigger scripts.
//!
//! A script is a list of triggers applied in order after mounting:
//!
//! - `toggle` flips the root `loading` channel (the button).
//! - `toggle:above` / `toggle:below` flips whichever `loading` channel that
//!   side's tree sees, which differs from the root one under a nested scope.
//! - `depth:above=<n>` / `depth:below=<n>` moves a depth slider; `<n>` is
//!   clamped to the slider range when applied.
//! - `check:true` / `check:false` sets the root `loading` channel directly
//!   (the checkbox).

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::DemoError;

/// One of the two trees in the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Above,
    Below,
}

impl Side {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Above => "above",
            Self::Below => "below",
        }
    }
}

impl FromStr for Side {
    type Err = DemoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "above" => Ok(Self::Above),
            "below" => Ok(Self::Below),
            other => Err(DemoError::trigger(other, "expected `above` or `below`")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Trigger {
    Toggle { scope: Option<Side> },
    Depth { side: Side, raw: i64 },
    Check { value: bool },
}

impl FromStr for Trigger {
    type Err = DemoError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let input = input.trim();
        let (verb, rest) = match input.split_once(':') {
            Some((verb, rest)) => (verb, Some(rest)),
            None => (input, None),
        };
        match (verb, rest) {
            ("toggle", None) => Ok(Self::Toggle { scope: None }),
            ("toggle", Some(side)) => Ok(Self::Toggle {
                scope: Some(side.parse().map_err(|_| {
                    DemoError::trigger(input, "toggle scope must be `above` or `below`")
                })?),
            }),
            ("depth", Some(assignment)) => {
                let (side, value) = assignment
                    .split_once('=')
                    .ok_or_else(|| DemoError::trigger(input, "expected `depth:<side>=<n>`"))?;
                let side = side
                    .parse()
                    .map_err(|_| DemoError::trigger(input, "depth side must be `above` or `below`"))?;
                let raw = value
                    .trim()
                    .parse()
                    .map_err(|_| DemoError::trigger(input, "depth must be an integer"))?;
                Ok(Self::Depth { side, raw })
            }
            ("check", Some(value)) => match value.trim() {
                "true" | "on" => Ok(Self::Check { value: true }),
                "false" | "off" => Ok(Self::Check { value: false }),
                _ => Err(DemoError::trigger(input, "check expects `true` or `false`")),
            },
            _ => Err(DemoError::trigger(input, "unknown trigger")),
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Toggle { scope: None } => f.write_str("toggle"),
            Self::Toggle { scope: Some(side) } => write!(f, "toggle:{}", side.label()),
            Self::Depth { side, raw } => write!(f, "depth:{}={raw}", side.label()),
            Self::Check { value } => write!(f, "check:{value}"),
        }
    }
}

/// Parse a list of trigger strings, failing on the first invalid one.
pub fn parse_script<S: AsRef<str>>(items: &[S]) -> crate::error::Result<Vec<Trigger>> {
    items.iter().map(|item| item.as_ref().parse()).collect()
}
