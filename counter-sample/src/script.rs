//! Action scripts and the side they are driven from

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Context};
use clap::ValueEnum;
use serde_json::Value;

/// One scripted action: `TYPE` or `TYPE=<json payload>`
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub action_type: String,
    pub payload: Option<Value>,
}

impl FromStr for Step {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (action_type, payload) = match s.split_once('=') {
            Some((action_type, raw)) => {
                let payload = serde_json::from_str(raw)
                    .with_context(|| format!("Invalid payload for '{}': {}", action_type, raw))?;
                (action_type, Some(payload))
            }
            None => (s, None),
        };

        let action_type = action_type.trim();
        if action_type.is_empty() {
            return Err(anyhow!("Empty action type in step '{}'", s));
        }

        Ok(Self {
            action_type: action_type.to_string(),
            payload,
        })
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.payload {
            Some(payload) => write!(f, "{}={}", self.action_type, payload),
            None => f.write_str(&self.action_type),
        }
    }
}

/// Parse a comma separated script
pub fn parse_script(raw: &str) -> anyhow::Result<Vec<Step>> {
    split_steps(raw)
        .into_iter()
        .map(|step| step.parse::<Step>())
        .collect()
}

/// Split on commas outside JSON brackets and strings
fn split_steps(raw: &str) -> Vec<&str> {
    let mut steps = Vec::new();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    let mut start = 0;

    for (index, c) in raw.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' | '[' if !in_string => depth += 1,
            '}' | ']' if !in_string => depth = depth.saturating_sub(1),
            ',' if !in_string && depth == 0 => {
                steps.push(raw[start..index].trim());
                start = index + 1;
            }
            _ => {}
        }
    }
    steps.push(raw[start..].trim());
    steps.retain(|step| !step.is_empty());
    steps
}

/// Where scripted actions are dispatched from
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Side {
    /// `store.dispatch(action)`
    Store,
    /// `entity_dispatch(entity, type, payload)`
    Entity,
    /// Store for even steps, entity for odd ones
    Alternate,
}

/// Resolved side for a single step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Store,
    Entity,
}

impl Side {
    pub fn origin(self, index: usize) -> Origin {
        match self {
            Side::Store => Origin::Store,
            Side::Entity => Origin::Entity,
            Side::Alternate if index % 2 == 0 => Origin::Store,
            Side::Alternate => Origin::Entity,
        }
    }
}

impl FromStr for Side {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Side as ValueEnum>::from_str(s, true).map_err(|e| anyhow!(e))
    }
}
