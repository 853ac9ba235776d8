//! Bridge configuration
//!
//! Two policies decide how a bridge behaves at the edges:
//! - what to do when a reducer yields nothing that can be bound for
//!   entity-to-store forwarding
//! - whether `get_state` hands out plain snapshots or live entity handles

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};

/// Environment variable overriding [`BridgeConfig::on_unbound_forward`]
pub const UNBOUND_FORWARD_ENV: &str = "ENTITY_BRIDGE_UNBOUND_FORWARD";

/// Environment variable overriding [`BridgeConfig::state_access`]
pub const STATE_ACCESS_ENV: &str = "ENTITY_BRIDGE_STATE_ACCESS";

/// Policy for a reducer whose default state is not an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnboundForward {
    /// Fail the build with `MissingDefaultState`
    #[default]
    Throw,
    /// Build a store without entity-to-store forwarding
    Ignore,
}

/// What `get_state` returns when the reducer keeps entities in the state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateAccess {
    /// Plain JSON snapshot, taken at the time of the call
    #[default]
    Snapshot,
    /// Whatever the reducer returned, entity handles included
    Live,
}

impl std::str::FromStr for UnboundForward {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "throw" => Ok(UnboundForward::Throw),
            "ignore" => Ok(UnboundForward::Ignore),
            other => Err(BridgeError::Config(format!(
                "{UNBOUND_FORWARD_ENV} must be 'throw' or 'ignore', got '{other}'"
            ))),
        }
    }
}

impl std::str::FromStr for StateAccess {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "snapshot" => Ok(StateAccess::Snapshot),
            "live" => Ok(StateAccess::Live),
            other => Err(BridgeError::Config(format!(
                "{STATE_ACCESS_ENV} must be 'snapshot' or 'live', got '{other}'"
            ))),
        }
    }
}

/// Options for [`crate::BridgeBuilder`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Default: `Throw`
    pub on_unbound_forward: UnboundForward,

    /// Default: `Snapshot`
    pub state_access: StateAccess,
}

impl BridgeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lenient preset: unbound reducers build without forwarding, state is live
    pub fn permissive() -> Self {
        Self {
            on_unbound_forward: UnboundForward::Ignore,
            state_access: StateAccess::Live,
        }
    }

    /// Defaults overridden by `ENTITY_BRIDGE_UNBOUND_FORWARD` and
    /// `ENTITY_BRIDGE_STATE_ACCESS` when set
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(value) = lookup(UNBOUND_FORWARD_ENV) {
            config.on_unbound_forward = value.parse()?;
        }
        if let Some(value) = lookup(STATE_ACCESS_ENV) {
            config.state_access = value.parse()?;
        }
        Ok(config)
    }

    pub fn with_unbound_forward(mut self, policy: UnboundForward) -> Self {
        self.on_unbound_forward = policy;
        self
    }

    pub fn with_state_access(mut self, access: StateAccess) -> Self {
        self.state_access = access;
        self
    }
}
