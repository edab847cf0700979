//! # System Executable Parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::net::NetParams;
use serde::Deserialize;

use crate::controller::ControllerState;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct SysExecParams {
    /// Service and event endpoints
    pub net: NetParams,

    /// Maximum time to wait for a service's reply before the call is failed
    #[serde(default = "default_rpc_timeout_ms")]
    pub rpc_timeout_ms: u64,

    /// Maximum time to wait for a service to be connected before the call is failed
    #[serde(default = "default_service_wait_timeout_ms")]
    pub service_wait_timeout_ms: u64,

    /// Limit on the number of transitions one controller tick may cascade through
    #[serde(default = "default_max_transitions_per_tick")]
    pub max_transitions_per_tick: usize,

    pub indicator: IndicatorParams,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IndicatorParams {
    /// BCM pin number of the status line
    pub status_pin: u8,

    /// BCM pin number of the error line
    pub error_pin: u8,

    /// Use simulated lines even when GPIO is available
    #[serde(default)]
    pub simulated: bool,
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn default_rpc_timeout_ms() -> u64 {
    5000
}

fn default_service_wait_timeout_ms() -> u64 {
    2000
}

fn default_max_transitions_per_tick() -> usize {
    ControllerState::ALL.len()
}
