//! # Gateway
//!
//! Blocking request/reply access to the remote services. Every call either returns the service's
//! answer or a [`GatewayError`] describing why the call itself could not complete; it is up to the
//! caller to decide what an unsuccessful answer means.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod svc_client;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::time::Duration;

use comms_if::net::{zmq, MonitoredSocketError};

use crate::mission::{Mission, Position};

pub use svc_client::{SvcClient, ZmqGateway};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// The four remote services used by the controller.
pub trait Gateway {
    /// Load the mission document.
    ///
    /// An empty document is a successful call, check [`Mission::is_empty`].
    fn load_mission(&mut self) -> Result<Mission, GatewayError>;

    /// Move the robot to `(x, y)`, returning whether the location was reached.
    fn move_robot(&mut self, x: f64, y: f64) -> Result<bool, GatewayError>;

    /// Sense the position of the target.
    fn detect_target(&mut self) -> Result<Position, GatewayError>;

    /// Move the end effector to `(x, y, z)`, returning whether the move was carried out.
    fn move_end_effector(&mut self, x: f64, y: f64, z: f64) -> Result<bool, GatewayError>;
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("The {0} service did not become available within {1:?}")]
    NotConnected(&'static str, Duration),

    #[error("The {0} service did not reply within {1:?}")]
    Timeout(&'static str, Duration),

    #[error("Could not send the request to the {0} service: {1}")]
    SendError(&'static str, zmq::Error),

    #[error("Could not recieve a reply from the {0} service: {1}")]
    RecvError(&'static str, zmq::Error),

    #[error("Could not serialize the request: {0}")]
    SerializationError(serde_json::Error),

    #[error("Could not deserialize the reply from the {0} service: {1}")]
    DeserializeError(&'static str, serde_json::Error),

    #[error("The {0} service replied with a message which was not valid UTF-8")]
    NonUtf8Reply(&'static str),

    #[error("The {0} service reported an error: {1}")]
    ServiceError(&'static str, String),

    #[error("The mission document is not valid JSON: {0}")]
    MissionDecodeError(serde_json::Error),
}
