//! # Service Interface
//!
//! Request and reply structures exchanged with the remote services. Every request is sent as JSON
//! on the service's REQ socket and answered with a JSON [`SvcRep`] wrapping the service-specific
//! reply.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod effector;
pub mod mission;
pub mod perception;
pub mod robot;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A request which can be sent to a service, tied to the reply the service gives for it.
pub trait SvcRequest: Serialize {
    /// The reply the service answers this request with
    type Reply: for<'de> Deserialize<'de>;

    /// Name of the service, used in logs and errors
    const SERVICE: &'static str;
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Envelope around every service reply.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum SvcRep<T> {
    /// The service handled the request
    Ok(T),

    /// The service could not handle the request, with a diagnostic message
    Error(String),
}

#[cfg(test)]
mod test {
    use super::*;
    use super::robot::{MoveRobotRep, MoveRobotReq};

    #[test]
    fn test_reply_envelope() {
        let rep: SvcRep<MoveRobotRep> =
            serde_json::from_str(r#"{"Ok": {"reached_position": true}}"#).unwrap();
        assert_eq!(rep, SvcRep::Ok(MoveRobotRep { reached_position: true }));

        let rep: SvcRep<MoveRobotRep> =
            serde_json::from_str(r#"{"Error": "wheel stalled"}"#).unwrap();
        assert_eq!(rep, SvcRep::Error("wheel stalled".into()));
    }

    #[test]
    fn test_request_field_names() {
        let json = serde_json::to_value(MoveRobotReq { x: 1.5, y: -2.0 }).unwrap();
        assert_eq!(json["X"], 1.5);
        assert_eq!(json["Y"], -2.0);
        assert_eq!(MoveRobotReq::SERVICE, "move_robot");
    }
}
