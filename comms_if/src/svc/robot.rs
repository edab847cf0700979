//! # Robot Mover Service

use serde::{Deserialize, Serialize};

use super::SvcRequest;

/// Move the robot base to a 2D location.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct MoveRobotReq {
    #[serde(rename = "X")]
    pub x: f64,

    #[serde(rename = "Y")]
    pub y: f64,
}

/// Outcome of a robot move.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct MoveRobotRep {
    /// True if the robot reached the demanded location
    pub reached_position: bool,
}

impl SvcRequest for MoveRobotReq {
    type Reply = MoveRobotRep;

    const SERVICE: &'static str = "move_robot";
}
