//! # End Effector Mover Service

use serde::{Deserialize, Serialize};

use super::SvcRequest;

/// Move the end effector to a 3D position.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct MoveEndEffectorReq {
    #[serde(rename = "X")]
    pub x: f64,

    #[serde(rename = "Y")]
    pub y: f64,

    #[serde(rename = "Z")]
    pub z: f64,
}

/// Acknowledgment of an end effector move.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct MoveEndEffectorRep {
    /// True if the move was carried out
    pub success: bool,
}

impl SvcRequest for MoveEndEffectorReq {
    type Reply = MoveEndEffectorRep;

    const SERVICE: &'static str = "move_endeffector";
}
