//! # Target Detector Service

use serde::{Deserialize, Serialize};

use super::SvcRequest;

/// Request a detection of the current target. Carries no data.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct DetectTargetReq;

/// The sensed position of the target.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct DetectTargetRep {
    #[serde(rename = "X")]
    pub x: f64,

    #[serde(rename = "Y")]
    pub y: f64,

    #[serde(rename = "Z")]
    pub z: f64,
}

impl SvcRequest for DetectTargetReq {
    type Reply = DetectTargetRep;

    const SERVICE: &'static str = "detect_target";
}
