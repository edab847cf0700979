//! # Mission Loader Service

use serde::{Deserialize, Serialize};

use super::SvcRequest;

/// Request the current mission document. Carries no data.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct LoadMissionReq;

/// The mission document, JSON encoded as a string.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LoadMissionRep {
    pub json_mission: String,
}

impl SvcRequest for LoadMissionReq {
    type Reply = LoadMissionRep;

    const SERVICE: &'static str = "load_mission";
}
