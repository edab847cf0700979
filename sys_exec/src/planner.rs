//! # Mission Planner
//!
//! Decides when a mission is complete and where the robot should go next. These decisions are
//! kept behind [`MissionPlanner`] so that a real planning capability can replace
//! [`DefaultPlanner`] without touching the controller.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::debug;

use crate::mission::{Location, Mission, Target};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

pub trait MissionPlanner {
    /// True if nothing remains to be done in the mission.
    fn mission_complete(&mut self, mission: &Mission) -> bool;

    /// Location the robot should move to for the next target of the mission.
    fn next_location(&mut self, mission: &Mission) -> Location;

    /// True if the sensed target is already where the mission wants it.
    fn target_at_desired(&mut self, target: &Target) -> bool;

    /// Record that the target has been brought to its desired state, false if that failed.
    fn set_target_to_desired(&mut self, target: &mut Target) -> bool;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Planner used until mission planning is available.
///
/// Never considers the mission complete or the target in place, and always heads for the origin.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultPlanner;

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MissionPlanner for DefaultPlanner {
    fn mission_complete(&mut self, mission: &Mission) -> bool {
        debug!("Checking mission {}", mission.document());
        false
    }

    fn next_location(&mut self, _mission: &Mission) -> Location {
        Location::default()
    }

    fn target_at_desired(&mut self, _target: &Target) -> bool {
        false
    }

    fn set_target_to_desired(&mut self, _target: &mut Target) -> bool {
        true
    }
}
