//! # Controller States

use std::fmt::{self, Display};

/// Phases of the mission, in the order they are worked through.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ControllerState {
    /// Waiting for the operator to press the start button
    AwaitingStart,

    /// Loading the mission document
    LoadingMission,

    /// Deciding if the mission is complete, or planning the next target
    CheckingMission,

    /// Moving the robot to the target's location
    MovingRobot,

    /// Sensing the target's position
    DetectingTarget,

    /// Moving the end effector to the target's position
    MovingEffector,

    /// Recording that the target is now in its desired state
    UpdatingTargetState,

    /// A phase failed. Terminal, requires a human to acknowledge it before the process exits.
    Faulted,
}

/// A change from one state to another.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Transition {
    pub from: ControllerState,
    pub to: ControllerState,
}

impl ControllerState {
    /// Every state, in phase order.
    pub const ALL: [ControllerState; 8] = [
        ControllerState::AwaitingStart,
        ControllerState::LoadingMission,
        ControllerState::CheckingMission,
        ControllerState::MovingRobot,
        ControllerState::DetectingTarget,
        ControllerState::MovingEffector,
        ControllerState::UpdatingTargetState,
        ControllerState::Faulted,
    ];

    /// Position of the state in the phase order.
    pub const fn phase_index(self) -> usize {
        match self {
            ControllerState::AwaitingStart => 0,
            ControllerState::LoadingMission => 1,
            ControllerState::CheckingMission => 2,
            ControllerState::MovingRobot => 3,
            ControllerState::DetectingTarget => 4,
            ControllerState::MovingEffector => 5,
            ControllerState::UpdatingTargetState => 6,
            ControllerState::Faulted => 7,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            ControllerState::AwaitingStart => "AWAITING_START",
            ControllerState::LoadingMission => "LOADING_MISSION",
            ControllerState::CheckingMission => "CHECKING_MISSION",
            ControllerState::MovingRobot => "MOVING_ROBOT",
            ControllerState::DetectingTarget => "DETECTING_TARGET",
            ControllerState::MovingEffector => "MOVING_EFFECTOR",
            ControllerState::UpdatingTargetState => "UPDATING_TARGET_STATE",
            ControllerState::Faulted => "FAULTED",
        }
    }
}

impl Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Transition {
    /// True if the new state comes later in the phase order, in which case it is handled within
    /// the same tick.
    pub fn cascades(&self) -> bool {
        self.to.phase_index() > self.from.phase_index()
    }
}
