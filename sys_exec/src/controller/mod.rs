//! # Mission Controller
//!
//! The [`MissionController`] state machine steps a single mission through its phases:
//!
//! ```text
//! AWAITING_START -> LOADING_MISSION -> CHECKING_MISSION -> MOVING_ROBOT -> DETECTING_TARGET
//!       ^                  |               |     ^                             |      |
//!       +------------------+---------------+     +-----------------------------+      v
//!                                                |                             MOVING_EFFECTOR
//!                                                +---- UPDATING_TARGET_STATE <-------+
//! ```
//!
//! Any failed robot move, detection, or end effector move sends the controller to `FAULTED`,
//! where it stays until a human acknowledges the fault and the process exits.
//!
//! Each call to [`MissionController::tick`] handles the current state and keeps going for as long
//! as each transition leads further along the phase order, so a single tick may pass through
//! several phases. A transition back to an earlier phase ends the tick.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod state;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::Arc;

use log::{debug, error, info, warn};
use util::session;

pub use state::{ControllerState, Transition};

use crate::{
    event_input::StartLatch,
    fault_ack::FaultAck,
    gateway::{Gateway, GatewayError},
    indicator::{IndicatorHandle, IndicatorLines, IndicatorMode},
    mission::{Mission, Target},
    planner::MissionPlanner,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Mission controller.
///
/// Owns the mission and target data and all phase transitions. Remote work is done through the
/// gateway `G`, mission decisions are made by the planner `P`, and faults are acknowledged
/// through `A`.
pub struct MissionController<G, P, A> {
    state: ControllerState,

    /// The most recently loaded mission, cleared on a fault
    mission: Option<Mission>,

    target: Target,

    gateway: G,

    planner: P,

    fault_ack: A,

    fault_acknowledged: bool,

    lines: IndicatorLines,

    /// Armed exactly while the controller is in `AwaitingStart`
    start_latch: Arc<StartLatch>,

    /// The active indicator started on the last mission check, left to run for all operational
    /// phases
    active_indicator: Option<IndicatorHandle>,

    max_transitions_per_tick: usize,
}

/// Summary of one [`MissionController::tick`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// Transitions made during the tick, in order
    pub transitions: Vec<Transition>,

    pub outcome: TickOutcome,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Keep ticking
    Continue,

    /// The fault has been acknowledged, the process must now exit
    Terminate,
}

/// Result of handling the current state once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutput {
    Transition(Transition),

    /// The start latch was cancelled while awaiting start, no transition was made
    Cancelled,

    Terminate,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<G, P, A> MissionController<G, P, A>
where
    G: Gateway,
    P: MissionPlanner,
    A: FaultAck,
{
    /// Create a controller in `AwaitingStart`.
    ///
    /// Button presses must be fed into `start_latch` for the controller to leave `AwaitingStart`.
    pub fn new(
        gateway: G,
        planner: P,
        fault_ack: A,
        lines: IndicatorLines,
        start_latch: Arc<StartLatch>,
    ) -> Self {
        start_latch.arm();

        Self {
            state: ControllerState::AwaitingStart,
            mission: None,
            target: Target::default(),
            gateway,
            planner,
            fault_ack,
            fault_acknowledged: false,
            lines,
            start_latch,
            active_indicator: None,
            max_transitions_per_tick: ControllerState::ALL.len(),
        }
    }

    /// Set the limit on transitions made in one tick, at least one.
    pub fn with_max_transitions_per_tick(mut self, max: usize) -> Self {
        self.max_transitions_per_tick = max.max(1);
        self
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn mission(&self) -> Option<&Mission> {
        self.mission.as_ref()
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Handle the current state, cascading through following states where possible.
    ///
    /// Blocks while awaiting the start signal, during every service call, and while waiting for
    /// a fault to be acknowledged.
    pub fn tick(&mut self) -> TickReport {
        let mut transitions = Vec::new();

        while transitions.len() < self.max_transitions_per_tick {
            match self.step() {
                StepOutput::Terminate => {
                    return TickReport {
                        transitions,
                        outcome: TickOutcome::Terminate,
                    }
                }
                StepOutput::Cancelled => {
                    return TickReport {
                        transitions,
                        outcome: TickOutcome::Continue,
                    }
                }
                StepOutput::Transition(t) => {
                    transitions.push(t);

                    if !t.cascades() {
                        break;
                    }
                }
            }
        }

        if transitions.len() >= self.max_transitions_per_tick {
            debug!(
                "Tick ended after the limit of {} transitions in {}",
                self.max_transitions_per_tick, self.state
            );
        }

        TickReport {
            transitions,
            outcome: TickOutcome::Continue,
        }
    }

    /// Handle the current state once, making exactly one transition unless `Faulted`.
    pub fn step(&mut self) -> StepOutput {
        let next = match self.state {
            ControllerState::AwaitingStart => match self.await_start() {
                Some(next) => next,
                None => return StepOutput::Cancelled,
            },
            ControllerState::LoadingMission => self.load_mission(),
            ControllerState::CheckingMission => self.check_mission(),
            ControllerState::MovingRobot => self.move_robot(),
            ControllerState::DetectingTarget => self.detect_target(),
            ControllerState::MovingEffector => self.move_effector(),
            ControllerState::UpdatingTargetState => self.update_target_state(),
            ControllerState::Faulted => {
                self.handle_fault();
                return StepOutput::Terminate;
            }
        };

        StepOutput::Transition(self.transition_to(next))
    }

    // ---- STATE HANDLERS ----

    fn await_start(&mut self) -> Option<ControllerState> {
        let indicator = self.start_indicator(IndicatorMode::Waiting);

        info!("Awaiting start signal");
        let pressed = self.start_latch.wait();

        if let Some(indicator) = indicator {
            indicator.stop();
            indicator.join();
        }

        if pressed {
            Some(ControllerState::LoadingMission)
        } else {
            info!("Stopped awaiting start");
            None
        }
    }

    fn load_mission(&mut self) -> ControllerState {
        match ok_or_log(self.gateway.load_mission()) {
            Some(mission) if mission.is_empty() => {
                warn!("Loaded mission is empty");
                self.mission = Some(mission);
                ControllerState::AwaitingStart
            }
            Some(mission) => {
                info!("Mission loaded");
                session::save_with_timestamp("missions/mission.json", mission.clone());
                self.mission = Some(mission);
                ControllerState::CheckingMission
            }
            None => ControllerState::AwaitingStart,
        }
    }

    fn check_mission(&mut self) -> ControllerState {
        // The previous active indicator ended as soon as it asserted the status line
        if let Some(prev) = self.active_indicator.take() {
            prev.join();
        }
        self.active_indicator = self.start_indicator(IndicatorMode::Active);

        let mission = match self.mission {
            Some(ref m) => m,
            None => {
                warn!("No mission loaded, awaiting start");
                return ControllerState::AwaitingStart;
            }
        };

        if self.planner.mission_complete(mission) {
            info!("Mission complete");
            return ControllerState::AwaitingStart;
        }

        self.target = Target::at_location(self.planner.next_location(mission));
        debug!("Next target: {:?}", self.target);

        ControllerState::MovingRobot
    }

    fn move_robot(&mut self) -> ControllerState {
        let location = match self.target.location {
            Some(l) => l,
            None => {
                error!("Cannot move the robot, the target has no location");
                return ControllerState::Faulted;
            }
        };

        let reached = ok_or_log(self.gateway.move_robot(location.x, location.y)).unwrap_or(false);

        if reached {
            ControllerState::DetectingTarget
        } else {
            warn!("Robot did not reach ({}, {})", location.x, location.y);
            ControllerState::Faulted
        }
    }

    fn detect_target(&mut self) -> ControllerState {
        let position = match ok_or_log(self.gateway.detect_target()) {
            Some(p) => p,
            None => return ControllerState::Faulted,
        };

        self.target.position = Some(position);
        debug!("Target detected at {:?}", position);

        if self.planner.target_at_desired(&self.target) {
            ControllerState::CheckingMission
        } else {
            ControllerState::MovingEffector
        }
    }

    fn move_effector(&mut self) -> ControllerState {
        let position = match self.target.position {
            Some(p) => p,
            None => {
                error!("Cannot move the end effector, the target has no position");
                return ControllerState::Faulted;
            }
        };

        let moved = ok_or_log(
            self.gateway
                .move_end_effector(position.x, position.y, position.z),
        )
        .unwrap_or(false);

        if moved {
            ControllerState::UpdatingTargetState
        } else {
            warn!(
                "End effector did not move to ({}, {}, {})",
                position.x, position.y, position.z
            );
            ControllerState::Faulted
        }
    }

    fn update_target_state(&mut self) -> ControllerState {
        if self.planner.set_target_to_desired(&mut self.target) {
            ControllerState::CheckingMission
        } else {
            error!("Could not set the target to its desired state");
            ControllerState::Faulted
        }
    }

    fn handle_fault(&mut self) {
        if self.fault_acknowledged {
            return;
        }

        error!("SPARO is in a FAULTED state, last target: {:?}", self.target);
        self.fault_ack.wait_for_ack();
        self.fault_acknowledged = true;

        info!("Fault acknowledged");
    }

    // ---- HELPERS ----

    fn transition_to(&mut self, next: ControllerState) -> Transition {
        let transition = Transition {
            from: self.state,
            to: next,
        };

        if transition.from == ControllerState::AwaitingStart {
            self.start_latch.disarm();
        }
        if transition.to == ControllerState::AwaitingStart {
            self.start_latch.arm();
        }
        if transition.to == ControllerState::Faulted {
            self.mission = None;
        }

        self.state = next;

        info!("State change: {} -> {}", transition.from, transition.to);

        transition
    }

    fn start_indicator(&self, mode: IndicatorMode) -> Option<IndicatorHandle> {
        match IndicatorHandle::start(mode, &self.lines) {
            Ok(h) => Some(h),
            Err(e) => {
                warn!("Could not start the {:?} indicator: {}", mode, e);
                None
            }
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Unwrap the result of a service call, logging the reason it failed.
fn ok_or_log<T>(result: Result<T, GatewayError>) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            error!("Service call failed: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        mission::{Location, Position},
        planner::DefaultPlanner,
    };
    use serde_json::json;
    use std::{
        collections::VecDeque,
        sync::atomic::{AtomicUsize, Ordering},
        thread,
        time::Duration,
    };
    use ControllerState::*;

    /// Gateway answering each call from a script, panicking on any call that isn't scripted.
    #[derive(Default)]
    struct ScriptedGateway {
        missions: VecDeque<Result<Mission, GatewayError>>,
        robot_moves: VecDeque<Result<bool, GatewayError>>,
        detections: VecDeque<Result<Position, GatewayError>>,
        effector_moves: VecDeque<Result<bool, GatewayError>>,

        calls: Vec<&'static str>,
        robot_demands: Vec<(f64, f64)>,
        effector_demands: Vec<(f64, f64, f64)>,
    }

    impl Gateway for ScriptedGateway {
        fn load_mission(&mut self) -> Result<Mission, GatewayError> {
            self.calls.push("load_mission");
            self.missions.pop_front().expect("unscripted load_mission call")
        }

        fn move_robot(&mut self, x: f64, y: f64) -> Result<bool, GatewayError> {
            self.calls.push("move_robot");
            self.robot_demands.push((x, y));
            self.robot_moves.pop_front().expect("unscripted move_robot call")
        }

        fn detect_target(&mut self) -> Result<Position, GatewayError> {
            self.calls.push("detect_target");
            self.detections.pop_front().expect("unscripted detect_target call")
        }

        fn move_end_effector(&mut self, x: f64, y: f64, z: f64) -> Result<bool, GatewayError> {
            self.calls.push("move_endeffector");
            self.effector_demands.push((x, y, z));
            self.effector_moves
                .pop_front()
                .expect("unscripted move_endeffector call")
        }
    }

    #[derive(Default, Clone)]
    struct CountingAck(Arc<AtomicUsize>);

    impl FaultAck for CountingAck {
        fn wait_for_ack(&mut self) {
            self.0.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Planner with fixed answers.
    struct FixedPlanner {
        complete: bool,
        at_desired: bool,
        set_desired: bool,
    }

    impl MissionPlanner for FixedPlanner {
        fn mission_complete(&mut self, _mission: &Mission) -> bool {
            self.complete
        }

        fn next_location(&mut self, _mission: &Mission) -> Location {
            Location { x: 4.0, y: -1.5 }
        }

        fn target_at_desired(&mut self, _target: &Target) -> bool {
            self.at_desired
        }

        fn set_target_to_desired(&mut self, _target: &mut Target) -> bool {
            self.set_desired
        }
    }

    type TestController<P> = MissionController<ScriptedGateway, P, CountingAck>;

    fn controller_with<P: MissionPlanner>(
        gateway: ScriptedGateway,
        planner: P,
    ) -> (TestController<P>, Arc<StartLatch>, Arc<AtomicUsize>) {
        let latch = Arc::new(StartLatch::new());
        let ack = CountingAck::default();
        let acks = ack.0.clone();
        let controller = MissionController::new(
            gateway,
            planner,
            ack,
            IndicatorLines::simulated(),
            latch.clone(),
        );
        (controller, latch, acks)
    }

    fn new_controller(
        gateway: ScriptedGateway,
    ) -> (TestController<DefaultPlanner>, Arc<StartLatch>, Arc<AtomicUsize>) {
        controller_with(gateway, DefaultPlanner)
    }

    fn tasks_mission() -> Mission {
        Mission::new(json!({"tasks": [{"id": 1}, {"id": 2}]}))
    }

    fn transport_failure(service: &'static str) -> GatewayError {
        GatewayError::Timeout(service, Duration::from_millis(10))
    }

    fn transitions(pairs: &[(ControllerState, ControllerState)]) -> Vec<Transition> {
        pairs
            .iter()
            .map(|&(from, to)| Transition { from, to })
            .collect()
    }

    #[test]
    fn test_initial_state() {
        let (controller, latch, _) = new_controller(ScriptedGateway::default());

        assert_eq!(controller.state(), AwaitingStart);
        assert!(controller.mission().is_none());
        assert_eq!(*controller.target(), Target::default());
        assert!(latch.is_armed());
    }

    #[test]
    fn test_full_cycle() {
        let gateway = ScriptedGateway {
            missions: vec![Ok(tasks_mission())].into(),
            robot_moves: vec![Ok(true)].into(),
            detections: vec![Ok(Position { x: 1.0, y: 2.0, z: 3.0 })].into(),
            effector_moves: vec![Ok(true)].into(),
            ..Default::default()
        };
        let (mut controller, latch, acks) = new_controller(gateway);

        assert!(latch.press());
        let report = controller.tick();

        assert_eq!(report.outcome, TickOutcome::Continue);
        assert_eq!(
            report.transitions,
            transitions(&[
                (AwaitingStart, LoadingMission),
                (LoadingMission, CheckingMission),
                (CheckingMission, MovingRobot),
                (MovingRobot, DetectingTarget),
                (DetectingTarget, MovingEffector),
                (MovingEffector, UpdatingTargetState),
                (UpdatingTargetState, CheckingMission),
            ])
        );
        assert_eq!(controller.state(), CheckingMission);
        assert_eq!(controller.mission(), Some(&tasks_mission()));
        assert_eq!(
            *controller.target(),
            Target {
                location: Some(Location { x: 0.0, y: 0.0 }),
                position: Some(Position { x: 1.0, y: 2.0, z: 3.0 }),
            }
        );

        let gateway = &controller.gateway;
        assert_eq!(
            gateway.calls,
            vec!["load_mission", "move_robot", "detect_target", "move_endeffector"]
        );
        assert_eq!(gateway.robot_demands, vec![(0.0, 0.0)]);
        assert_eq!(gateway.effector_demands, vec![(1.0, 2.0, 3.0)]);

        assert!(!latch.is_armed());
        assert_eq!(acks.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_next_cycle_replans_target() {
        let gateway = ScriptedGateway {
            robot_moves: vec![Ok(true)].into(),
            ..Default::default()
        };
        let (mut controller, _, _) = new_controller(gateway);
        controller.state = CheckingMission;
        controller.mission = Some(tasks_mission());
        controller.target = Target {
            location: Some(Location { x: 9.0, y: 9.0 }),
            position: Some(Position { x: 1.0, y: 2.0, z: 3.0 }),
        };

        assert_eq!(
            controller.step(),
            StepOutput::Transition(Transition { from: CheckingMission, to: MovingRobot })
        );

        // Target replaced, not merged
        assert_eq!(*controller.target(), Target::at_location(Location::default()));
    }

    #[test]
    fn test_empty_mission_returns_to_awaiting_start() {
        let gateway = ScriptedGateway {
            missions: vec![Ok(Mission::new(json!({})))].into(),
            ..Default::default()
        };
        let (mut controller, latch, acks) = new_controller(gateway);

        latch.press();
        let report = controller.tick();

        assert_eq!(
            report.transitions,
            transitions(&[(AwaitingStart, LoadingMission), (LoadingMission, AwaitingStart)])
        );
        assert_eq!(controller.state(), AwaitingStart);
        assert!(latch.is_armed());
        assert!(!latch.is_pressed());
        assert_eq!(acks.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_load_transport_failure_returns_to_awaiting_start() {
        let gateway = ScriptedGateway {
            missions: vec![Err(GatewayError::NotConnected(
                "load_mission",
                Duration::from_millis(10),
            ))]
            .into(),
            ..Default::default()
        };
        let (mut controller, latch, acks) = new_controller(gateway);

        latch.press();
        let report = controller.tick();

        assert_eq!(report.outcome, TickOutcome::Continue);
        assert_eq!(controller.state(), AwaitingStart);
        assert!(controller.mission().is_none());
        assert_eq!(report.transitions.len(), 2);
        assert_eq!(acks.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_presses_outside_awaiting_start_ignored() {
        let gateway = ScriptedGateway {
            missions: vec![Ok(Mission::new(json!([])))].into(),
            ..Default::default()
        };
        let (mut controller, latch, _) = new_controller(gateway);

        latch.press();
        controller.step();
        assert_eq!(controller.state(), LoadingMission);

        // Not awaiting start, so this press must be dropped
        assert!(!latch.press());
        assert!(!latch.is_pressed());

        controller.step();
        assert_eq!(controller.state(), AwaitingStart);
        assert!(latch.is_armed());
        assert!(!latch.is_pressed());
        assert!(controller.target().location.is_none());
    }

    #[test]
    fn test_awaiting_start_blocks_until_press() {
        let gateway = ScriptedGateway {
            missions: vec![Ok(Mission::new(json!(null)))].into(),
            ..Default::default()
        };
        let (mut controller, latch, _) = new_controller(gateway);

        let presser = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            latch.press()
        });

        assert_eq!(
            controller.step(),
            StepOutput::Transition(Transition { from: AwaitingStart, to: LoadingMission })
        );
        assert!(presser.join().unwrap());
    }

    #[test]
    fn test_cancelled_start_makes_no_transition() {
        let (mut controller, latch, _) = new_controller(ScriptedGateway::default());

        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            latch.cancel();
        });

        assert_eq!(controller.tick(), TickReport {
            transitions: Vec::new(),
            outcome: TickOutcome::Continue,
        });
        assert_eq!(controller.state(), AwaitingStart);
        assert!(controller.gateway.calls.is_empty());

        canceller.join().unwrap();
    }

    #[test]
    fn test_phase_failures_fault() {
        type Script = fn(&mut ScriptedGateway);
        let cases: [(ControllerState, Script, &str); 6] = [
            (MovingRobot, |g| g.robot_moves.push_back(Ok(false)), "move_robot"),
            (
                MovingRobot,
                |g| g.robot_moves.push_back(Err(transport_failure("move_robot"))),
                "move_robot",
            ),
            (
                DetectingTarget,
                |g| g.detections.push_back(Err(transport_failure("detect_target"))),
                "detect_target",
            ),
            (
                DetectingTarget,
                |g| {
                    g.detections.push_back(Err(GatewayError::ServiceError(
                        "detect_target",
                        "no target in view".into(),
                    )))
                },
                "detect_target",
            ),
            (MovingEffector, |g| g.effector_moves.push_back(Ok(false)), "move_endeffector"),
            (
                MovingEffector,
                |g| g.effector_moves.push_back(Err(transport_failure("move_endeffector"))),
                "move_endeffector",
            ),
        ];

        for (state, script, service) in cases.iter() {
            let mut gateway = ScriptedGateway::default();
            script(&mut gateway);
            let (mut controller, _, acks) = new_controller(gateway);
            controller.state = *state;
            controller.mission = Some(tasks_mission());
            controller.target = Target {
                location: Some(Location { x: 1.0, y: 1.0 }),
                position: Some(Position { x: 0.5, y: 0.5, z: 0.5 }),
            };

            assert_eq!(
                controller.step(),
                StepOutput::Transition(Transition { from: *state, to: Faulted })
            );
            assert_eq!(controller.gateway.calls, vec![*service]);
            assert!(controller.mission().is_none());

            // Acknowledged once, and no further calls made
            assert_eq!(controller.tick(), TickReport {
                transitions: Vec::new(),
                outcome: TickOutcome::Terminate,
            });
            assert_eq!(controller.gateway.calls.len(), 1);
            assert_eq!(acks.load(Ordering::Relaxed), 1);
        }
    }

    #[test]
    fn test_phase_successes() {
        let gateway = ScriptedGateway {
            robot_moves: vec![Ok(true)].into(),
            detections: vec![Ok(Position { x: 0.1, y: 0.2, z: 0.3 })].into(),
            effector_moves: vec![Ok(true)].into(),
            ..Default::default()
        };
        let (mut controller, _, _) = new_controller(gateway);
        controller.state = MovingRobot;
        controller.mission = Some(tasks_mission());
        controller.target = Target::at_location(Location { x: 2.0, y: 3.0 });

        let expected = [
            (MovingRobot, DetectingTarget),
            (DetectingTarget, MovingEffector),
            (MovingEffector, UpdatingTargetState),
            (UpdatingTargetState, CheckingMission),
        ];

        for (i, &(from, to)) in expected.iter().enumerate() {
            assert_eq!(controller.step(), StepOutput::Transition(Transition { from, to }));

            // One call per service phase, none for updating the target
            assert_eq!(controller.gateway.calls.len(), (i + 1).min(3));
        }
    }

    #[test]
    fn test_fault_scenario() {
        let gateway = ScriptedGateway {
            missions: vec![Ok(tasks_mission())].into(),
            robot_moves: vec![Ok(false)].into(),
            ..Default::default()
        };
        let (mut controller, latch, acks) = new_controller(gateway);

        latch.press();
        let report = controller.tick();

        assert_eq!(report.outcome, TickOutcome::Terminate);
        assert_eq!(
            report.transitions,
            transitions(&[
                (AwaitingStart, LoadingMission),
                (LoadingMission, CheckingMission),
                (CheckingMission, MovingRobot),
                (MovingRobot, Faulted),
            ])
        );
        assert_eq!(controller.state(), Faulted);
        assert!(controller.mission().is_none());
        assert_eq!(acks.load(Ordering::Relaxed), 1);

        // Subsequent ticks make no calls and don't ask for acknowledgment again
        let num_calls = controller.gateway.calls.len();
        for _ in 0..3 {
            assert_eq!(controller.tick().outcome, TickOutcome::Terminate);
        }
        assert_eq!(controller.gateway.calls.len(), num_calls);
        assert_eq!(acks.load(Ordering::Relaxed), 1);

        // Button presses have no effect once faulted
        assert!(!latch.press());
        assert_eq!(controller.state(), Faulted);
    }

    #[test]
    fn test_target_at_desired_rechecks_mission() {
        let planner = FixedPlanner {
            complete: false,
            at_desired: true,
            set_desired: true,
        };
        let gateway = ScriptedGateway {
            detections: vec![Ok(Position { x: 1.0, y: 2.0, z: 3.0 })].into(),
            ..Default::default()
        };
        let (mut controller, _, _) = controller_with(gateway, planner);
        controller.state = DetectingTarget;
        controller.mission = Some(tasks_mission());
        controller.target = Target::at_location(Location { x: 4.0, y: -1.5 });

        // Going back to the check ends the tick
        let report = controller.tick();
        assert_eq!(report.transitions, transitions(&[(DetectingTarget, CheckingMission)]));
        assert_eq!(controller.target().position, Some(Position { x: 1.0, y: 2.0, z: 3.0 }));
    }

    #[test]
    fn test_mission_complete_awaits_start() {
        let planner = FixedPlanner {
            complete: true,
            at_desired: false,
            set_desired: true,
        };
        let (mut controller, latch, _) = controller_with(ScriptedGateway::default(), planner);
        controller.state = CheckingMission;
        controller.mission = Some(tasks_mission());

        let report = controller.tick();
        assert_eq!(report.transitions, transitions(&[(CheckingMission, AwaitingStart)]));
        assert!(latch.is_armed());
        assert!(controller.gateway.calls.is_empty());
    }

    #[test]
    fn test_planner_location_is_demanded() {
        let planner = FixedPlanner {
            complete: false,
            at_desired: false,
            set_desired: false,
        };
        let gateway = ScriptedGateway {
            robot_moves: vec![Ok(true)].into(),
            detections: vec![Ok(Position { x: 1.0, y: 1.0, z: 1.0 })].into(),
            effector_moves: vec![Ok(true)].into(),
            ..Default::default()
        };
        let (mut controller, _, acks) = controller_with(gateway, planner);
        controller.state = CheckingMission;
        controller.mission = Some(tasks_mission());

        // Failing to update the target faults
        let report = controller.tick();
        assert_eq!(report.outcome, TickOutcome::Terminate);
        assert_eq!(
            report.transitions.last(),
            Some(&Transition { from: UpdatingTargetState, to: Faulted })
        );
        assert_eq!(controller.gateway.robot_demands, vec![(4.0, -1.5)]);
        assert_eq!(acks.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_missing_target_data_faults_without_calls() {
        let (mut controller, _, _) = new_controller(ScriptedGateway::default());
        controller.state = MovingRobot;
        controller.step();
        assert_eq!(controller.state(), Faulted);

        let (mut controller, _, _) = new_controller(ScriptedGateway::default());
        controller.state = MovingEffector;
        controller.target = Target::at_location(Location::default());
        controller.step();
        assert_eq!(controller.state(), Faulted);

        assert!(controller.gateway.calls.is_empty());
    }

    #[test]
    fn test_tick_transition_limit() {
        let gateway = ScriptedGateway {
            missions: vec![Ok(tasks_mission())].into(),
            ..Default::default()
        };
        let (controller, latch, _) = new_controller(gateway);
        let mut controller = controller.with_max_transitions_per_tick(2);

        latch.press();
        let report = controller.tick();

        assert_eq!(report.outcome, TickOutcome::Continue);
        assert_eq!(report.transitions.len(), 2);
        assert_eq!(controller.state(), CheckingMission);
        assert_eq!(controller.gateway.calls, vec!["load_mission"]);
    }
}
