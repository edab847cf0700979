//! # System library.
//!
//! The mission execution controller of the SPARO platform. The controller steps a single mission
//! through its phases, delegating the work of each phase to the remote services through the
//! [`gateway`], while the [`indicator`] shows the operator what the system is doing.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Mission controller - the state machine driving the mission phases
pub mod controller;

/// Event input - operator button presses and shutdown requests from the event topic
pub mod event_input;

/// Fault acknowledgment - how an operator acknowledges the FAULTED state
pub mod fault_ack;

/// Gateway - blocking calls to the remote services
pub mod gateway;

/// Status indicator - background task driving the status and error lines
pub mod indicator;

/// Mission and target data
pub mod mission;

/// Parameters for the system executable
pub mod params;

/// Planner - decides mission completion and the next target
pub mod planner;
