//! # Communications interface crate.
//!
//! Provides the message definitions and networking shared between the system executable and the
//! services it talks to.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Request and reply definitions for the remote services (mission loader, robot mover, target
/// detector, end effector mover)
pub mod svc;

/// Asynchronous event topics (button presses, shutdown requests)
pub mod event;

/// Network module
pub mod net;
