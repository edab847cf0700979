//! # Fault Acknowledgment
//!
//! The FAULTED state holds until a human acknowledges it.

use std::io::{self, BufRead, Write};

use log::warn;

/// Source of the operator's acknowledgment of a fault.
pub trait FaultAck {
    /// Block until the fault has been acknowledged.
    fn wait_for_ack(&mut self);
}

/// Acknowledgment by pressing ENTER on the controlling terminal.
#[derive(Debug, Default)]
pub struct StdinAck;

impl FaultAck for StdinAck {
    fn wait_for_ack(&mut self) {
        print!("Press ENTER to kill");
        io::stdout().flush().ok();

        let mut line = String::new();
        if let Err(e) = io::stdin().lock().read_line(&mut line) {
            warn!("Could not read acknowledgment from stdin ({}), treating as acknowledged", e);
        }
    }
}
