//! # Indicator Output Lines
//!
//! The two digital outputs driven by the indicator, either real GPIO pins or simulated lines.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::trace;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, PoisonError,
};

#[cfg(all(target_arch = "arm", target_os = "linux"))]
use super::IndicatorError;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A single binary output.
pub trait OutputLine: Send {
    /// Drive the line high (`true`) or low (`false`).
    fn set(&mut self, high: bool);
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The status and error lines shared between indicator tasks.
///
/// Only one indicator task drives the lines at a time, the locks just make the sharing sound.
#[derive(Clone)]
pub struct IndicatorLines {
    status: Arc<Mutex<Box<dyn OutputLine>>>,
    error: Arc<Mutex<Box<dyn OutputLine>>>,
}

/// A simulated line, which logs level changes and exposes its level through a probe.
pub struct SimLine {
    name: &'static str,
    level: Arc<AtomicBool>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl IndicatorLines {
    pub fn new<S, E>(status: S, error: E) -> Self
    where
        S: OutputLine + 'static,
        E: OutputLine + 'static,
    {
        Self {
            status: Arc::new(Mutex::new(Box::new(status))),
            error: Arc::new(Mutex::new(Box::new(error))),
        }
    }

    /// Create a pair of simulated lines.
    pub fn simulated() -> Self {
        Self::new(SimLine::new("status"), SimLine::new("error"))
    }

    /// Acquire the status and error lines as BCM GPIO pins, both initially low.
    #[cfg(all(target_arch = "arm", target_os = "linux"))]
    pub fn gpio(status_pin: u8, error_pin: u8) -> Result<Self, IndicatorError> {
        let gpio = rppal::gpio::Gpio::new().map_err(|e| IndicatorError::Gpio(e.to_string()))?;

        let status = gpio
            .get(status_pin)
            .map_err(|e| IndicatorError::Gpio(e.to_string()))?
            .into_output_low();
        let error = gpio
            .get(error_pin)
            .map_err(|e| IndicatorError::Gpio(e.to_string()))?
            .into_output_low();

        Ok(Self::new(status, error))
    }

    pub fn set_status(&self, high: bool) {
        self.status
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .set(high);
    }

    pub fn set_error(&self, high: bool) {
        self.error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .set(high);
    }
}

impl SimLine {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            level: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get a handle which reads the current level of the line.
    pub fn probe(&self) -> Arc<AtomicBool> {
        self.level.clone()
    }
}

impl OutputLine for SimLine {
    fn set(&mut self, high: bool) {
        let prev = self.level.swap(high, Ordering::Relaxed);

        if prev != high {
            trace!("Sim {} line {}", self.name, if high { "HIGH" } else { "LOW" });
        }
    }
}

#[cfg(all(target_arch = "arm", target_os = "linux"))]
impl OutputLine for rppal::gpio::OutputPin {
    fn set(&mut self, high: bool) {
        if high {
            self.set_high()
        } else {
            self.set_low()
        }
    }
}
