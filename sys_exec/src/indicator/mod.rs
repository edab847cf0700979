//! # Status Indicator
//!
//! Background task driving the status line in a pattern chosen by the operating phase:
//!
//! - `Waiting` - blinks the status line (500 ms on, 250 ms off) until stopped, shown while the
//!   system waits for the operator to start a mission.
//! - `Active` - asserts the status line once and ends, leaving it asserted.
//!
//! Both lines are driven low whenever a new indicator task starts. The error line is otherwise
//! unused.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod lines;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::debug;
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{channel, Receiver, RecvTimeoutError, Sender},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

pub use lines::{IndicatorLines, OutputLine, SimLine};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// One cycle of the waiting pattern as (status level, hold time) steps.
pub const WAITING_PATTERN: [(bool, Duration); 2] = [
    (true, Duration::from_millis(500)),
    (false, Duration::from_millis(250)),
];

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Handle to a running indicator task.
///
/// Dropping the handle stops and joins the task.
pub struct IndicatorHandle {
    mode: IndicatorMode,

    stop_sender: Sender<()>,

    finished: Arc<AtomicBool>,

    join_handle: Option<JoinHandle<()>>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Patterns the indicator can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorMode {
    Waiting,
    Active,
}

#[derive(Debug, thiserror::Error)]
pub enum IndicatorError {
    #[error("Could not spawn the indicator thread: {0}")]
    SpawnError(std::io::Error),

    #[error("Could not acquire the GPIO output lines: {0}")]
    Gpio(String),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl IndicatorHandle {
    /// Start a new indicator task in the given mode.
    pub fn start(mode: IndicatorMode, lines: &IndicatorLines) -> Result<Self, IndicatorError> {
        let (stop_sender, stop_receiver) = channel();
        let finished = Arc::new(AtomicBool::new(false));

        let lines = lines.clone();
        let finished_clone = finished.clone();
        let join_handle = thread::Builder::new()
            .name(format!("indicator_{:?}", mode).to_lowercase())
            .spawn(move || {
                indicator_thread(mode, lines, stop_receiver);
                finished_clone.store(true, Ordering::Release);
            })
            .map_err(IndicatorError::SpawnError)?;

        debug!("{:?} indicator started", mode);

        Ok(Self {
            mode,
            stop_sender,
            finished,
            join_handle: Some(join_handle),
        })
    }

    pub fn mode(&self) -> IndicatorMode {
        self.mode
    }

    /// Request the task stops. Returns immediately, use [`IndicatorHandle::join`] to wait for it.
    pub fn stop(&self) {
        // The task may already have ended, in which case there's nobody to tell
        self.stop_sender.send(()).ok();
    }

    /// True once the task has exited.
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    /// Block until the task has exited.
    ///
    /// A `Waiting` task only exits once [`IndicatorHandle::stop`] has been called.
    pub fn join(mut self) {
        self.join_inner();
    }

    fn join_inner(&mut self) {
        if let Some(handle) = self.join_handle.take() {
            handle.join().ok();
            debug!("{:?} indicator stopped", self.mode);
        }
    }
}

impl Drop for IndicatorHandle {
    fn drop(&mut self) {
        self.stop();
        self.join_inner();
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn indicator_thread(mode: IndicatorMode, lines: IndicatorLines, stop: Receiver<()>) {
    lines.set_status(false);
    lines.set_error(false);

    match mode {
        IndicatorMode::Active => lines.set_status(true),
        IndicatorMode::Waiting => {
            'cycle: loop {
                for &(level, hold) in WAITING_PATTERN.iter() {
                    lines.set_status(level);

                    // Waiting on the stop channel rather than sleeping lets a stop cut a hold
                    // short. A disconnected channel means the handle is gone, so stop then too.
                    match stop.recv_timeout(hold) {
                        Err(RecvTimeoutError::Timeout) => (),
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break 'cycle,
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::Mutex;
    use std::time::Instant;

    /// Line which records every level it is set to along with the time it was set.
    struct RecordingLine(Arc<Mutex<Vec<(Instant, bool)>>>);

    impl OutputLine for RecordingLine {
        fn set(&mut self, high: bool) {
            self.0.lock().unwrap().push((Instant::now(), high));
        }
    }

    fn recording_lines() -> (IndicatorLines, Arc<Mutex<Vec<(Instant, bool)>>>) {
        let record = Arc::new(Mutex::new(Vec::new()));
        let lines = IndicatorLines::new(RecordingLine(record.clone()), SimLine::new("error"));
        (lines, record)
    }

    #[test]
    fn test_waiting_duty_cycle() {
        let (lines, record) = recording_lines();

        let handle = IndicatorHandle::start(IndicatorMode::Waiting, &lines).unwrap();
        thread::sleep(Duration::from_millis(1600));
        handle.stop();
        handle.join();

        let record = record.lock().unwrap();

        // Initial low, then high/low alternating
        assert!(!record[0].1);
        let steps = &record[1..];
        assert!(steps.len() >= 4, "only {} steps recorded", steps.len());

        for pair in steps.windows(2).take(3) {
            let (t0, level) = pair[0];
            let (t1, next_level) = pair[1];
            assert_ne!(level, next_level);

            let held_ms = (t1 - t0).as_millis() as i64;
            let expected_ms = if level { 500 } else { 250 };
            assert!(
                (held_ms - expected_ms).abs() <= 50,
                "held {} for {} ms, expected {} ms",
                level,
                held_ms,
                expected_ms
            );
        }
    }

    #[test]
    fn test_waiting_stop_is_final() {
        let (lines, record) = recording_lines();

        let handle = IndicatorHandle::start(IndicatorMode::Waiting, &lines).unwrap();
        thread::sleep(Duration::from_millis(100));

        // Stop mid-hold, join must not wait for the rest of the 500 ms
        let stop_time = Instant::now();
        handle.stop();
        handle.join();
        assert!(stop_time.elapsed() < Duration::from_millis(400));

        let num_changes = record.lock().unwrap().len();
        thread::sleep(Duration::from_millis(800));
        assert_eq!(record.lock().unwrap().len(), num_changes);
    }

    #[test]
    fn test_active_asserts_and_ends() {
        let status = SimLine::new("status");
        let status_probe = status.probe();
        let error = SimLine::new("error");
        let error_probe = error.probe();
        let lines = IndicatorLines::new(status, error);

        let handle = IndicatorHandle::start(IndicatorMode::Active, &lines).unwrap();

        // Ends on its own, without a stop
        let start = Instant::now();
        while !handle.is_finished() {
            assert!(start.elapsed() < Duration::from_secs(1), "active indicator did not end");
            thread::sleep(Duration::from_millis(1));
        }
        handle.join();

        assert!(status_probe.load(Ordering::Relaxed));
        assert!(!error_probe.load(Ordering::Relaxed));
    }

    #[test]
    fn test_drop_stops_task() {
        let (lines, record) = recording_lines();

        let handle = IndicatorHandle::start(IndicatorMode::Waiting, &lines).unwrap();
        assert_eq!(handle.mode(), IndicatorMode::Waiting);
        thread::sleep(Duration::from_millis(50));
        drop(handle);

        let num_changes = record.lock().unwrap().len();
        thread::sleep(Duration::from_millis(600));
        assert_eq!(record.lock().unwrap().len(), num_changes);
    }
}
