//! # Event Input
//!
//! Receives events from the event topic on a background thread and hands them to registered
//! handlers. The operator's start button is latched in a [`StartLatch`], which the controller
//! blocks on while it awaits the start of a mission.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Condvar, Mutex, MutexGuard, PoisonError,
    },
    thread::{self, JoinHandle},
};

use comms_if::{
    event::{Event, BUTTON_PRESS_TOPIC, SHUTDOWN_TOPIC},
    net::{zmq, MonitoredSocket, MonitoredSocketError, SocketOptions},
};
use log::{debug, info, warn};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Receive timeout of the event socket, bounds how long stopping the event thread takes.
const EVENT_RECV_TIMEOUT_MS: i32 = 100;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Single-slot latch for the operator's start signal.
///
/// Presses are only accepted while the latch is armed, i.e. while the controller is awaiting a
/// start. Any number of presses while armed collapse into one signal, which
/// [`StartLatch::wait`] consumes. Once cancelled the latch never blocks again.
#[derive(Default)]
pub struct StartLatch {
    state: Mutex<LatchState>,
    pressed_cvar: Condvar,
}

#[derive(Default)]
struct LatchState {
    armed: bool,
    pressed: bool,
    cancelled: bool,
}

/// Event handlers, to be started on the event topic with [`EventInput::start`].
#[derive(Default)]
pub struct EventInput {
    button_press_handlers: Vec<Box<dyn Fn(&str) + Send>>,
    shutdown_handlers: Vec<Box<dyn Fn() + Send>>,
}

/// Handle to the running event thread. Dropping it stops the thread.
pub struct EventInputHandle {
    stop: Arc<AtomicBool>,
    join_handle: Option<JoinHandle<()>>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum EventInputError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("Could not subscribe to the {0} topic: {1}")]
    SubscribeError(&'static str, zmq::Error),

    #[error("Could not spawn the event thread: {0}")]
    SpawnError(std::io::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl StartLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start accepting presses.
    pub fn arm(&self) {
        self.lock().armed = true;
    }

    /// Stop accepting presses, discarding any unconsumed press.
    pub fn disarm(&self) {
        let mut state = self.lock();
        state.armed = false;
        state.pressed = false;
    }

    pub fn is_armed(&self) -> bool {
        self.lock().armed
    }

    /// Signal a button press, returning whether it was accepted.
    pub fn press(&self) -> bool {
        let mut state = self.lock();

        if state.armed {
            state.pressed = true;
            self.pressed_cvar.notify_all();
            true
        } else {
            false
        }
    }

    /// True if a press is waiting to be consumed.
    pub fn is_pressed(&self) -> bool {
        self.lock().pressed
    }

    /// Block until a press has been received, then consume it.
    ///
    /// Returns false without consuming anything if the latch has been cancelled.
    pub fn wait(&self) -> bool {
        let mut state = self.lock();

        while !state.pressed && !state.cancelled {
            state = self
                .pressed_cvar
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }

        if state.cancelled {
            return false;
        }

        state.pressed = false;
        true
    }

    /// Release any current or future waiter without a press.
    pub fn cancel(&self) {
        self.lock().cancelled = true;
        self.pressed_cvar.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        self.lock().cancelled
    }

    fn lock(&self) -> MutexGuard<'_, LatchState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EventInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler called with the payload of every button press.
    pub fn on_button_press<F: Fn(&str) + Send + 'static>(&mut self, handler: F) {
        self.button_press_handlers.push(Box::new(handler));
    }

    /// Register a handler called when a shutdown is requested.
    pub fn on_shutdown<F: Fn() + Send + 'static>(&mut self, handler: F) {
        self.shutdown_handlers.push(Box::new(handler));
    }

    /// Register a handler which feeds button presses into the given latch.
    pub fn latch_button_presses(&mut self, latch: Arc<StartLatch>) {
        self.on_button_press(move |payload| {
            if latch.press() {
                info!("Received button press '{}'", payload);
            } else {
                debug!("Ignoring button press '{}', not awaiting start", payload);
            }
        });
    }

    /// Pass a received message to the handlers of its topic, returning the parsed event.
    pub fn dispatch(&self, msg: &str) -> Option<Event> {
        let event = Event::parse(msg);

        match event {
            Some(Event::ButtonPress(ref payload)) => {
                self.button_press_handlers.iter().for_each(|h| h(payload))
            }
            Some(Event::Shutdown) => self.shutdown_handlers.iter().for_each(|h| h()),
            None => warn!("Unrecognised event message: {:?}", msg),
        }

        event
    }

    /// Subscribe to the event topic at `endpoint` and start dispatching events in a background
    /// thread.
    pub fn start(
        self,
        ctx: &zmq::Context,
        endpoint: &str,
    ) -> Result<EventInputHandle, EventInputError> {
        let socket_options = SocketOptions {
            block_on_first_connect: false,
            recv_timeout: EVENT_RECV_TIMEOUT_MS,
            linger: 1,
            ..Default::default()
        };

        let socket = MonitoredSocket::new(ctx, zmq::SUB, socket_options, endpoint)
            .map_err(EventInputError::SocketError)?;

        for &topic in &[BUTTON_PRESS_TOPIC, SHUTDOWN_TOPIC] {
            socket
                .set_subscribe(topic.as_bytes())
                .map_err(|e| EventInputError::SubscribeError(topic, e))?;
        }

        let stop = Arc::new(AtomicBool::new(false));
        let stop_clone = stop.clone();
        let join_handle = thread::Builder::new()
            .name("event_input".into())
            .spawn(move || event_thread(self, socket, stop_clone))
            .map_err(EventInputError::SpawnError)?;

        Ok(EventInputHandle {
            stop,
            join_handle: Some(join_handle),
        })
    }
}

impl EventInputHandle {
    /// Stop the event thread and wait for it to exit.
    pub fn stop(mut self) {
        self.stop_inner();
    }

    fn stop_inner(&mut self) {
        self.stop.store(true, Ordering::Relaxed);

        if let Some(handle) = self.join_handle.take() {
            handle.join().ok();
        }
    }
}

impl Drop for EventInputHandle {
    fn drop(&mut self) {
        self.stop_inner();
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn event_thread(input: EventInput, socket: MonitoredSocket, stop: Arc<AtomicBool>) {
    while !stop.load(Ordering::Relaxed) {
        match socket.recv_string(0) {
            Ok(Ok(msg)) => {
                input.dispatch(&msg);
            }
            Ok(Err(_)) => warn!("Received an event which was not valid UTF-8"),
            Err(zmq::Error::EAGAIN) => (),
            Err(zmq::Error::ETERM) => break,
            Err(e) => warn!("Could not receive event: {}", e),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[test]
    fn test_latch_ignores_presses_when_disarmed() {
        let latch = StartLatch::new();

        assert!(!latch.press());
        assert!(!latch.is_pressed());

        latch.arm();
        assert!(latch.press());
        assert!(latch.is_pressed());

        // Disarming discards the unconsumed press
        latch.disarm();
        assert!(!latch.is_pressed());
        assert!(!latch.press());
    }

    #[test]
    fn test_latch_presses_collapse() {
        let latch = StartLatch::new();
        latch.arm();

        assert!(latch.press());
        assert!(latch.press());

        assert!(latch.wait());
        assert!(!latch.is_pressed());
    }

    #[test]
    fn test_latch_wait_wakes_on_press() {
        let latch = Arc::new(StartLatch::new());
        latch.arm();

        let latch_clone = latch.clone();
        let presser = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            latch_clone.press()
        });

        assert!(latch.wait());
        assert!(presser.join().unwrap());
        assert!(!latch.is_pressed());
    }

    #[test]
    fn test_latch_cancel_releases_waiter() {
        let latch = Arc::new(StartLatch::new());
        latch.arm();

        let latch_clone = latch.clone();
        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            latch_clone.cancel();
        });

        assert!(!latch.wait());
        canceller.join().unwrap();
        assert!(latch.is_cancelled());

        // Stays released
        assert!(!latch.wait());
    }

    #[test]
    fn test_dispatch() {
        let presses = Arc::new(Mutex::new(Vec::new()));
        let shutdowns = Arc::new(AtomicUsize::new(0));

        let mut input = EventInput::new();
        let presses_clone = presses.clone();
        input.on_button_press(move |p| presses_clone.lock().unwrap().push(p.to_string()));
        let shutdowns_clone = shutdowns.clone();
        input.on_shutdown(move || {
            shutdowns_clone.fetch_add(1, Ordering::Relaxed);
        });

        assert_eq!(input.dispatch("button_press"), Some(Event::ButtonPress(String::new())));
        assert_eq!(input.dispatch("button_press 7"), Some(Event::ButtonPress("7".into())));
        assert_eq!(input.dispatch("shutdown"), Some(Event::Shutdown));
        assert_eq!(input.dispatch("telemetry 1"), None);

        assert_eq!(*presses.lock().unwrap(), vec![String::new(), "7".to_string()]);
        assert_eq!(shutdowns.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_latched_button_presses() {
        let latch = Arc::new(StartLatch::new());
        let mut input = EventInput::new();
        input.latch_button_presses(latch.clone());

        input.dispatch("button_press");
        assert!(!latch.is_pressed());

        latch.arm();
        input.dispatch("button_press");
        assert!(latch.is_pressed());
    }
}
