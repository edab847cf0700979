//! # Network Module
//!
//! Networking abstractions over ZMQ. Every service the system executable talks to is reached
//! through a [`MonitoredSocket`], which tracks whether the peer is actually connected so that
//! callers can give up on an unavailable service instead of blocking on it.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::warn;
use serde::Deserialize;
use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};
use zmq::{Context, Socket, SocketEvent, SocketType};

// Export zmq
pub use zmq;

// ------------------------------------------------------------------------------------------------
// MACROS
// ------------------------------------------------------------------------------------------------

macro_rules! set_sockopts {
    ($socket:expr, $(($opt:ident, $val:expr)),+) => {
        $(
            $socket.$opt($val)
                .map_err(|e| MonitoredSocketError::SocketOptionError(stringify!($opt).into(), e))?;
        )+
    };
}

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Receive timeout of the monitor socket, bounds how long dropping a [`MonitoredSocket`] takes.
const MONITOR_POLL_MS: i32 = 100;

/// Interval at which [`MonitoredSocket::wait_connected`] rechecks the connection flag.
const CONNECT_POLL_INTERVAL: Duration = Duration::from_millis(10);

// ------------------------------------------------------------------------------------------------
// STATICS
// ------------------------------------------------------------------------------------------------

/// Number of monitors created so far, gives each monitor a unique inproc endpoint.
static NUM_MONITORS: AtomicUsize = AtomicUsize::new(0);

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Endpoints of every service and topic used by the system executable.
#[derive(Debug, Clone, Deserialize)]
pub struct NetParams {
    /// REQ endpoint of the mission loader service
    pub load_mission_endpoint: String,

    /// REQ endpoint of the robot mover service
    pub move_robot_endpoint: String,

    /// REQ endpoint of the target detector service
    pub detect_target_endpoint: String,

    /// REQ endpoint of the end effector mover service
    pub move_endeffector_endpoint: String,

    /// SUB endpoint on which button presses and shutdown requests are published
    pub event_endpoint: String,
}

/// A zmq socket with a background monitor keeping track of its connection state.
pub struct MonitoredSocket {
    socket: Socket,

    monitor_handle: Option<thread::JoinHandle<()>>,

    shutdown: Arc<AtomicBool>,

    connected: Arc<AtomicBool>,
}

/// Options applied to a [`MonitoredSocket`] on creation.
///
/// The zmq options map onto their `zmq_setsockopt` counterparts, all times are in milliseconds.
pub struct SocketOptions {
    /// Bind to the endpoint rather than connecting to it. Default `false`.
    pub bind: bool,

    /// Block in [`MonitoredSocket::new`] until the first connection is made. Default `true`.
    pub block_on_first_connect: bool,

    /// `ZMQ_REQ_CORRELATE`
    pub req_correlate: bool,

    /// `ZMQ_REQ_RELAXED`, required if a REQ socket must survive a reply that never arrives.
    pub req_relaxed: bool,

    /// `ZMQ_LINGER`
    pub linger: i32,

    /// `ZMQ_RECONNECT_IVL`
    pub reconnect_ivl: i32,

    /// `ZMQ_CONNECT_TIMEOUT`
    pub connect_timeout: i32,

    /// `ZMQ_RCVTIMEO`, -1 blocks forever
    pub recv_timeout: i32,

    /// `ZMQ_SNDTIMEO`
    pub send_timeout: i32,

    /// `ZMQ_HEARTBEAT_IVL`
    pub heartbeat_ivl: i32,

    /// `ZMQ_HEARTBEAT_TIMEOUT`
    pub heartbeat_timeout: i32,

    /// `ZMQ_HEARTBEAT_TTL`
    pub heartbeat_ttl: i32,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum MonitoredSocketError {
    #[error("Error creating the socket: {0}")]
    CreateSocketError(zmq::Error),

    #[error("Error enabling monitoring for the socket: {0}")]
    MonitoringEnableError(zmq::Error),

    #[error("Could not connect the socket: {0:?}")]
    CouldNotConnect(Option<zmq::Error>),

    #[error("Could not read event from monitor socket: {0}")]
    EventReadError(zmq::Error),

    #[error("Could not set the {0} socket option: {1}")]
    SocketOptionError(String, zmq::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MonitoredSocket {
    /// Create a new monitored socket of the given type on `endpoint`.
    ///
    /// Servers and publishers should set `bind`, clients should leave it unset. When
    /// `block_on_first_connect` is set this call only returns once the monitor reports a
    /// connection, or fails with [`MonitoredSocketError::CouldNotConnect`].
    pub fn new(
        ctx: &Context,
        socket_type: SocketType,
        socket_options: SocketOptions,
        endpoint: &str,
    ) -> Result<Self, MonitoredSocketError> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let connected = Arc::new(AtomicBool::new(false));

        let socket = ctx
            .socket(socket_type)
            .map_err(MonitoredSocketError::CreateSocketError)?;

        // Attach a PAIR socket to the monitor endpoint, with a receive timeout so that the
        // monitor thread can notice shutdown requests
        let monitor_endpoint = format!(
            "inproc://monitor_{}",
            NUM_MONITORS.fetch_add(1, Ordering::Relaxed)
        );
        socket
            .monitor(&monitor_endpoint, SocketEvent::ALL as i32)
            .map_err(MonitoredSocketError::MonitoringEnableError)?;
        let monitor = ctx
            .socket(zmq::PAIR)
            .map_err(MonitoredSocketError::CreateSocketError)?;
        monitor
            .connect(&monitor_endpoint)
            .map_err(|e| MonitoredSocketError::CouldNotConnect(Some(e)))?;

        socket_options.set(&socket)?;

        match socket_options.bind {
            false => socket.connect(endpoint),
            true => socket.bind(endpoint),
        }
        .map_err(|e| MonitoredSocketError::CouldNotConnect(Some(e)))?;

        if socket_options.block_on_first_connect {
            loop {
                match read_event(&monitor).map_err(MonitoredSocketError::EventReadError)? {
                    SocketEvent::CONNECTED => break,
                    SocketEvent::CONNECT_DELAYED => continue,
                    _ => return Err(MonitoredSocketError::CouldNotConnect(None)),
                }
            }
            connected.store(true, Ordering::Relaxed);
        }

        monitor
            .set_rcvtimeo(MONITOR_POLL_MS)
            .map_err(|e| MonitoredSocketError::SocketOptionError("set_rcvtimeo".into(), e))?;

        let shutdown_clone = shutdown.clone();
        let connected_clone = connected.clone();
        let monitor_handle = thread::spawn(move || {
            monitor_socket(monitor, monitor_endpoint, shutdown_clone, connected_clone)
        });

        Ok(Self {
            socket,
            monitor_handle: Some(monitor_handle),
            shutdown,
            connected,
        })
    }

    /// Return if the socket is connected or not.
    pub fn connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    /// Wait up to `timeout` for the socket to become connected, returning the final state.
    pub fn wait_connected(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;

        while !self.connected() {
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(CONNECT_POLL_INTERVAL);
        }

        true
    }
}

impl Drop for MonitoredSocket {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);

        if let Some(handle) = self.monitor_handle.take() {
            handle.join().ok();
        }
    }
}

impl std::ops::Deref for MonitoredSocket {
    type Target = Socket;

    fn deref(&self) -> &Self::Target {
        &self.socket
    }
}

impl std::ops::DerefMut for MonitoredSocket {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.socket
    }
}

impl SocketOptions {
    /// Set these options on the given socket.
    pub fn set(&self, socket: &Socket) -> Result<(), MonitoredSocketError> {
        set_sockopts!(
            socket,
            (set_connect_timeout, self.connect_timeout),
            (set_heartbeat_ivl, self.heartbeat_ivl),
            (set_heartbeat_timeout, self.heartbeat_timeout),
            (set_heartbeat_ttl, self.heartbeat_ttl),
            (set_linger, self.linger),
            (set_reconnect_ivl, self.reconnect_ivl),
            (set_rcvtimeo, self.recv_timeout),
            (set_sndtimeo, self.send_timeout)
        );

        // REQ-only options
        if let Ok(SocketType::REQ) = socket.get_socket_type() {
            set_sockopts!(
                socket,
                (set_req_correlate, self.req_correlate),
                (set_req_relaxed, self.req_relaxed)
            );
        }

        Ok(())
    }
}

impl Default for SocketOptions {
    fn default() -> Self {
        // zmq defaults, see http://api.zeromq.org/4-2:zmq-setsockopt
        Self {
            bind: false,
            block_on_first_connect: true,
            connect_timeout: 0,
            heartbeat_ivl: 0,
            heartbeat_timeout: 0,
            heartbeat_ttl: 0,
            linger: 30_000,
            reconnect_ivl: 100,
            recv_timeout: -1,
            req_correlate: false,
            req_relaxed: false,
            send_timeout: 0,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Read a single event from a monitor socket.
fn read_event(socket: &Socket) -> Result<SocketEvent, zmq::Error> {
    let msg = socket.recv_msg(0)?;

    // First frame starts with the 16 bit event ID
    let event = u16::from_ne_bytes([msg[0], msg[1]]);

    // Second frame is the peer address, which isn't needed
    if socket.get_rcvmore()? {
        socket.recv_msg(0)?;
    }

    Ok(SocketEvent::from_raw(event))
}

fn monitor_socket(
    monitor: Socket,
    monitor_endpoint: String,
    shutdown: Arc<AtomicBool>,
    connected: Arc<AtomicBool>,
) {
    while !shutdown.load(Ordering::Relaxed) {
        match read_event(&monitor) {
            Ok(SocketEvent::CONNECTED) => connected.store(true, Ordering::Relaxed),
            Ok(SocketEvent::DISCONNECTED) => connected.store(false, Ordering::Relaxed),
            Ok(_) => (),
            Err(zmq::Error::EAGAIN) => (),
            Err(e) => {
                warn!("Monitor {} stopped: {}", monitor_endpoint, e);
                break;
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_wait_connected() {
        let ctx = Context::new();

        let rep = ctx.socket(zmq::REP).unwrap();
        rep.set_linger(0).unwrap();
        rep.bind("tcp://127.0.0.1:*").unwrap();
        let endpoint = rep.get_last_endpoint().unwrap().unwrap();

        let socket_options = SocketOptions {
            block_on_first_connect: false,
            linger: 0,
            ..Default::default()
        };
        let req = MonitoredSocket::new(&ctx, zmq::REQ, socket_options, &endpoint).unwrap();

        assert!(req.wait_connected(Duration::from_secs(2)));
        assert!(req.connected());
    }

    #[test]
    fn test_wait_connected_times_out() {
        let ctx = Context::new();

        let socket_options = SocketOptions {
            block_on_first_connect: false,
            linger: 0,
            ..Default::default()
        };
        let req = MonitoredSocket::new(&ctx, zmq::REQ, socket_options, "tcp://127.0.0.1:1").unwrap();

        let start = Instant::now();
        assert!(!req.wait_connected(Duration::from_millis(100)));
        assert!(start.elapsed() >= Duration::from_millis(100));
    }
}
