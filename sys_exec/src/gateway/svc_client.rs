//! # Service Clients
//!
//! zmq implementation of the [`Gateway`]. Each service has its own REQ socket. Before each call
//! the client waits a bounded time for the service to be connected, and the reply is awaited for
//! at most the configured RPC timeout, so an absent or hung service becomes a
//! [`GatewayError`] rather than blocking the controller forever.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::time::Duration;

use comms_if::{
    net::{zmq, MonitoredSocket, NetParams, SocketOptions},
    svc::{
        effector::MoveEndEffectorReq, mission::LoadMissionReq, perception::DetectTargetReq,
        robot::MoveRobotReq, SvcRep, SvcRequest,
    },
};
use log::trace;

use super::{Gateway, GatewayError};
use crate::{
    mission::{Mission, Position},
    params::SysExecParams,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Client for a single request/reply service.
pub struct SvcClient {
    socket: MonitoredSocket,

    /// Maximum time to wait for the service to be connected before a call
    wait_timeout: Duration,

    /// Maximum time to wait for a reply
    rpc_timeout: Duration,
}

/// [`Gateway`] talking to the services over zmq.
pub struct ZmqGateway {
    load_mission: SvcClient,
    move_robot: SvcClient,
    detect_target: SvcClient,
    move_endeffector: SvcClient,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SvcClient {
    /// Create a new client for the service at `endpoint`.
    ///
    /// This function will not wait for the service to connect.
    pub fn new(
        ctx: &zmq::Context,
        endpoint: &str,
        wait_timeout: Duration,
        rpc_timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let socket_options = SocketOptions {
            block_on_first_connect: false,
            connect_timeout: 1000,
            heartbeat_ivl: 500,
            heartbeat_ttl: 1000,
            heartbeat_timeout: 1000,
            linger: 1,
            recv_timeout: duration_to_sockopt(rpc_timeout),
            send_timeout: 10,
            req_correlate: true,
            req_relaxed: true,
            ..Default::default()
        };

        let socket = MonitoredSocket::new(ctx, zmq::REQ, socket_options, endpoint)
            .map_err(GatewayError::SocketError)?;

        Ok(Self {
            socket,
            wait_timeout,
            rpc_timeout,
        })
    }

    /// Send a request and wait for the service's reply.
    pub fn call<R: SvcRequest>(&mut self, request: &R) -> Result<R::Reply, GatewayError> {
        if !self.socket.wait_connected(self.wait_timeout) {
            return Err(GatewayError::NotConnected(R::SERVICE, self.wait_timeout));
        }

        let request_str =
            serde_json::to_string(request).map_err(GatewayError::SerializationError)?;

        trace!("{} request: {}", R::SERVICE, request_str);

        self.socket
            .send(&request_str, 0)
            .map_err(|e| GatewayError::SendError(R::SERVICE, e))?;

        let reply_str = match self.socket.recv_string(0) {
            Ok(Ok(s)) => s,
            Ok(Err(_)) => return Err(GatewayError::NonUtf8Reply(R::SERVICE)),
            Err(zmq::Error::EAGAIN) => {
                return Err(GatewayError::Timeout(R::SERVICE, self.rpc_timeout))
            }
            Err(e) => return Err(GatewayError::RecvError(R::SERVICE, e)),
        };

        trace!("{} reply: {}", R::SERVICE, reply_str);

        decode_reply::<R>(&reply_str)
    }
}

impl ZmqGateway {
    pub fn new(ctx: &zmq::Context, params: &SysExecParams) -> Result<Self, GatewayError> {
        let net: &NetParams = &params.net;
        let wait = Duration::from_millis(params.service_wait_timeout_ms);
        let rpc = Duration::from_millis(params.rpc_timeout_ms);

        Ok(Self {
            load_mission: SvcClient::new(ctx, &net.load_mission_endpoint, wait, rpc)?,
            move_robot: SvcClient::new(ctx, &net.move_robot_endpoint, wait, rpc)?,
            detect_target: SvcClient::new(ctx, &net.detect_target_endpoint, wait, rpc)?,
            move_endeffector: SvcClient::new(ctx, &net.move_endeffector_endpoint, wait, rpc)?,
        })
    }
}

impl Gateway for ZmqGateway {
    fn load_mission(&mut self) -> Result<Mission, GatewayError> {
        let rep = self.load_mission.call(&LoadMissionReq)?;

        Mission::from_json(&rep.json_mission).map_err(GatewayError::MissionDecodeError)
    }

    fn move_robot(&mut self, x: f64, y: f64) -> Result<bool, GatewayError> {
        self.move_robot
            .call(&MoveRobotReq { x, y })
            .map(|rep| rep.reached_position)
    }

    fn detect_target(&mut self) -> Result<Position, GatewayError> {
        self.detect_target
            .call(&DetectTargetReq)
            .map(|rep| Position {
                x: rep.x,
                y: rep.y,
                z: rep.z,
            })
    }

    fn move_end_effector(&mut self, x: f64, y: f64, z: f64) -> Result<bool, GatewayError> {
        self.move_endeffector
            .call(&MoveEndEffectorReq { x, y, z })
            .map(|rep| rep.success)
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Unwrap the reply envelope of a service reply.
fn decode_reply<R: SvcRequest>(reply_str: &str) -> Result<R::Reply, GatewayError> {
    let reply: SvcRep<R::Reply> = serde_json::from_str(reply_str)
        .map_err(|e| GatewayError::DeserializeError(R::SERVICE, e))?;

    match reply {
        SvcRep::Ok(r) => Ok(r),
        SvcRep::Error(msg) => Err(GatewayError::ServiceError(R::SERVICE, msg)),
    }
}

/// Convert a duration into a zmq millisecond socket option, saturating at `i32::MAX`.
fn duration_to_sockopt(duration: Duration) -> i32 {
    duration.as_millis().min(i32::MAX as u128) as i32
}
