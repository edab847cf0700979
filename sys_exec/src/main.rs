//! # System Executable
//!
//! Runs the mission controller of the SPARO platform:
//! - Subscribes to operator button presses and shutdown requests on the event topic
//! - Drives the status and error lines while awaiting start and during operations
//! - Steps the mission through its phases using the remote services

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Result};
use log::{info, warn};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use structopt::StructOpt;

// Internal
use comms_if::net::zmq;
use sys_lib::{
    controller::{MissionController, TickOutcome},
    event_input::{EventInput, StartLatch},
    fault_ack::StdinAck,
    gateway::ZmqGateway,
    indicator::IndicatorLines,
    params::SysExecParams,
    planner::DefaultPlanner,
};
use util::{
    host,
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "sys_exec", about = "SPARO mission execution controller")]
struct Opts {
    /// Parameter file to load, relative to `$SPARO_SW_ROOT/params`
    #[structopt(long, default_value = "sys_exec.toml")]
    params: String,

    /// Use simulated output lines even if GPIO is available
    #[structopt(long)]
    sim_outputs: bool,

    /// Minimum log level, `info` or more verbose
    #[structopt(long, default_value = "trace")]
    log_level: LevelFilter,
}

// ------------------------------------------------------------------------------------------------
// MAIN
// ------------------------------------------------------------------------------------------------

fn main() -> Result<()> {
    color_eyre::install()?;

    let opts = Opts::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("sys_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(opts.log_level, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("SPARO System Executable\n");
    info!(
        "Running on: {:#?}",
        host::get_uname().wrap_err("Failed to get host information")?
    );
    info!("Session directory: {:?}\n", session.session_root);

    info!("Initialising...");

    // ---- LOAD PARAMETERS ----

    let params: SysExecParams = util::params::load(&opts.params)
        .wrap_err_with(|| format!("Could not load the {} parameters", opts.params))?;

    info!("Parameters loaded");

    // ---- OUTPUT LINES ----

    let lines = init_lines(&params, opts.sim_outputs)?;

    // ---- NETWORK INITIALISATION ----

    let zmq_ctx = zmq::Context::new();

    let gateway =
        ZmqGateway::new(&zmq_ctx, &params).wrap_err("Failed to initialise the service gateway")?;

    info!("Service gateway initialised");

    let start_latch = Arc::new(StartLatch::new());
    let shutdown = Arc::new(AtomicBool::new(false));

    let mut event_input = EventInput::new();
    event_input.latch_button_presses(start_latch.clone());
    let shutdown_clone = shutdown.clone();
    let latch_clone = start_latch.clone();
    event_input.on_shutdown(move || {
        info!("Shutdown requested");
        shutdown_clone.store(true, Ordering::Relaxed);
        latch_clone.cancel();
    });

    let event_handle = event_input
        .start(&zmq_ctx, &params.net.event_endpoint)
        .wrap_err("Failed to start the event input")?;

    info!("Event input started on {}", params.net.event_endpoint);

    // ---- CONTROLLER INITIALISATION ----

    let mut controller =
        MissionController::new(gateway, DefaultPlanner, StdinAck, lines, start_latch)
            .with_max_transitions_per_tick(params.max_transitions_per_tick);

    // ---- MAIN LOOP ----

    info!("Initialisation complete, entering main loop");

    while !shutdown.load(Ordering::Relaxed) {
        let report = controller.tick();

        if report.outcome == TickOutcome::Terminate {
            info!("Terminating after fault");

            event_handle.stop();
            session.exit();
            std::process::exit(1);
        }
    }

    info!("Shutting down in {}", controller.state());

    event_handle.stop();
    session.exit();

    Ok(())
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

#[cfg(all(target_arch = "arm", target_os = "linux"))]
fn init_lines(params: &SysExecParams, sim_outputs: bool) -> Result<IndicatorLines> {
    if sim_outputs || params.indicator.simulated {
        warn!("Using simulated output lines");
        return Ok(IndicatorLines::simulated());
    }

    let lines = IndicatorLines::gpio(params.indicator.status_pin, params.indicator.error_pin)
        .wrap_err("Failed to acquire the indicator output lines")?;

    info!(
        "Indicator lines on GPIO {} (status) and {} (error)",
        params.indicator.status_pin, params.indicator.error_pin
    );

    Ok(lines)
}

#[cfg(not(all(target_arch = "arm", target_os = "linux")))]
fn init_lines(_params: &SysExecParams, sim_outputs: bool) -> Result<IndicatorLines> {
    if !sim_outputs {
        warn!("GPIO is not available on this platform, using simulated output lines");
    }

    Ok(IndicatorLines::simulated())
}
