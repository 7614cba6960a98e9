//! Main Scribbler executable entry point.
//!
//! # Architecture
//!
//! The executable consists of:
//!
//!     - The controller, which owns the active program and steps it on a background thread
//!     - The command server, answering each command through the controller on the main thread
//!     - The status server, answering long-poll status requests on its own thread

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{info, warn};
use std::{sync::Arc, thread};

// Internal
use comms_if::net::zmq;
use scrib_lib::{
    clock::SystemClock,
    cmd_server::{self, CmdServer},
    controller::Controller,
    params::ScribExecParams,
    program::ProgramEnv,
    robot::NullRobot,
};
use util::{
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("scrib_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Trace, &session).wrap_err("Failed to initialise logging")?;

    info!("Scribbler Bot Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let params: ScribExecParams =
        util::params::load("scrib_exec.toml").wrap_err("Could not load exec params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE CONTROLLER ----

    warn!("No robot hardware backend available, driving the null robot");

    let env = ProgramEnv {
        robot: Arc::new(NullRobot::new(params.obstacle_reading)),
        clock: Arc::new(SystemClock),
    };

    let mut controller = Controller::new(params.controller_params(), env, params.default_program)
        .wrap_err("Failed to initialise the controller")?;

    info!("Controller initialised");

    // ---- INITIALISE NETWORK ----

    info!("Initialising network");

    let zmq_ctx = zmq::Context::new();

    let cmd_server = CmdServer::new(&zmq_ctx, &params.net.cmd_endpoint)
        .wrap_err("Failed to initialise the command server")?;

    let status_server = CmdServer::new(&zmq_ctx, &params.net.status_endpoint)
        .wrap_err("Failed to initialise the status server")?;

    let status_queue = controller.status_queue();
    thread::spawn(move || cmd_server::serve_status(status_server, status_queue));

    info!("Network initialisation complete");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    loop {
        if let Err(e) = cmd_server.serve_one(|cmd| controller.dispatch(cmd)) {
            warn!("Could not serve command: {}", e);
        }
    }
}
