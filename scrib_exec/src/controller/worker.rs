//! Worker thread which owns the program while it runs, stepping it on a fixed cadence and
//! executing forwarded commands between ticks.

// -----------------------------------------------------------------------------------------------
// INCLUDES
// -----------------------------------------------------------------------------------------------

use std::{
    sync::mpsc::{Receiver, RecvTimeoutError, Sender},
    time::{Duration, Instant},
};

use comms_if::cmd::Cmd;
use log::{debug, error, warn};

use crate::program::{Program, ProgramError};

// -----------------------------------------------------------------------------------------------
// STRUCTS
// -----------------------------------------------------------------------------------------------

/// What the worker hands back when it finishes.
pub(super) struct WorkerExit {
    /// The program, stopped.
    pub program: Box<dyn Program>,

    /// The error which ended the worker, if any.
    pub error: Option<ProgramError>,
}

// -----------------------------------------------------------------------------------------------
// ENUMS
// -----------------------------------------------------------------------------------------------

pub(super) enum WorkerSignal {
    /// Stop the program and exit
    Stop,

    /// Execute a command against the program, sending the result back on the given channel
    Command(Cmd, Sender<Result<Option<String>, ProgramError>>),
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

pub(super) fn worker_thread(
    mut program: Box<dyn Program>,
    loop_period: Duration,
    status_sender: Sender<String>,
    signal_receiver: Receiver<WorkerSignal>,
) -> WorkerExit {
    let mut next_tick = Instant::now();

    loop {
        // Wait for signals from the controller until the next tick is due
        let timeout = next_tick.saturating_duration_since(Instant::now());

        match signal_receiver.recv_timeout(timeout) {
            Ok(WorkerSignal::Stop) => break,
            Ok(WorkerSignal::Command(cmd, reply_sender)) => {
                let result = program.handle_command(&cmd);

                // The controller may have given up waiting
                if reply_sender.send(result).is_err() {
                    warn!("Could not reply to forwarded command \"{}\"", cmd);
                }
                continue;
            }
            Err(RecvTimeoutError::Timeout) => (),
            Err(RecvTimeoutError::Disconnected) => {
                warn!("Controller disconnected from the worker, stopping");
                break;
            }
        }

        // Schedule the following tick, skipping any that were missed
        next_tick += loop_period;
        let now = Instant::now();
        if next_tick < now {
            next_tick = now + loop_period;
        }

        match program.step() {
            Ok(Some(status)) => {
                debug!("Status: {}", status);
                if status_sender.send(status).is_err() {
                    warn!("Status queue closed, stopping");
                    break;
                }
            }
            Ok(None) => (),
            Err(e) => {
                error!("Program step failed, stopping: {}", e);

                if let Err(stop_err) = program.stop() {
                    error!("Could not stop the program after step failure: {}", stop_err);
                }

                return WorkerExit {
                    program,
                    error: Some(e),
                };
            }
        }
    }

    let error = program.stop().err();

    WorkerExit { program, error }
}
