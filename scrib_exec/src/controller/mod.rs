//! # Controller
//!
//! The controller owns the active program and is the only thing that mutates it. While the
//! program runs it lives on a worker thread which steps it on a fixed cadence. Commands which need
//! the program while it runs are sent to the worker and executed between ticks. Lifecycle
//! operations first stop the worker and join it, getting the program back, so nothing can step the
//! program while it is being reset or replaced.
//!
//! Every command gets exactly one text response from [`Controller::dispatch`]. Failures are
//! reported as the response text and never bring the controller down.
//!
//! `long:status` received here only waits while the program is running, and then for at most
//! [`ControllerParams::status_timeout`], so it can't hold up other commands. Clients wanting to
//! wait indefinitely for status use the [`StatusQueue`] directly.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod status;
mod worker;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    mem,
    sync::mpsc::{self, Sender},
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use comms_if::cmd::{Cmd, ControlCmd};
use log::{error, info, warn};

pub use status::StatusQueue;
use worker::{worker_thread, WorkerExit, WorkerSignal};

use crate::program::{registry::UnknownProgram, Program, ProgramEnv, ProgramError, ProgramId};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Interval at which a waiting `long:status` checks the worker is still running.
const STATUS_POLL_PERIOD: Duration = Duration::from_millis(20);

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct ControllerParams {
    /// Time between steps of the running program.
    pub loop_period: Duration,

    /// Longest time `long:status` waits for a message while the program runs.
    pub status_timeout: Duration,
}

pub struct Controller {
    params: ControllerParams,
    env: ProgramEnv,

    program_id: ProgramId,
    state: RunState,

    status_sender: Sender<String>,
    status_queue: StatusQueue,
}

struct Worker {
    handle: JoinHandle<WorkerExit>,
    signal_sender: Sender<WorkerSignal>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

enum RunState {
    /// The program is stopped and owned by the controller
    Stopped(Box<dyn Program>),

    /// The program is owned by the worker thread
    Running(Worker),

    /// The worker thread panicked, taking the program with it
    Lost,
}

/// Errors reported in response to a command. The display text is the response.
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("already running")]
    AlreadyRunning,

    #[error("not running")]
    NotRunning,

    #[error("nothing to reset")]
    NothingToReset,

    #[error("no status")]
    NoStatus,

    #[error(transparent)]
    UnknownProgram(#[from] UnknownProgram),

    #[error("not understood: {0}")]
    NotUnderstood(String),

    #[error(transparent)]
    Program(#[from] ProgramError),

    #[error("the program thread panicked")]
    WorkerLost,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for ControllerParams {
    fn default() -> Self {
        Self {
            loop_period: Duration::from_millis(50),
            status_timeout: Duration::from_secs(1),
        }
    }
}

impl Controller {
    /// Create a controller with a stopped instance of the given program.
    pub fn new(
        params: ControllerParams,
        env: ProgramEnv,
        program_id: ProgramId,
    ) -> Result<Self, ControllerError> {
        let program = program_id.build(env.clone())?;
        let (status_sender, status_queue) = StatusQueue::new();

        info!("Controller created with program {}", program_id);

        Ok(Self {
            params,
            env,
            program_id,
            state: RunState::Stopped(program),
            status_sender,
            status_queue,
        })
    }

    pub fn program_id(&self) -> ProgramId {
        self.program_id
    }

    /// True while the program is being stepped.
    pub fn is_running(&self) -> bool {
        match &self.state {
            RunState::Running(w) => !w.handle.is_finished(),
            _ => false,
        }
    }

    /// True if the program is stopped part way through and `start` would resume it.
    pub fn is_resumable(&self) -> bool {
        self.has_started() && !self.is_running()
    }

    /// True if the program has been started since it was created or last reset.
    fn has_started(&self) -> bool {
        match &self.state {
            RunState::Stopped(p) => p.has_started(),
            RunState::Running(_) => true,
            RunState::Lost => false,
        }
    }

    /// Get a handle to the status messages.
    pub fn status_queue(&self) -> StatusQueue {
        self.status_queue.clone()
    }

    /// Execute a text command, returning the response.
    pub fn dispatch(&mut self, text: &str) -> String {
        let cmd = Cmd::parse(text);

        match self.exec(cmd) {
            Ok(r) => r,
            Err(e) => {
                warn!("Command \"{}\" failed: {}", text.trim(), e);
                e.to_string()
            }
        }
    }

    /// Execute a parsed command.
    pub fn exec(&mut self, cmd: Cmd) -> Result<String, ControllerError> {
        self.reap();

        match cmd {
            Cmd::Sync => Ok(self.sync()),
            Cmd::Status => self.next_status(),
            Cmd::SwitchProgram(id) => self.switch_program(&id),
            Cmd::Control(ControlCmd::Start) => self.start(),
            Cmd::Control(ControlCmd::Stop) => self.stop(),
            Cmd::Control(ControlCmd::Reset) => self.reset(),
            cmd => self.forward(cmd),
        }
    }

    /// Snapshot of the controller, `<program id> <running> <resumable>`.
    pub fn sync(&self) -> String {
        format!("{} {} {}", self.program_id, self.is_running(), self.is_resumable())
    }

    /// Take the next status message.
    ///
    /// Queued messages are returned straight away. Otherwise waits while the program runs, up to
    /// the status timeout.
    pub fn next_status(&mut self) -> Result<String, ControllerError> {
        let deadline = Instant::now() + self.params.status_timeout;

        loop {
            if let Some(status) = self.status_queue.try_recv() {
                return Ok(status);
            }

            if !self.is_running() {
                return Err(ControllerError::NotRunning);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining == Duration::ZERO {
                return Err(ControllerError::NoStatus);
            }

            let wait = remaining.min(STATUS_POLL_PERIOD);
            if let Some(status) = self.status_queue.recv_timeout(wait) {
                return Ok(status);
            }
        }
    }

    /// Start or resume the program on a new worker thread.
    pub fn start(&mut self) -> Result<String, ControllerError> {
        self.reap();

        let mut program = self.take_program()?;
        let resuming = program.has_started();

        if let Err(e) = program.start() {
            self.state = RunState::Stopped(program);
            return Err(e.into());
        }

        let (signal_sender, signal_receiver) = mpsc::channel();
        let status_sender = self.status_sender.clone();
        let loop_period = self.params.loop_period;

        let handle = thread::spawn(move || {
            worker_thread(program, loop_period, status_sender, signal_receiver)
        });

        self.state = RunState::Running(Worker {
            handle,
            signal_sender,
        });

        let reply = if resuming {
            "program resumed"
        }
        else {
            "program started"
        };

        info!("Program {}: {}", self.program_id, reply);

        Ok(reply.to_string())
    }

    /// Pause the program, waiting for the worker to exit.
    pub fn stop(&mut self) -> Result<String, ControllerError> {
        self.reap();

        if !matches!(self.state, RunState::Running(_)) {
            return Err(ControllerError::NotRunning);
        }

        self.halt_worker()?;

        info!("Program {} paused", self.program_id);

        Ok(String::from("program paused"))
    }

    /// Stop the program and return it to its initial state.
    pub fn reset(&mut self) -> Result<String, ControllerError> {
        self.reap();

        if !self.has_started() {
            return Err(ControllerError::NothingToReset);
        }

        self.halt_worker()?;
        self.program_mut()?.reset()?;

        info!("Program {} reset", self.program_id);

        Ok(String::from("program reset"))
    }

    /// Stop the program and replace it with a fresh instance of another.
    ///
    /// An unknown identifier leaves the current program untouched.
    pub fn switch_program(&mut self, id: &str) -> Result<String, ControllerError> {
        let new_id: ProgramId = id.parse()?;

        self.halt_worker()?;

        let program = new_id.build(self.env.clone())?;
        self.state = RunState::Stopped(program);
        self.program_id = new_id;

        info!("Switched to program {}", new_id);

        Ok(format!("switched to {}", new_id))
    }

    /// Pass a command on to the program, wherever it is.
    fn forward(&mut self, cmd: Cmd) -> Result<String, ControllerError> {
        let worker_reply = match &self.state {
            RunState::Running(w) => {
                let (reply_sender, reply_receiver) = mpsc::channel();
                match w.signal_sender.send(WorkerSignal::Command(cmd.clone(), reply_sender)) {
                    Ok(()) => reply_receiver.recv().ok(),
                    Err(_) => None,
                }
            }
            _ => None,
        };

        let result = match worker_reply {
            Some(r) => r,
            None => {
                // The worker exited without handling the command, take the program back
                if matches!(self.state, RunState::Running(_)) {
                    if let Err(e) = self.halt_worker() {
                        warn!("Program stopped with error: {}", e);
                    }
                }
                self.program_mut()?.handle_command(&cmd)
            }
        };

        match result? {
            Some(r) => Ok(r),
            None => Err(ControllerError::NotUnderstood(cmd.to_string())),
        }
    }

    /// Take back the program from a worker which has exited by itself.
    fn reap(&mut self) {
        let finished = match &self.state {
            RunState::Running(w) => w.handle.is_finished(),
            _ => false,
        };

        if finished {
            if let Err(e) = self.halt_worker() {
                warn!("Program {} stopped with error: {}", self.program_id, e);
            }
        }
    }

    /// Stop the worker if there is one and wait for it to hand back the program.
    fn halt_worker(&mut self) -> Result<(), ControllerError> {
        let worker = match mem::replace(&mut self.state, RunState::Lost) {
            RunState::Running(w) => w,
            other => {
                self.state = other;
                return Ok(());
            }
        };

        // Fails if the worker has already exited, which is fine
        worker.signal_sender.send(WorkerSignal::Stop).ok();

        match worker.handle.join() {
            Ok(exit) => {
                self.state = RunState::Stopped(exit.program);
                match exit.error {
                    Some(e) => Err(e.into()),
                    None => Ok(()),
                }
            }
            Err(_) => {
                error!("Program {} thread panicked", self.program_id);
                Err(ControllerError::WorkerLost)
            }
        }
    }

    /// Take the stopped program out of the controller, rebuilding it if it was lost.
    fn take_program(&mut self) -> Result<Box<dyn Program>, ControllerError> {
        match mem::replace(&mut self.state, RunState::Lost) {
            RunState::Stopped(p) => Ok(p),
            RunState::Running(w) => {
                self.state = RunState::Running(w);
                Err(ControllerError::AlreadyRunning)
            }
            RunState::Lost => {
                warn!("Rebuilding lost program {}", self.program_id);
                Ok(self.program_id.build(self.env.clone())?)
            }
        }
    }

    fn program_mut(&mut self) -> Result<&mut Box<dyn Program>, ControllerError> {
        if matches!(self.state, RunState::Lost) {
            let program = self.take_program()?;
            self.state = RunState::Stopped(program);
        }

        match &mut self.state {
            RunState::Stopped(p) => Ok(p),
            _ => Err(ControllerError::AlreadyRunning),
        }
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        if let Err(e) = self.halt_worker() {
            warn!("Program stopped with error on shutdown: {}", e);
        }
    }
}
