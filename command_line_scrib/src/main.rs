//! # Scribbler command line
//!
//! Interactive client for the Scribbler executable. Each line typed is sent as a command and the
//! response printed. Status updates from the running program are printed as they arrive.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::thread;

use color_eyre::{eyre::WrapErr, Report};
use comms_if::{
    cmd::Cmd,
    net::{self, zmq, NetError, SocketOptions},
};
use rustyline::{error::ReadlineError, DefaultEditor};
use structopt::StructOpt;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

const PROMPT: &str = "Scribbler $ ";
const HISTORY_PATH: &str = ".scrib_history";

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// Sends commands to the Scribbler executable.
#[derive(Debug, StructOpt)]
#[structopt(name = "command_line_scrib")]
struct Args {
    /// Endpoint of the executable's command server
    #[structopt(short, long, default_value = "tcp://localhost:5020")]
    cmd_endpoint: String,

    /// Endpoint of the executable's status server
    #[structopt(short, long, default_value = "tcp://localhost:5021")]
    status_endpoint: String,

    /// Time to wait for a response to a command in milliseconds
    #[structopt(short, long, default_value = "5000")]
    timeout_ms: i32,

    /// Don't print status updates
    #[structopt(long)]
    no_status: bool,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let args = Args::from_args();

    let ctx = zmq::Context::new();

    let cmd_socket = net::create_socket(
        &ctx,
        zmq::REQ,
        &SocketOptions::client(args.timeout_ms),
        &args.cmd_endpoint,
    )
    .wrap_err("Could not connect to the command server")?;

    if !args.no_status {
        // Status requests are answered only once there's something to say, so wait forever
        let status_socket = net::create_socket(
            &ctx,
            zmq::REQ,
            &SocketOptions::client(-1),
            &args.status_endpoint,
        )
        .wrap_err("Could not connect to the status server")?;

        thread::spawn(move || print_status(status_socket));
    }

    let mut rl = DefaultEditor::new().wrap_err("Could not create the line editor")?;
    if rl.load_history(HISTORY_PATH).is_err() {
        println!("No history detected");
    }

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                let line = line.trim();
                match line {
                    "" => continue,
                    "exit" | "quit" => break,
                    _ => (),
                }

                rl.add_history_entry(line)
                    .wrap_err("Could not add the line to the history")?;

                // Parse locally so the echo shows how the command was understood
                let cmd = Cmd::parse(line);

                match send_cmd(&cmd_socket, &cmd) {
                    Ok(Some(response)) => println!("{}", response),
                    Ok(None) => println!("No response within {} ms", args.timeout_ms),
                    Err(e) => println!("Could not send \"{}\": {}", cmd, e),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e).wrap_err("Could not read the command line"),
        }
    }

    if let Err(e) = rl.save_history(HISTORY_PATH) {
        println!("Could not save history: {}", e);
    }

    println!("Exiting...");

    Ok(())
}

/// Send one command and wait for its response.
fn send_cmd(socket: &zmq::Socket, cmd: &Cmd) -> Result<Option<String>, NetError> {
    net::send_text(socket, &cmd.to_string())?;
    net::recv_text(socket)
}

/// Print status updates until the connection fails.
fn print_status(socket: zmq::Socket) {
    let status_cmd = Cmd::Status;

    loop {
        match send_cmd(&socket, &status_cmd) {
            Ok(Some(status)) => println!("[status] {}", status),
            Ok(None) => (),
            Err(e) => {
                println!("Status updates stopped: {}", e);
                break;
            }
        }
    }
}
