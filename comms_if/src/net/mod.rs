//! # Network Module
//!
//! This module provides networking abstractions over ZMQ. Commands travel over a REQ/REP pair:
//! the executable binds REP sockets, clients connect REQ sockets, and each side exchanges UTF-8
//! text frames.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use zmq::{Context, Socket, SocketType};

// Export zmq
pub use zmq;

// ------------------------------------------------------------------------------------------------
// MACROS
// ------------------------------------------------------------------------------------------------

macro_rules! set_sockopts {
    ($socket:expr, $(($opt:ident, $val:expr)),+) => {
        $(
            $socket.$opt($val)
                .map_err(|e| NetError::SocketOptionError(stringify!($opt).into(), e))?;
        )+
    };
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Endpoints of the executable's command interface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetParams {
    /// Endpoint on which every command is accepted, e.g. `"tcp://*:5020"`
    pub cmd_endpoint: String,

    /// Endpoint on which each request is answered with the next status message
    pub status_endpoint: String,
}

/// Represents options which can be set on a socket.
///
/// Most options here correspond to those found in the
/// [`zmq_setsockopt`](http://api.zeromq.org/4-2:zmq-setsockopt) documentation.
#[derive(Debug, Clone)]
pub struct SocketOptions {
    /// Indicates if the socket should bind itself to the endpoint. Servers should have this value
    /// set as `true`, clients should have it set as `false`.
    pub bind: bool,

    /// `ZMQ_LINGER`: Set linger period for socket shutdown
    pub linger: i32,

    /// `ZMQ_RCVTIMEO`: Maximum time before a recv operation returns with `EAGAIN`
    pub recv_timeout: i32,

    /// `ZMQ_SNDTIMEO`: Maximum time before a send operation returns with `EAGAIN`
    pub send_timeout: i32,

    /// `ZMQ_REQ_RELAXED`: relax strict alternation between request and reply
    pub req_relaxed: bool,

    /// `ZMQ_REQ_CORRELATE`: Match replies with requests
    pub req_correlate: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum NetError {
    #[error("Error creating the socket: {0}")]
    CreateSocketError(zmq::Error),

    #[error("Could not connect the socket to {0}: {1}")]
    CouldNotConnect(String, zmq::Error),

    #[error("Could not set the {0} socket option: {1}")]
    SocketOptionError(String, zmq::Error),

    #[error("Could not send a message: {0}")]
    SendError(zmq::Error),

    #[error("Could not receive a message: {0}")]
    RecvError(zmq::Error),

    #[error("Received a message which was not valid UTF-8")]
    NonUtf8Message,
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Create a socket of the given type, configure it, and bind or connect it to `endpoint`.
pub fn create_socket(
    ctx: &Context,
    socket_type: SocketType,
    socket_options: &SocketOptions,
    endpoint: &str,
) -> Result<Socket, NetError> {
    let socket = ctx.socket(socket_type).map_err(NetError::CreateSocketError)?;

    socket_options.set(&socket)?;

    match socket_options.bind {
        true => socket.bind(endpoint),
        false => socket.connect(endpoint),
    }
    .map_err(|e| NetError::CouldNotConnect(endpoint.to_string(), e))?;

    Ok(socket)
}

/// Receive one text frame.
///
/// Returns `Ok(None)` if the receive timed out.
pub fn recv_text(socket: &Socket) -> Result<Option<String>, NetError> {
    match socket.recv_string(0) {
        Ok(Ok(s)) => Ok(Some(s)),
        Ok(Err(_)) => Err(NetError::NonUtf8Message),
        Err(zmq::Error::EAGAIN) => Ok(None),
        Err(e) => Err(NetError::RecvError(e)),
    }
}

/// Send one text frame.
pub fn send_text(socket: &Socket, text: &str) -> Result<(), NetError> {
    socket.send(text, 0).map_err(NetError::SendError)
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SocketOptions {
    /// Options for a server-side socket, which binds and waits indefinitely for requests.
    pub fn server() -> Self {
        Self {
            bind: true,
            ..Default::default()
        }
    }

    /// Options for a client-side socket, which connects and gives up on replies after
    /// `recv_timeout` milliseconds (-1 to wait forever).
    pub fn client(recv_timeout: i32) -> Self {
        Self {
            bind: false,
            linger: 0,
            recv_timeout,
            req_relaxed: true,
            req_correlate: true,
            ..Default::default()
        }
    }

    /// Set these options on the given socket.
    pub fn set(&self, socket: &Socket) -> Result<(), NetError> {
        set_sockopts!(
            socket,
            (set_linger, self.linger),
            (set_rcvtimeo, self.recv_timeout),
            (set_sndtimeo, self.send_timeout)
        );

        // If the socket is a req type set the req-specific options
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
        // Defaults for sockopts taken from http://api.zeromq.org/4-2:zmq-setsockopt
        Self {
            bind: false,
            linger: 30_000,
            recv_timeout: -1,
            send_timeout: -1,
            req_correlate: false,
            req_relaxed: false,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_req_rep_roundtrip() {
        let ctx = Context::new();
        let endpoint = "inproc://comms_if_test_req_rep";

        let server = create_socket(&ctx, zmq::REP, &SocketOptions::server(), endpoint).unwrap();
        let client = create_socket(&ctx, zmq::REQ, &SocketOptions::client(1000), endpoint).unwrap();

        send_text(&client, "short:sync").unwrap();
        assert_eq!(recv_text(&server).unwrap().as_deref(), Some("short:sync"));

        send_text(&server, "avoid false false").unwrap();
        assert_eq!(recv_text(&client).unwrap().as_deref(), Some("avoid false false"));
    }

    #[test]
    fn test_recv_timeout() {
        let ctx = Context::new();
        let endpoint = "inproc://comms_if_test_timeout";

        let _server = create_socket(&ctx, zmq::REP, &SocketOptions::server(), endpoint).unwrap();
        let client = create_socket(&ctx, zmq::REQ, &SocketOptions::client(10), endpoint).unwrap();

        send_text(&client, "long:status").unwrap();
        assert_eq!(recv_text(&client).unwrap(), None);
    }
}
