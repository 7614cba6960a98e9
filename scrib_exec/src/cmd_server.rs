//! # Command Server Module
//!
//! This module abstracts over the networking side of the executable. Clients send text commands
//! over a REQ socket and receive exactly one text response for each.
//!
//! Two servers are run. The command server answers every command through the controller. The
//! status server answers every request with the next status message, waiting until one is
//! available, and so runs on its own thread.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::net::{self, zmq, NetError, SocketOptions};
use log::{debug, info, warn};

use crate::controller::StatusQueue;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Time the server waits for a request before returning to the caller.
///
/// Units: milliseconds
const RECV_TIMEOUT_MS: i32 = 200;

/// Response sent when a request can't be decoded.
const INVALID_REQUEST_RESPONSE: &str = "invalid request: not UTF-8";

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// REP socket answering text requests.
pub struct CmdServer {
    socket: zmq::Socket,
    endpoint: String,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl CmdServer {
    /// Bind a new server to the endpoint.
    ///
    /// This function will not wait for a connection from a client before returning.
    pub fn new(ctx: &zmq::Context, endpoint: &str) -> Result<Self, NetError> {
        let socket_options = SocketOptions {
            recv_timeout: RECV_TIMEOUT_MS,
            send_timeout: 1000,
            ..SocketOptions::server()
        };

        let socket = net::create_socket(ctx, zmq::REP, &socket_options, endpoint)?;

        info!("Serving on {}", endpoint);

        Ok(Self {
            socket,
            endpoint: endpoint.to_string(),
        })
    }

    /// Wait for one request and answer it with `handler`.
    ///
    /// Returns `Ok(false)` if no request arrived before the timeout.
    pub fn serve_one<F>(&self, handler: F) -> Result<bool, NetError>
    where
        F: FnOnce(&str) -> String,
    {
        let response = match net::recv_text(&self.socket) {
            Ok(Some(request)) => {
                debug!("{} request: {}", self.endpoint, request.trim());
                handler(&request)
            }
            Ok(None) => return Ok(false),
            // The REP socket still owes a reply
            Err(NetError::NonUtf8Message) => {
                warn!("Non UTF-8 request on {}", self.endpoint);
                INVALID_REQUEST_RESPONSE.to_string()
            }
            Err(e) => return Err(e),
        };

        net::send_text(&self.socket, &response)?;

        Ok(true)
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Answer status requests with messages from the queue until the queue closes.
pub fn serve_status(server: CmdServer, queue: StatusQueue) {
    let mut closed = false;

    while !closed {
        let result = server.serve_one(|_| match queue.recv() {
            Some(status) => status,
            None => {
                closed = true;
                String::from("status queue closed")
            }
        });

        if let Err(e) = result {
            warn!("Status server error: {}", e);
        }
    }

    info!("Status queue closed, status server stopped");
}

#[cfg(test)]
mod test {
    use super::*;
    use std::thread;

    fn client(ctx: &zmq::Context, endpoint: &str) -> zmq::Socket {
        net::create_socket(ctx, zmq::REQ, &SocketOptions::client(2000), endpoint).unwrap()
    }

    #[test]
    fn test_serve_one() {
        let ctx = zmq::Context::new();
        let endpoint = "inproc://cmd_server_test_serve_one";
        let server = CmdServer::new(&ctx, endpoint).unwrap();
        let client = client(&ctx, endpoint);

        // Nothing sent yet
        assert!(!server.serve_one(|_| unreachable!()).unwrap());

        net::send_text(&client, "short:sync").unwrap();
        assert!(server.serve_one(|req| format!("got {}", req)).unwrap());
        assert_eq!(net::recv_text(&client).unwrap().as_deref(), Some("got short:sync"));
    }

    #[test]
    fn test_serve_status() {
        let ctx = zmq::Context::new();
        let endpoint = "inproc://cmd_server_test_status";
        let server = CmdServer::new(&ctx, endpoint).unwrap();
        let client = client(&ctx, endpoint);

        let (sender, queue) = StatusQueue::new();
        let handle = thread::spawn(move || serve_status(server, queue));

        sender.send("driving forward".into()).unwrap();
        net::send_text(&client, "long:status").unwrap();
        assert_eq!(net::recv_text(&client).unwrap().as_deref(), Some("driving forward"));

        // Closing the queue ends the server once the pending request is answered
        drop(sender);
        net::send_text(&client, "long:status").unwrap();
        assert_eq!(net::recv_text(&client).unwrap().as_deref(), Some("status queue closed"));
        handle.join().unwrap();
    }
}
