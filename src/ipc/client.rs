//! Foreground client for the pathfinding server.
//!
//! `Client` launches the server process, connects to it once it is
//! listening, sends search requests and hands results to callbacks. Nothing
//! here blocks: the host calls [`Client::poll`] from its own loop and the
//! client makes whatever progress is possible at that moment.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::ClientConfig;
use crate::ipc::framing::{encode_frame, FrameDecoder};
use crate::ipc::protocol::{self, ProtocolError, Response};
use crate::models::{PathRequest, ResolvedMotion};

/// Bytes read from the socket per read call.
const READ_CHUNK: usize = 64 * 1024;

/// Receives the motions of a successful search.
pub type Callback = Box<dyn FnOnce(Vec<ResolvedMotion>)>;

/// IPC-specific error types.
#[derive(Debug, Error)]
pub enum IpcError {
    /// The server is not accepting connections yet. `poll` retries this
    /// silently.
    #[error("Server not listening yet: {0}")]
    ConnectionPending(#[source] io::Error),

    /// Failed to launch the server process.
    #[error("Failed to spawn server '{program}': {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A request was made before the connection was established.
    #[error("Not connected to the server")]
    NotConnected,

    /// The server sent a message tag the client does not understand.
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    /// Framing or encoding error.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The server closed the connection.
    #[error("Server closed the connection")]
    Disconnected,

    /// I/O error during communication.
    #[error("I/O error: {0}")]
    Io(#[source] io::Error),
}

impl From<io::Error> for IpcError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound | io::ErrorKind::ConnectionRefused => {
                IpcError::ConnectionPending(err)
            }
            _ => IpcError::Io(err),
        }
    }
}

impl From<ProtocolError> for IpcError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::UnknownTag(tag) => {
                IpcError::ProtocolViolation(format!("received an unexpected response {}", tag))
            }
            ProtocolError::Malformed(e) => IpcError::Protocol(e.to_string()),
        }
    }
}

/// Connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    /// Constructed, server not launched.
    Disconnected,
    /// Server launched, waiting for it to listen.
    Connecting,
    Connected,
    /// Shut down; the client cannot be reused.
    Closed,
}

/// What a call to [`Client::poll`] accomplished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStatus {
    /// Nothing happened this time.
    Idle,
    /// The connection was established during this poll.
    Connected,
    /// A result was handed to its callback.
    Delivered,
    /// The server reported a failure for the oldest pending request.
    ServerError(String),
}

/// Client for the pathfinding server.
///
/// # Lifecycle
///
/// - `new()` - construct, nothing is launched
/// - `open()` - spawn the server, start connecting
/// - `poll()` - connect, flush requests, deliver responses
/// - `close()` - shut the server down (also run on drop)
///
/// The server answers requests strictly in the order they were sent, so
/// callbacks are queued first-in first-out and each response belongs to the
/// oldest one.
pub struct Client {
    config: ClientConfig,
    state: ClientState,
    server: Option<Child>,
    stream: Option<UnixStream>,
    decoder: FrameDecoder,
    /// Encoded frames not yet accepted by the socket.
    outbox: Vec<u8>,
    callbacks: VecDeque<Callback>,
}

impl Client {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            state: ClientState::Disconnected,
            server: None,
            stream: None,
            decoder: FrameDecoder::new(),
            outbox: Vec::new(),
            callbacks: VecDeque::new(),
        }
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ClientState::Connected
    }

    /// Requests sent whose response has not arrived yet.
    pub fn pending(&self) -> usize {
        self.callbacks.len()
    }

    /// Whether a server process has been started and not yet reaped.
    ///
    /// After `close` the server exits on its own; later polls collect it.
    pub fn server_alive(&self) -> bool {
        self.server.is_some()
    }

    /// Launch the server. Returns immediately; `poll` completes the
    /// connection once the server is listening.
    pub fn open(&mut self) -> Result<(), IpcError> {
        if self.state != ClientState::Disconnected {
            warn!("open() called in state {:?}, ignoring", self.state);
            return Ok(());
        }

        let socket_path = &self.config.socket_path;
        // A socket left behind by an earlier run would accept nothing.
        if socket_path.exists() {
            let _ = std::fs::remove_file(socket_path);
        }

        let program = &self.config.server_program;
        info!(
            "Starting pathfinding server {} on {}",
            program.display(),
            socket_path.display()
        );
        let child = Command::new(program)
            .args(self.config.server_args())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| IpcError::Spawn {
                program: program.clone(),
                source,
            })?;

        self.server = Some(child);
        self.state = ClientState::Connecting;
        Ok(())
    }

    /// Make progress without blocking.
    ///
    /// While connecting this attempts one connection. Once connected it
    /// flushes pending requests and processes at most one response.
    ///
    /// # Errors
    ///
    /// Protocol violations and lost connections are fatal: the client closes
    /// itself and returns the error.
    pub fn poll(&mut self) -> Result<PollStatus, IpcError> {
        match self.state {
            ClientState::Connecting => self.try_connect(),
            ClientState::Connected => {
                let result = self.poll_connected();
                if let Err(e) = &result {
                    error!("Pathfinding client failed: {}", e);
                    self.close();
                }
                result
            }
            ClientState::Closed => {
                self.reap();
                Ok(PollStatus::Idle)
            }
            ClientState::Disconnected => Ok(PollStatus::Idle),
        }
    }

    /// Submit a search. `callback` runs from a later `poll` with the motions.
    ///
    /// Requests are answered one at a time in submission order.
    pub fn pathfind<F>(&mut self, request: &PathRequest, callback: F) -> Result<(), IpcError>
    where
        F: FnOnce(Vec<ResolvedMotion>) + 'static,
    {
        if self.state != ClientState::Connected {
            return Err(IpcError::NotConnected);
        }

        for message in protocol::request_messages(request) {
            let body = protocol::encode(&message)?;
            self.outbox.extend_from_slice(&encode_frame(&body));
        }
        self.callbacks.push_back(Box::new(callback));
        debug!(
            "Queued request {} -> {} ({} pending)",
            request.start.position(),
            request.target.position(),
            self.callbacks.len()
        );

        if let Err(e) = self.flush() {
            error!("Pathfinding client failed: {}", e);
            self.close();
            return Err(e);
        }
        Ok(())
    }

    /// Shut the server down without waiting for it.
    ///
    /// Closing the connection tells the server to exit on its own; a server
    /// that never got connected is terminated instead. Either way the exit
    /// is collected here if it already happened, otherwise by later polls.
    pub fn close(&mut self) {
        if self.state == ClientState::Closed {
            return;
        }

        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(std::net::Shutdown::Both);
        } else if let Some(child) = self.server.as_mut() {
            debug!("Server never connected, terminating it");
            let _ = child.kill();
        }
        self.reap();

        if !self.callbacks.is_empty() {
            warn!(
                "Closing with {} unanswered pathfinding requests",
                self.callbacks.len()
            );
            self.callbacks.clear();
        }
        let _ = std::fs::remove_file(&self.config.socket_path);
        self.state = ClientState::Closed;
    }

    /// Collect the server's exit status if it has exited.
    fn reap(&mut self) {
        let Some(child) = self.server.as_mut() else {
            return;
        };
        match child.try_wait() {
            Ok(Some(status)) => {
                debug!("Pathfinding server exited with {}", status);
                self.server = None;
            }
            Ok(None) => {}
            Err(e) => {
                warn!("Error waiting for pathfinding server: {}", e);
                self.server = None;
            }
        }
    }

    fn try_connect(&mut self) -> Result<PollStatus, IpcError> {
        match UnixStream::connect(&self.config.socket_path).map_err(IpcError::from) {
            Ok(stream) => {
                stream.set_nonblocking(true)?;
                info!("Connected to pathfinding server");
                self.stream = Some(stream);
                self.state = ClientState::Connected;
                Ok(PollStatus::Connected)
            }
            Err(IpcError::ConnectionPending(_)) => Ok(PollStatus::Idle),
            Err(e) => Err(e),
        }
    }

    fn poll_connected(&mut self) -> Result<PollStatus, IpcError> {
        self.flush()?;
        self.fill()?;

        let Some(body) = self
            .decoder
            .next_frame()
            .map_err(|e| IpcError::Protocol(e.to_string()))?
        else {
            return Ok(PollStatus::Idle);
        };
        let response = protocol::decode::<Response>(&body)?;
        self.handle_response(response)
    }

    /// Dispatch one response to the oldest pending request.
    fn handle_response(&mut self, response: Response) -> Result<PollStatus, IpcError> {
        match response {
            Response::Result(motions) => {
                let callback = self.callbacks.pop_front().ok_or_else(|| {
                    IpcError::ProtocolViolation("result received with no request pending".into())
                })?;
                debug!("Delivering {} motions", motions.len());
                callback(motions);
                Ok(PollStatus::Delivered)
            }
            Response::Error(message) => {
                // The failed request will never get a result; drop its
                // callback so the next result reaches the right one.
                self.callbacks.pop_front();
                error!("Pathfinding server error: {}", message);
                eprintln!("Pathfinding server encountered an unexpected error:\n{}", message);
                Ok(PollStatus::ServerError(message))
            }
        }
    }

    /// Write as much of the outbox as the socket accepts.
    fn flush(&mut self) -> Result<(), IpcError> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(IpcError::NotConnected);
        };
        while !self.outbox.is_empty() {
            match stream.write(&self.outbox) {
                Ok(0) => return Err(IpcError::Disconnected),
                Ok(n) => {
                    self.outbox.drain(..n);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                    return Err(IpcError::Disconnected)
                }
                Err(e) => return Err(IpcError::Io(e)),
            }
        }
        Ok(())
    }

    /// Move every byte currently readable into the decoder.
    fn fill(&mut self) -> Result<(), IpcError> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(IpcError::NotConnected);
        };
        let mut chunk = vec![0u8; READ_CHUNK];
        loop {
            match stream.read(&mut chunk) {
                Ok(0) => {
                    // Frames already buffered are still worth delivering.
                    if self.decoder.buffered() > 0 {
                        return Ok(());
                    }
                    return Err(IpcError::Disconnected);
                }
                Ok(n) => self.decoder.push(&chunk[..n]),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(IpcError::Io(e)),
            }
        }
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.close();
    }
}
