//! Client/server transport for path searches.
//!
//! Searches run in a separate `pathfinder-server` process so the host's
//! loop never waits on one. The two sides talk over a Unix domain socket.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐         Unix Socket          ┌─────────────────────┐
//! │   Host loop     │  ◄──────────────────────────►│  pathfinder-server  │
//! │   (Client)      │   tagged JSON + framing      │  (serve_connection) │
//! └─────────────────┘                              └─────────────────────┘
//! ```
//!
//! # Protocol
//!
//! Messages use HTTP-style Content-Length framing (same as LSP):
//!
//! ```text
//! Content-Length: 13\r\n
//! \r\n
//! {"tag":"RUN"}
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use pathfinder::config::ClientConfig;
//! use pathfinder::ipc::Client;
//!
//! let mut client = Client::new(ClientConfig::from_env());
//! client.open()?;
//! client.pathfind(&request, |motions| println!("{:?}", motions))?;
//! loop {
//!     client.poll()?;
//! }
//! ```

mod client;
mod framing;
pub mod protocol;
mod server;

pub use client::{Callback, Client, ClientState, IpcError, PollStatus};
pub use framing::{encode_frame, read_message, write_message, FrameDecoder, MAX_MESSAGE_SIZE};
pub use server::{run, serve_connection};
