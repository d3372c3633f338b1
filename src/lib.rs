//! Pathfinder Library
//!
//! Finds the cheapest sequence of Vim normal-mode motions between two cursor
//! positions, with the search running in a background server:
//!
//! - `pathfinder` - Dijkstra search over cursor positions plus refinement
//! - `motion` - the motion catalog and keystroke model
//! - `document` - buffer text and window geometry the motions run against
//! - `ipc` - non-blocking client, server loop and wire protocol
//! - `models` - data shared by client, server and search
//! - `config`, `logging` - process setup for both binaries
//!
//! # Searching in-process
//!
//! ```ignore
//! use pathfinder::models::PathRequest;
//!
//! let motions = pathfinder::pathfinder::solve(&request)?;
//! ```

pub mod config;
pub mod document;
pub mod ipc;
pub mod logging;
pub mod models;
pub mod motion;
pub mod pathfinder;
