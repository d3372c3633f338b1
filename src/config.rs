//! Client and server configuration.
//!
//! The client decides where the server listens and logs, then passes those
//! choices on the server's command line. [`ClientConfig::server_args`] and
//! [`ServerConfig`] are the two halves of that contract.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;

/// Name of the server binary, looked up next to the running executable.
pub const SERVER_BINARY: &str = "pathfinder-server";

/// Default log filter for both processes.
pub const DEFAULT_LOG_FILTER: &str = "pathfinder=info,pathfinder_server=info";

/// Rendezvous socket for this process: `<temp dir>/pathfinder_<pid>.sock`.
///
/// Unique per client process, so several editors can run side by side.
pub fn default_socket_path() -> PathBuf {
    std::env::temp_dir().join(format!("pathfinder_{}.sock", std::process::id()))
}

/// Where the server logs unless told otherwise.
///
/// `~/.cache/pathfinder/server.log` on Linux, `~/Library/Caches/...` on macOS.
pub fn default_log_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join("pathfinder").join("server.log"))
}

/// Server binary installed alongside the current executable, falling back to
/// a `PATH` lookup.
fn default_server_program() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(SERVER_BINARY)))
        .filter(|candidate| candidate.exists())
        .unwrap_or_else(|| PathBuf::from(SERVER_BINARY))
}

/// How the client launches and reaches its server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Executable started by `Client::open`.
    pub server_program: PathBuf,
    /// Socket the server listens on.
    pub socket_path: PathBuf,
    /// Server log file. `None` leaves the server logging to its stderr,
    /// which the client discards.
    pub server_log: Option<PathBuf>,
    /// Filter directive forwarded to the server.
    pub log_filter: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_program: default_server_program(),
            socket_path: default_socket_path(),
            server_log: default_log_path(),
            log_filter: None,
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `PATHFINDER_SERVER`, `PATHFINDER_SERVER_LOG`
    /// and `PATHFINDER_LOG`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var_os(key))
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let mut config = Self::default();
        if let Some(program) = lookup("PATHFINDER_SERVER") {
            config.server_program = PathBuf::from(program);
        }
        if let Some(log) = lookup("PATHFINDER_SERVER_LOG") {
            config.server_log = Some(PathBuf::from(log));
        }
        if let Some(filter) = lookup("PATHFINDER_LOG") {
            config.log_filter = Some(filter.to_string_lossy().into_owned());
        }
        config
    }

    /// Command line arguments for the server process.
    pub fn server_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["--socket".into(), self.socket_path.clone().into()];
        if let Some(log) = &self.server_log {
            args.push("--log-file".into());
            args.push(log.clone().into());
        }
        if let Some(filter) = &self.log_filter {
            args.push("--log-filter".into());
            args.push(filter.into());
        }
        args
    }
}

/// Pathfinding server: answers motion searches for one client over a Unix
/// socket.
#[derive(Debug, Clone, Parser)]
#[command(name = "pathfinder-server", author, version, about, long_about = None)]
pub struct ServerConfig {
    /// Socket path to listen on
    #[arg(long, env = "PATHFINDER_SOCKET")]
    pub socket: PathBuf,

    /// Append logs to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Log filter directive (e.g. "pathfinder=debug")
    #[arg(long, env = "PATHFINDER_LOG")]
    pub log_filter: Option<String>,
}
