//! Background server answering search requests.
//!
//! The server accepts a single client connection, collects tagged fields
//! until `RUN` and replies with one `RESULT` or `ERROR` per request, in
//! arrival order. A failed search only fails that request. Anything that
//! breaks the stream itself (bad framing, an unknown tag) is reported once
//! and ends the server.

use std::panic::{self, AssertUnwindSafe};

use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::ipc::framing::{read_message, write_message};
use crate::ipc::protocol::{self, Request, RequestAssembler, Response};
use crate::models::{PathRequest, ResolvedMotion};
use crate::pathfinder::{self, SearchResult};

/// Listen on the configured socket and serve the first client to connect.
///
/// Returns once that client disconnects. The socket file is removed on the
/// way out.
pub async fn run(config: &ServerConfig) -> Result<()> {
    let path = &config.socket;
    if path.exists() {
        std::fs::remove_file(path)
            .with_context(|| format!("Failed to remove stale socket {}", path.display()))?;
    }

    let listener = UnixListener::bind(path)
        .with_context(|| format!("Failed to bind {}", path.display()))?;
    info!("Listening on {}", path.display());

    let result = match listener.accept().await {
        Ok((stream, _)) => {
            info!("Client connected");
            serve_connection(stream).await
        }
        Err(e) => Err(e).context("Failed to accept connection"),
    };

    drop(listener);
    if let Err(e) = std::fs::remove_file(path) {
        debug!("Socket {} already gone: {}", path.display(), e);
    }
    result
}

/// Serve requests on one connection until the peer closes it.
///
/// # Errors
///
/// Returns an error after reporting it to the peer if the stream cannot be
/// decoded, or if a reply cannot be written.
pub async fn serve_connection<S>(stream: S) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    serve_with(stream, pathfinder::solve).await
}

/// Serve one connection, answering each request with `search`.
async fn serve_with<S, F>(stream: S, search: F) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
    F: Fn(&PathRequest) -> SearchResult<Vec<ResolvedMotion>>,
{
    let (read_half, mut writer) = tokio::io::split(stream);
    let mut reader = BufReader::new(read_half);
    let mut assembler = RequestAssembler::new();
    let mut served = 0usize;

    loop {
        let body = match read_message(&mut reader).await {
            Ok(Some(body)) => body,
            Ok(None) => {
                info!("Client disconnected after {} requests", served);
                return Ok(());
            }
            Err(e) => return fail(&mut writer, e).await,
        };

        let message = match protocol::decode::<Request>(&body) {
            Ok(message) => message,
            Err(e) => return fail(&mut writer, e.into()).await,
        };
        debug!("Received {:?}", tag_of(&message));

        let Some(assembled) = assembler.accept(message) else {
            continue;
        };
        let response = match assembled {
            Ok(request) => respond(&request, &search),
            Err(missing) => {
                warn!("Request {} missing {}", served, missing);
                Response::Error(format!("incomplete request: missing {}", missing))
            }
        };
        send(&mut writer, &response).await?;
        served += 1;
    }
}

/// Run one search, turning failures and panics into `ERROR`.
fn respond<F>(request: &PathRequest, search: &F) -> Response
where
    F: Fn(&PathRequest) -> SearchResult<Vec<ResolvedMotion>>,
{
    info!(
        "Searching {} -> {} over {} lines with {} motions",
        request.start.position(),
        request.target.position(),
        request.buffer.len(),
        request.motions.len()
    );

    match panic::catch_unwind(AssertUnwindSafe(|| search(request))) {
        Ok(Ok(motions)) => {
            info!("Found {}", describe(&motions));
            Response::Result(motions)
        }
        Ok(Err(e)) => {
            warn!("Search failed: {}", e);
            Response::Error(e.to_string())
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!("Search panicked: {}", message);
            Response::Error(format!("search panicked: {}", message))
        }
    }
}

async fn send<W>(writer: &mut W, response: &Response) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let body = protocol::encode(response)?;
    write_message(writer, &body).await
}

/// Report an unrecoverable error to the peer, then return it.
async fn fail<W>(writer: &mut W, err: anyhow::Error) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    error!("Unrecoverable protocol error: {:#}", err);
    if let Err(e) = send(writer, &Response::Error(format!("{:#}", err))).await {
        debug!("Could not report error to client: {:#}", e);
    }
    let _ = writer.shutdown().await;
    Err(err)
}

fn tag_of(message: &Request) -> &'static str {
    match message {
        Request::Start(_) => "START",
        Request::Target(_) => "TARGET",
        Request::Motions(_) => "MOTIONS",
        Request::Scrolloff(_) => "SCROLLOFF",
        Request::Size(..) => "SIZE",
        Request::Buffer(_) => "BUFFER",
        Request::Run => "RUN",
    }
}

fn describe(motions: &[ResolvedMotion]) -> String {
    if motions.is_empty() {
        return "empty path".to_string();
    }
    motions
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
