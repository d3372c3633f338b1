//! pathfinder - print the cheapest motions between two positions in a file.
//!
//! A small host for the library's client: it launches the server, submits
//! one search and drives `Client::poll` from a frame loop the way an editor
//! would, then prints the motions as keys to type.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;

use pathfinder::config::ClientConfig;
use pathfinder::ipc::{Client, PollStatus};
use pathfinder::logging;
use pathfinder::models::{MotionSpec, PathRequest, Position, ResolvedMotion, View};
use pathfinder::motion::default_motion_specs;

/// Poll interval of the host loop (~60fps).
const FRAME_DURATION: Duration = Duration::from_millis(16);

/// How long to keep polling for the server's exit after closing.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

/// Find the fewest keystrokes between two cursor positions
#[derive(Debug, Parser)]
#[command(name = "pathfinder", author, version, about, long_about = None)]
struct Cli {
    /// File to search in
    file: PathBuf,

    /// Start position, LINE:COL (zero-based)
    #[arg(long, value_name = "L:C")]
    from: Position,

    /// Target position, LINE:COL (zero-based)
    #[arg(long, value_name = "L:C")]
    to: Position,

    /// Comma-separated motions, each optionally KEY=WEIGHT
    #[arg(long, value_delimiter = ',', value_parser = parse_motion)]
    motions: Vec<MotionSpec>,

    /// Lines kept visible above and below the cursor
    #[arg(long, default_value_t = 0)]
    scrolloff: usize,

    /// Window width in columns
    #[arg(long, default_value_t = 80)]
    width: usize,

    /// Window height in lines (defaults to the file's length)
    #[arg(long)]
    height: Option<usize>,

    /// Give up after this many seconds
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,
}

fn parse_motion(s: &str) -> Result<MotionSpec, String> {
    match s.split_once('=') {
        Some((keys, weight)) => {
            let weight = weight
                .parse()
                .map_err(|e| format!("invalid weight for '{}': {}", keys, e))?;
            Ok(MotionSpec::new(keys, weight))
        }
        None => Ok(MotionSpec::new(s, 1)),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "pathfinder=warn".into());
    logging::init_tracing(Some(&filter), None)?;

    let text = std::fs::read_to_string(&cli.file)
        .with_context(|| format!("Failed to read {}", cli.file.display()))?;
    let buffer: Vec<String> = text.lines().map(str::to_string).collect();

    let motions = if cli.motions.is_empty() {
        default_motion_specs()
    } else {
        cli.motions
    };
    let height = cli.height.unwrap_or(buffer.len().max(1));
    let request = PathRequest {
        start: View::from(cli.from),
        target: View::from(cli.to),
        motions,
        scrolloff: cli.scrolloff,
        size: (cli.width, height),
        buffer,
    };

    let motions = run_search(&request, Duration::from_secs(cli.timeout_secs))?;
    if motions.is_empty() {
        println!("(already there)");
    } else {
        let keys: Vec<String> = motions.iter().map(ToString::to_string).collect();
        println!("{}", keys.join(" "));
    }
    Ok(())
}

/// Submit `request` once connected and poll until its result arrives.
fn run_search(request: &PathRequest, limit: Duration) -> Result<Vec<ResolvedMotion>> {
    let mut client = Client::new(ClientConfig::from_env());
    client.open()?;

    let deadline = Instant::now() + limit;
    let found: Rc<RefCell<Option<Vec<ResolvedMotion>>>> = Rc::new(RefCell::new(None));

    loop {
        match client.poll()? {
            PollStatus::Connected => {
                info!(
                    "Submitting search {} -> {}",
                    request.start.position(),
                    request.target.position()
                );
                let slot = Rc::clone(&found);
                client.pathfind(request, move |motions| {
                    *slot.borrow_mut() = Some(motions);
                })?;
            }
            PollStatus::Delivered => {
                if let Some(motions) = found.borrow_mut().take() {
                    shut_down(&mut client);
                    return Ok(motions);
                }
            }
            PollStatus::ServerError(message) => bail!("Search failed: {}", message),
            PollStatus::Idle => {}
        }

        if Instant::now() >= deadline {
            bail!("No answer from the pathfinding server within {:?}", limit);
        }
        std::thread::sleep(FRAME_DURATION);
    }
}

/// Close the client and give the server a moment to exit on its own.
fn shut_down(client: &mut Client) {
    client.close();
    let deadline = Instant::now() + SHUTDOWN_GRACE;
    while client.server_alive() && Instant::now() < deadline {
        // Closed clients only reap; polling cannot fail here.
        let _ = client.poll();
        std::thread::sleep(FRAME_DURATION);
    }
}
