//! Watch a robot camera link.
//!
//! Demonstrates:
//! - Creating a registry from the page origin
//! - Wiring lifecycle callbacks
//! - Following detection status and frames from the store
//! - Toggling face detection
//! - Clearing the link on Ctrl+C
//!
//! Usage:
//!   cargo run --example watch_camera -- --origin http://robot.local:8080 --target RB-0042
//!   cargo run --example watch_camera -- --target RB-0042 --detect
//!   cargo run --example watch_camera -- --target RB-0042 --debug

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use robot_camera_link::{LinkCallbacks, LinkConfig, LinkRegistry, LinkState, Result, TargetId};
use tracing_subscriber::EnvFilter;
use url::Url;

// ============================================================================
// Constants
// ============================================================================

const DEFAULT_ORIGIN: &str = "http://127.0.0.1:8080";

// ============================================================================
// Args
// ============================================================================

/// Command-line arguments.
#[derive(Debug, Clone)]
struct Args {
    origin: String,
    target: String,
    detect: bool,
    debug: bool,
}

impl Args {
    /// Parse command-line arguments.
    fn parse() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let value_of = |flag: &str| {
            args.iter()
                .position(|a| a == flag)
                .and_then(|i| args.get(i + 1))
                .cloned()
        };

        Self {
            origin: value_of("--origin").unwrap_or_else(|| DEFAULT_ORIGIN.to_owned()),
            target: value_of("--target").unwrap_or_else(|| "demo".to_owned()),
            detect: args.iter().any(|a| a == "--detect"),
            debug: args.iter().any(|a| a == "--debug"),
        }
    }
}

/// Initialize tracing/logging.
fn init_logging(debug: bool) {
    let filter = if debug {
        "robot_camera_link=debug"
    } else {
        "robot_camera_link=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    println!("=== Watch Camera ===\n");

    // ========================================================================
    // Create Link
    // ========================================================================

    let origin = Url::parse(&args.origin)?;
    let target = TargetId::new(args.target)?;
    let config = LinkConfig::new().with_heartbeat_interval(Duration::from_secs(10));
    let registry = LinkRegistry::new(origin, config)?;

    let callbacks = LinkCallbacks::new()
        .with_open(|| println!("[open] camera online"))
        .with_close(|code, reason| println!("[close] {code} {reason}"))
        .with_send(|command| println!("[send] {}", command.name()))
        .with_timeout(|| println!("[timeout] heartbeat missed"))
        .with_error(|err| {
            if err.is_terminal() {
                println!("[error] connection lost: {err}");
            } else {
                println!("[error] {err}");
            }
        });

    let link = registry.create(target, callbacks)?;
    println!("[1] Connecting to {}\n", link.url());

    // ========================================================================
    // Follow Store
    // ========================================================================

    let store = link.store().clone();
    let mut detection = store.subscribe_detection();
    let mut frames = store.subscribe_frames();
    let mut status = link.subscribe_status();
    let mut detect_requested = !args.detect;

    println!("Press Ctrl+C to exit...\n");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,

            Ok(()) = status.changed() => {
                let snapshot = status.borrow_and_update().clone();
                println!(
                    "[status] {} (attempts {}, delay {}ms)",
                    snapshot.state,
                    snapshot.attempts,
                    snapshot.delay.as_millis()
                );

                if !detect_requested && snapshot.state == LinkState::Connected {
                    detect_requested = true;
                    if let Err(e) = link.toggle_face_detection(true).await {
                        println!("[send] failed: {e}");
                    }
                }
            }

            Ok(()) = detection.changed() => {
                let enabled = *detection.borrow_and_update();
                println!("[detection] {enabled:?}");
            }

            Ok(()) = frames.changed() => {
                let frame = frames.borrow_and_update().clone();
                if let Some(frame) = frame {
                    let format = frame
                        .format()
                        .and_then(|format| format.extensions_str().first().copied())
                        .unwrap_or("unknown");
                    println!("[frame] #{} {} bytes ({format})", frame.seq(), frame.len());
                }
            }
        }
    }

    // ========================================================================
    // Cleanup
    // ========================================================================

    println!("\n[2] Clearing link...");
    registry.clear_all().await;
    println!("    ✓ Done");

    Ok(())
}
