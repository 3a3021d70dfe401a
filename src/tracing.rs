//! Tracing setup for hosts and test harnesses embedding the engine.
//!
//! The library only emits events; nothing is printed until a subscriber is installed.

use std::sync::Once;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Install a compact stderr subscriber. Safe to call multiple times.
///
/// `RUST_LOG` is honoured; without it the engine logs at INFO, or DEBUG when running
/// under a test harness.
pub fn init() {
    INIT.call_once(|| {
        let under_test =
            std::env::var("NEXTEST").is_ok() || std::env::var("CARGO_TARGET_TMPDIR").is_ok();
        init_with_level(if under_test {
            LevelFilter::DEBUG
        } else {
            LevelFilter::INFO
        });
    });
}

fn init_with_level(level: LevelFilter) {
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(true)
        .with_span_events(FmtSpan::NONE)
        .compact();

    let installed = if level == LevelFilter::DEBUG {
        builder.with_test_writer().finish().try_init()
    } else {
        builder.with_writer(std::io::stderr).finish().try_init()
    };

    if let Err(e) = installed {
        eprintln!("Failed to initialize tracing: {}", e);
    }
}
