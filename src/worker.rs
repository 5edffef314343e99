// Copyright The schedsim authors
// SPDX-License-Identifier: Apache-2.0

//! The worker process.
//!
//! A worker's observable contract is tiny: announce readiness with a single
//! line on stdout, stop itself so the controller's first suspension can never
//! race initialization, and, once resumed, burn one unit of its runtime per
//! tick-length sleep until nothing remains. A suspension freezes the
//! countdown because the decrement simply cannot execute while stopped.
//!
//! The coordinator stays authoritative for scheduling accounting; this
//! countdown only controls when the worker exits.

use clap::Parser;
use nix::sys::signal::{Signal, raise};
use std::io::Write;
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "worker", version, about = "Per-job worker: burns runtime ticks while resumed")]
struct Cli {
    /// Ticks of CPU time to burn before exiting.
    runtime: u64,

    /// Wall-time length of one tick, in milliseconds.
    #[arg(long, default_value_t = 500)]
    tick_ms: u64,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Readiness handshake.
    let mut stdout = std::io::stdout();
    if writeln!(stdout, "ready").and_then(|()| stdout.flush()).is_err() {
        return ExitCode::FAILURE;
    }
    // Park until the first resume.
    if raise(Signal::SIGSTOP).is_err() {
        return ExitCode::FAILURE;
    }

    let tick = Duration::from_millis(cli.tick_ms.max(1));
    let mut remaining = cli.runtime;
    while remaining > 0 {
        thread::sleep(tick);
        remaining -= 1;
    }
    ExitCode::SUCCESS
}
