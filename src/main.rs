// Copyright The schedsim authors
// SPDX-License-Identifier: Apache-2.0

//! `scheduler-main`: drives a workload through the scheduling core.
//!
//! Wires together the production collaborators (wall clock, intake ring,
//! workload feeder thread, memory manager, OS worker controller, file sinks)
//! and hands them to the coordinator. SIGINT/SIGTERM are blocked up front and
//! watched from a dedicated thread, so teardown is an ordinary cancellation
//! flag rather than an async-signal-safe handler.

use clap::Parser;
use schedsim_channel::spsc;
use schedsim_config::{MemoryKind, SchedulerKind, SimSettings, workload};
use schedsim_engine::error::Error;
use schedsim_engine::{Coordinator, OsWorkerSet, RunSummary, WallClock, feeder};
use schedsim_memory::MemoryManager;
use schedsim_telemetry::FileSinks;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

#[derive(Parser)]
#[command(
    name = "scheduler-main",
    version,
    about = "Tick-driven process scheduling and memory allocation simulator"
)]
struct Cli {
    /// Workload file: one `id arrival runtime priority mem_size` line per
    /// job; `#` starts a comment.
    input_file: PathBuf,

    /// Scheduling algorithm: 1 = FCFS, 2 = SJF, 3 = HPF, 4 = SRTN, 5 = RR.
    sch_algo: SchedulerKind,

    /// Memory algorithm: 1 = first-fit, 2 = next-fit, 3 = best-fit,
    /// 4 = buddy.
    mem_algo: MemoryKind,

    /// JSON settings file overriding the built-in constants.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Directory receiving scheduler.log, memory.log, and scheduler.perf.
    #[arg(long, default_value = ".")]
    log_dir: PathBuf,

    /// Worker binary; defaults to `worker` next to this executable.
    #[arg(long)]
    worker_bin: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(summary) => {
            if !summary.unserviceable.is_empty() {
                tracing::warn!(
                    jobs = ?summary.unserviceable,
                    "jobs larger than the address space never ran"
                );
            }
            tracing::info!(
                ticks = summary.ticks,
                finished = summary.finished,
                interrupted = summary.interrupted,
                cpu_utilization = %format_args!("{:.2}%", summary.perf.cpu_utilization),
                "simulation done"
            );
            ExitCode::SUCCESS
        }
        Err(error) => {
            tracing::error!(%error, "simulation failed");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<RunSummary, Error> {
    let settings = match &cli.settings {
        Some(path) => SimSettings::from_file(path)?,
        None => SimSettings::default(),
    };
    settings.validate(cli.mem_algo)?;

    let jobs = workload::load_workload(&cli.input_file)?;
    tracing::info!(
        jobs = jobs.len(),
        scheduler = %cli.sch_algo,
        memory = %cli.mem_algo,
        tick = ?settings.tick,
        "workload loaded"
    );

    std::fs::create_dir_all(&cli.log_dir).map_err(|error| Error::Trace {
        context: "log directory",
        error,
    })?;
    let sinks = FileSinks::create(&cli.log_dir).map_err(|error| Error::Trace {
        context: "trace files",
        error,
    })?;

    let worker_bin = match cli.worker_bin {
        Some(path) => path,
        None => sibling_worker_binary()?,
    };
    let memory = MemoryManager::new(cli.mem_algo, settings.memory_size)?;
    let clock = Arc::new(WallClock::start(settings.tick));
    let (producer, consumer) = spsc::channel(settings.intake_capacity);
    let workers = OsWorkerSet::new(worker_bin, settings.tick);

    let mut coordinator = Coordinator::new(
        &settings,
        cli.sch_algo,
        clock.clone(),
        consumer,
        memory,
        workers,
        sinks,
    );
    watch_interrupts(coordinator.interrupt_flag())?;

    let feeder = feeder::spawn(jobs, producer, clock, settings.poll_interval())?;
    let outcome = coordinator.run();
    // Dropping the coordinator closes the intake, unblocking a feeder that is
    // still trying to push after an interrupt.
    drop(coordinator);
    let _ = feeder.join();
    outcome
}

fn sibling_worker_binary() -> Result<PathBuf, Error> {
    let current = std::env::current_exe().map_err(|error| Error::Trace {
        context: "current executable path",
        error,
    })?;
    Ok(current.with_file_name("worker"))
}

/// Blocks SIGINT/SIGTERM process-wide and turns them into a cancellation
/// flag. Must run before other threads (and workers) are spawned so every one
/// of them inherits the mask.
fn watch_interrupts(flag: Arc<AtomicBool>) -> Result<(), Error> {
    use nix::sys::signal::{SigSet, SigmaskHow, Signal, sigprocmask};

    let mut mask = SigSet::empty();
    mask.add(Signal::SIGINT);
    mask.add(Signal::SIGTERM);
    sigprocmask(SigmaskHow::SIG_BLOCK, Some(&mask), None).map_err(|errno| Error::Spawn {
        task: "signal-watcher",
        details: format!("could not block signals: {errno}"),
    })?;

    let _ = thread::Builder::new()
        .name("signal-watcher".to_owned())
        .spawn(move || {
            loop {
                match mask.wait() {
                    Ok(signal) => {
                        tracing::info!(%signal, "interrupt requested");
                        flag.store(true, Ordering::SeqCst);
                    }
                    Err(errno) => {
                        tracing::warn!(%errno, "signal wait failed, watcher exiting");
                        return;
                    }
                }
            }
        })
        .map_err(|e| Error::Spawn {
            task: "signal-watcher",
            details: e.to_string(),
        })?;
    Ok(())
}
