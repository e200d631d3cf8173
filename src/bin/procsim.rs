//! procsim — drive the process-scheduler simulation from operator commands.
//!
//! The commander (this front-end) reads command characters from the operator
//! and forwards them, one byte each, over a unidirectional pipe to the
//! manager running on a worker thread. Closing the input ends the run.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::thread;

use anyhow::{Context, Result};
use clap::Parser;

use procsim::{run_commands, ExitReason, ProcessManager};

/// Drive the process-scheduler simulation from operator commands.
#[derive(Parser)]
#[command(name = "procsim")]
#[command(version)]
struct Cli {
    /// Program file for the initial process.
    #[arg(long, default_value = "init.txt")]
    init: PathBuf,

    /// Run a scripted command string (e.g. "QQPQT") instead of reading
    /// commands interactively from stdin.
    #[arg(long)]
    commands: Option<String>,
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    if let Err(e) = run(&cli) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let mut manager = ProcessManager::from_file(&cli.init)
        .with_context(|| format!("failed to load initial program {}", cli.init.display()))?;

    let (reader, mut writer) = io::pipe().context("failed to create command pipe")?;

    // The manager consumes command bytes from the read side; dumps and the
    // final report go to stdout, locked per write so the prompt below can
    // interleave.
    let worker = thread::spawn(move || -> io::Result<ExitReason> {
        run_commands(&mut manager, reader, io::stdout())
    });

    match &cli.commands {
        Some(commands) => {
            // Scripted mode: forward the whole command string and close the
            // pipe. Without a T the manager shuts down on EOF.
            writer.write_all(commands.as_bytes()).ok();
            drop(writer);
        }
        None => {
            let stdin = io::stdin();
            let mut line = String::new();
            'session: loop {
                print!("Enter Q, P, U or T\n$ ");
                io::stdout().flush().ok();

                line.clear();
                if stdin.lock().read_line(&mut line)? == 0 {
                    // Operator EOF: closing the pipe shuts the manager down.
                    break;
                }
                for &byte in line.as_bytes() {
                    if byte.is_ascii_whitespace() {
                        continue;
                    }
                    if writer.write_all(&[byte]).is_err() {
                        // Manager exited and closed its end.
                        break 'session;
                    }
                    if byte.eq_ignore_ascii_case(&b'T') {
                        break 'session;
                    }
                }
            }
            drop(writer);
        }
    }

    let reason = worker
        .join()
        .expect("manager thread panicked")
        .context("manager failed")?;
    tracing::debug!(?reason, "manager finished");
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .try_init();
}
