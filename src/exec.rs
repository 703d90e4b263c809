//! Subprocess execution for verification commands and test cases

use anyhow::{bail, Context, Result};
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use std::fs::File;
use std::io::Read;
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;
use wait_timeout::ChildExt;

use crate::models::{RawCommand, ShellCommand};

/// Outcome of a captured run (no resource accounting).
#[derive(Debug)]
pub struct ExecResult {
    pub stdout: Vec<u8>,
    pub exit_code: Option<i32>,
    pub elapsed: Duration,
    pub timed_out: bool,
}

/// Outcome of a measured test-case run.
#[derive(Debug)]
pub struct MeasuredRun {
    pub stdout: Vec<u8>,
    /// `None` when the process was killed (timeout or signal).
    pub exit_code: Option<i32>,
    /// Wall-clock seconds.
    pub elapsed: f64,
    /// Peak RSS in megabytes, when the platform reports it.
    pub memory_mb: Option<f64>,
    pub timed_out: bool,
}

/// Build a `Command` from the model: shell lines go through `sh -c`,
/// argv vectors are spawned directly.
fn build_command(cmd: &ShellCommand) -> Result<Command> {
    let mut command = match &cmd.command {
        RawCommand::Line(line) => {
            let mut c = Command::new("sh");
            c.arg("-c").arg(line);
            c
        }
        RawCommand::Argv(argv) => {
            let Some((program, args)) = argv.split_first() else {
                bail!("empty argv command");
            };
            let mut c = Command::new(program);
            c.args(args);
            c
        }
    };
    if let Some(env) = &cmd.env {
        command.envs(env);
    }
    if let Some(cwd) = &cmd.cwd {
        command.current_dir(cwd);
    }
    Ok(command)
}

/// Run a command with inherited stdio and wait for it.
///
/// Used for compile steps and plain command verifications, whose output
/// belongs in the run log as-is.
pub fn run_status(cmd: &ShellCommand) -> Result<std::process::ExitStatus> {
    debug!(command = %cmd.command.display(), "$ run");
    let mut command = build_command(cmd)?;
    command
        .stdin(Stdio::null())
        .status()
        .with_context(|| format!("Failed to execute: {}", cmd.command.display()))
}

/// Run a command capturing stdout, optionally bounded by a timeout.
///
/// Output is drained on a separate thread before waiting, otherwise the
/// child can block on a full pipe and deadlock against our wait.
pub fn run_captured(
    cmd: &ShellCommand,
    stdin_file: Option<&Path>,
    timeout: Option<Duration>,
) -> Result<ExecResult> {
    debug!(command = %cmd.command.display(), "$ run (captured)");
    let mut command = build_command(cmd)?;
    match stdin_file {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open stdin file: {}", path.display()))?;
            command.stdin(Stdio::from(file));
        }
        None => {
            command.stdin(Stdio::null());
        }
    }
    command.stdout(Stdio::piped()).stderr(Stdio::inherit());

    let start = Instant::now();
    let mut child = command
        .spawn()
        .with_context(|| format!("Failed to spawn: {}", cmd.command.display()))?;

    let drain = spawn_drain_thread(child.stdout.take());

    let (exit_code, timed_out) = match timeout {
        Some(limit) => match child.wait_timeout(limit)? {
            Some(status) => (status.code(), false),
            None => {
                let _ = child.kill();
                let _ = child.wait();
                (None, true)
            }
        },
        None => (child.wait()?.code(), false),
    };

    Ok(ExecResult {
        stdout: join_drain(drain),
        exit_code,
        elapsed: start.elapsed(),
        timed_out,
    })
}

/// Run one test-case command: stdin from the case input, stdout captured,
/// wall time and peak RSS measured, killed as a process group once the
/// time limit passes.
pub fn measure(cmd: &ShellCommand, stdin_file: &Path, time_limit: Option<f64>) -> Result<MeasuredRun> {
    debug!(command = %cmd.command.display(), input = %stdin_file.display(), "$ measure");
    let mut command = build_command(cmd)?;
    let input = File::open(stdin_file)
        .with_context(|| format!("Failed to open test input: {}", stdin_file.display()))?;
    command
        .stdin(Stdio::from(input))
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        // Own process group so a timeout kill reaches grandchildren too.
        .process_group(0);

    let start = Instant::now();
    let mut child = command
        .spawn()
        .with_context(|| format!("Failed to spawn: {}", cmd.command.display()))?;
    let pid = child.id() as libc::pid_t;

    let drain = spawn_drain_thread(child.stdout.take());

    let deadline = time_limit.map(|s| start + Duration::from_secs_f64(s));
    let mut status: libc::c_int = 0;
    let mut rusage: libc::rusage = unsafe { std::mem::zeroed() };
    let mut timed_out = false;

    let exit_code = loop {
        let reaped = unsafe { libc::wait4(pid, &mut status, libc::WNOHANG, &mut rusage) };
        if reaped == -1 {
            bail!(
                "wait4 failed for {}: {}",
                cmd.command.display(),
                std::io::Error::last_os_error()
            );
        }
        if reaped == pid {
            break decode_exit(status);
        }
        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                timed_out = true;
                let _ = killpg(Pid::from_raw(pid), Signal::SIGKILL);
                unsafe { libc::wait4(pid, &mut status, 0, &mut rusage) };
                break None;
            }
        }
        thread::sleep(Duration::from_millis(5));
    };

    Ok(MeasuredRun {
        stdout: join_drain(drain),
        exit_code,
        elapsed: start.elapsed().as_secs_f64(),
        memory_mb: maxrss_mb(&rusage),
        timed_out,
    })
}

fn decode_exit(status: libc::c_int) -> Option<i32> {
    if libc::WIFEXITED(status) {
        Some(libc::WEXITSTATUS(status))
    } else {
        None
    }
}

fn maxrss_mb(rusage: &libc::rusage) -> Option<f64> {
    if rusage.ru_maxrss <= 0 {
        return None;
    }
    // ru_maxrss is kilobytes on Linux, bytes on macOS.
    #[cfg(target_os = "macos")]
    let mb = rusage.ru_maxrss as f64 / (1024.0 * 1024.0);
    #[cfg(not(target_os = "macos"))]
    let mb = rusage.ru_maxrss as f64 / 1024.0;
    Some(mb)
}

fn spawn_drain_thread(
    stdout: Option<std::process::ChildStdout>,
) -> Option<thread::JoinHandle<Vec<u8>>> {
    stdout.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
    })
}

fn join_drain(handle: Option<thread::JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}
