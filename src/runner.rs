use crate::{env, lookup, redirect};
use anyhow::{Context, Result, anyhow};
use std::collections::HashSet;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::sync::{Mutex, PoisonError};
use std::thread;
use tracing::error;
#[cfg(unix)]
use tracing::warn;

/// Executable name of the orchestration CLI that receives the injected
/// project-selection arguments.
pub const COMPOSE_EXE: &str = "docker-compose";

/// Our own command name. Invocations of it are exempt from PATH validation
/// and redirection parsing.
pub const SELF_EXE: &str = "devc";

/// Exit code used when an executable cannot be resolved on PATH.
const NOT_FOUND_EXIT: i32 = 2;

/// Verdict of an interactive run, for the top-level caller to act on.
///
/// The runner itself never terminates the process; it hands the child's
/// fate back so exit-code mirroring happens in exactly one place. Use
/// [`Outcome::apply`] for the standard mapping.
#[derive(Debug)]
#[must_use]
pub enum Outcome {
    /// The child exited successfully; nothing further to do.
    Completed,
    /// The child exited abnormally; the caller should exit with this code.
    /// Children killed by a signal are reported as `128 + signal`.
    ChildExited(i32),
    /// The executable could not be resolved on PATH. The caller should
    /// print the failure and exit with code 2.
    NotFound {
        /// The command line as it would have run.
        command: String,
        /// Why resolution failed.
        error: anyhow::Error,
    },
    /// Waiting on the child failed for a reason unrelated to how the child
    /// itself exited. The caller should log and exit.
    Fatal(anyhow::Error),
}

impl Outcome {
    /// Mirror the verdict onto the current process.
    ///
    /// Returns only for [`Outcome::Completed`]; every other variant
    /// terminates the process with the corresponding exit code.
    pub fn apply(self) {
        match self {
            Outcome::Completed => {}
            Outcome::ChildExited(code) => std::process::exit(code),
            Outcome::NotFound { command, error } => {
                println!("Failed to run {command} error: {error}");
                std::process::exit(NOT_FOUND_EXIT);
            }
            Outcome::Fatal(error) => {
                error!("waiting on child process failed: {error}");
                std::process::exit(1);
            }
        }
    }
}

/// Launches external commands silently or interactively.
///
/// The runner remembers which bare command names it has already resolved
/// on PATH, so repeated interactive invocations of the same tool pay for
/// the lookup once per runner lifetime.
///
/// Example
/// ```
/// use devc::Runner;
/// let out = Runner::new().exec("echo", &["hello"]).unwrap();
/// assert_eq!(out, "hello");
/// ```
pub struct Runner {
    looked_up: Mutex<HashSet<String>>,
}

impl Runner {
    pub fn new() -> Self {
        Self {
            looked_up: Mutex::new(HashSet::new()),
        }
    }

    /// Run a command silently and return its combined output.
    ///
    /// Stdout and stderr of the child are captured into a single stream;
    /// nothing is echoed to the caller's terminal. The caller's stdin is
    /// attached, so commands that prompt still work. The result is trimmed
    /// of surrounding whitespace.
    pub fn exec(&self, exe: &str, args: &[&str]) -> Result<String> {
        let args = augment_args(exe, args);
        let mut cmd = Command::new(exe);
        cmd.args(&args).stdin(Stdio::inherit());
        let combined = run_combined(cmd).with_context(|| format!("failed to run {exe}"))?;
        Ok(String::from_utf8_lossy(&combined).trim().to_string())
    }

    /// Run a command attached to the caller's terminal, forwarding signals.
    ///
    /// The child shares our stdout/stderr (and stdin, unless a trailing
    /// `< path` redirection is present), and every OS signal we receive
    /// while it runs is relayed to it. The returned [`Outcome`] tells the
    /// caller how the child ended; recoverable launch problems (a bad
    /// redirection source, a spawn failure) come back as ordinary errors.
    pub fn interactive(&self, exe: &str, args: &[&str]) -> Result<Outcome> {
        let mut args = augment_args(exe, args);

        if env::is_true(env::VERBOSE_VAR) {
            println!("$ {}", command_line(exe, &args));
        }

        let mut stdin = Stdio::inherit();
        if exe != SELF_EXE {
            if let Some(path) = redirect::take_trailing(&mut args) {
                stdin = Stdio::from(redirect::open_source(&path)?);
            }
        }

        let mut cmd = Command::new(exe);
        cmd.args(&args)
            .stdin(stdin)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        // Bare command names are resolved once per runner lifetime; path
        // invocations and our own name go straight to spawn.
        if exe != SELF_EXE && !lookup::is_path_invocation(exe) && !self.validated(exe) {
            if lookup::find_on_path(exe).is_none() {
                return Ok(Outcome::NotFound {
                    command: command_line(exe, &args),
                    error: anyhow!("executable file not found in $PATH"),
                });
            }
            self.mark_validated(exe);
        }

        let child = cmd
            .spawn()
            .with_context(|| format!("failed to start {exe}"))?;

        Ok(relay_until_exit(child))
    }

    fn validated(&self, exe: &str) -> bool {
        self.looked_up
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(exe)
    }

    fn mark_validated(&self, exe: &str) {
        self.looked_up
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(exe.to_string());
    }
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

/// Default arguments selecting the compose project: `-p <project name>`.
///
/// The project name is read from the environment on every call.
fn compose_default_args() -> Vec<String> {
    vec!["-p".to_string(), env::project_name()]
}

/// Prepend the project-selection arguments when the target is the
/// orchestration CLI; every other executable gets its arguments untouched.
fn augment_args(exe: &str, args: &[&str]) -> Vec<String> {
    let mut out = Vec::with_capacity(args.len() + 2);
    if exe == COMPOSE_EXE {
        out.extend(compose_default_args());
    }
    out.extend(args.iter().map(|s| s.to_string()));
    out
}

fn command_line(exe: &str, args: &[String]) -> String {
    if args.is_empty() {
        exe.to_string()
    } else {
        format!("{} {}", exe, args.join(" "))
    }
}

/// Spawn the prepared command with stdout and stderr captured into one
/// byte stream, and wait for it to finish.
///
/// Both streams write to the same pipe, so the capture preserves the order
/// in which the child produced its output.
#[cfg(unix)]
fn run_combined(mut cmd: Command) -> Result<Vec<u8>> {
    use std::fs::File;
    use std::io::Read;

    let (reader, writer) = nix::unistd::pipe().context("creating capture pipe")?;
    let writer_err = writer.try_clone().context("duplicating capture pipe")?;
    cmd.stdout(Stdio::from(writer)).stderr(Stdio::from(writer_err));

    let mut child = cmd.spawn()?;
    // Close our copies of the write end so the read below sees EOF once
    // the child exits.
    drop(cmd);

    let mut combined = Vec::new();
    File::from(reader).read_to_end(&mut combined)?;
    child.wait()?;
    Ok(combined)
}

#[cfg(not(unix))]
fn run_combined(mut cmd: Command) -> Result<Vec<u8>> {
    let output = cmd
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?
        .wait_with_output()?;
    let mut combined = output.stdout;
    combined.extend_from_slice(&output.stderr);
    Ok(combined)
}

enum Event {
    Exited(std::io::Result<ExitStatus>),
    #[cfg(unix)]
    Signal(i32),
}

/// Wait for the child while relaying every received OS signal to it.
///
/// One thread blocks on `wait()` and posts the exit event; the signal pump
/// posts each delivered signal. The loop forwards signals until the exit
/// event arrives, then shuts the subscription down. A signal that races
/// the child's exit is forwarded into nothing and silently dropped.
fn relay_until_exit(mut child: Child) -> Outcome {
    #[cfg(unix)]
    let pid = child.id() as i32;

    let (tx, rx) = mpsc::channel();

    let wait_tx = tx.clone();
    thread::spawn(move || {
        let _ = wait_tx.send(Event::Exited(child.wait()));
    });

    #[cfg(unix)]
    let signals = match signal_pump(tx) {
        Ok(handle) => Some(handle),
        Err(err) => {
            warn!("signal forwarding disabled: {err}");
            None
        }
    };
    #[cfg(not(unix))]
    drop(tx);

    let outcome = loop {
        match rx.recv() {
            Ok(Event::Exited(Ok(status))) => break exit_outcome(status),
            Ok(Event::Exited(Err(err))) => break Outcome::Fatal(err.into()),
            #[cfg(unix)]
            Ok(Event::Signal(sig)) => forward_signal(pid, sig),
            Err(_) => break Outcome::Fatal(anyhow!("child exit notification lost")),
        }
    };

    #[cfg(unix)]
    if let Some(handle) = signals {
        handle.close();
    }

    outcome
}

/// Subscribe to every catchable signal and pump deliveries into the relay
/// channel. Returns the handle used to end the subscription.
#[cfg(unix)]
fn signal_pump(tx: mpsc::Sender<Event>) -> Result<signal_hook::iterator::Handle> {
    use signal_hook::consts::FORBIDDEN;
    use signal_hook::iterator::Signals;

    let relayable: Vec<i32> = (1..32).filter(|sig| !FORBIDDEN.contains(sig)).collect();
    let mut signals = Signals::new(&relayable)?;
    let handle = signals.handle();
    thread::spawn(move || {
        for sig in signals.forever() {
            if tx.send(Event::Signal(sig)).is_err() {
                break;
            }
        }
    });
    Ok(handle)
}

#[cfg(unix)]
fn forward_signal(pid: i32, sig: i32) {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    let signal = match Signal::try_from(sig) {
        Ok(signal) => signal,
        Err(_) => return,
    };
    match kill(Pid::from_raw(pid), signal) {
        // ESRCH: the child beat us to the exit. Expected race, not an error.
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(err) => warn!("cannot forward signal {sig} to child {pid}: {err}"),
    }
}

fn exit_outcome(status: ExitStatus) -> Outcome {
    if status.success() {
        return Outcome::Completed;
    }
    match status.code() {
        Some(code) => Outcome::ChildExited(code),
        None => Outcome::ChildExited(signal_exit_code(status)),
    }
}

#[cfg(unix)]
fn signal_exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    match status.signal() {
        Some(signal) => 128 + signal,
        None => 1,
    }
}

#[cfg(not(unix))]
fn signal_exit_code(_status: ExitStatus) -> i32 {
    1
}
