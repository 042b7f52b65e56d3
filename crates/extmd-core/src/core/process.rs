//! Launches the simulation binary as a coprocess.
//!
//! Commands are given as shell-style strings and split into argv without
//! involving a shell. Every process is started in a new session, so it leads
//! its own process group and can be signalled as a whole (the simulation
//! binary may spawn helpers of its own) independently of the caller's group.

use std::io;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("Command line is empty")]
    EmptyCommand,

    #[error("Cannot split command line (unbalanced quoting?): {0}")]
    InvalidCommand(String),

    #[error("Failed to execute '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to wait for process {pid}: {source}")]
    Wait {
        pid: u32,
        #[source]
        source: io::Error,
    },

    #[error("Failed to signal process group {pid}: {source}")]
    Signal {
        pid: u32,
        #[source]
        source: io::Error,
    },
}

/// Splits a shell-style command string into argv tokens.
pub fn split_command(command: &str) -> Result<Vec<String>, LaunchError> {
    let argv =
        shlex::split(command).ok_or_else(|| LaunchError::InvalidCommand(command.to_string()))?;
    if argv.is_empty() {
        return Err(LaunchError::EmptyCommand);
    }
    Ok(argv)
}

/// Quotes a single argument so it survives [`split_command`] unchanged.
pub fn quote_arg(arg: &str) -> String {
    shlex::try_quote(arg)
        .map(|q| q.into_owned())
        .unwrap_or_else(|_| arg.to_string())
}

#[cfg(unix)]
fn detach_session(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;
    // SAFETY: the hook runs in the forked child before exec and only calls
    // setsid(2), which is async-signal-safe.
    unsafe {
        cmd.pre_exec(|| {
            if libc::setsid() == -1 {
                return Err(io::Error::last_os_error());
            }
            Ok(())
        });
    }
}

#[cfg(not(unix))]
fn detach_session(_cmd: &mut Command) {}

fn spawn(command: &str, cwd: Option<&Path>) -> Result<Child, LaunchError> {
    let argv = split_command(command)?;
    let mut cmd = Command::new(&argv[0]);
    cmd.args(&argv[1..]).stdin(Stdio::null());
    if let Some(dir) = cwd.filter(|d| !d.as_os_str().is_empty()) {
        cmd.current_dir(dir);
    }
    detach_session(&mut cmd);

    debug!(command, cwd = ?cwd, "Spawning process.");
    cmd.spawn().map_err(|source| LaunchError::Spawn {
        program: argv[0].clone(),
        source,
    })
}

/// Converts an exit status to a numeric code; death by signal `n` maps to `128 + n`.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}

/// Runs `command` to completion in a new session and returns its exit code.
///
/// # Errors
///
/// Returns [`LaunchError`] if the command cannot be parsed, the binary cannot
/// be executed, or waiting on it fails. A non-zero exit is not an error here.
pub fn run_sync(command: &str, cwd: Option<&Path>) -> Result<i32, LaunchError> {
    let mut child = spawn(command, cwd)?;
    let pid = child.id();
    let status = child
        .wait()
        .map_err(|source| LaunchError::Wait { pid, source })?;
    let code = exit_code(status);
    debug!(pid, code, "Process exited.");
    Ok(code)
}

/// Starts `command` in a new session and returns without waiting.
pub fn run_async(command: &str, cwd: Option<&Path>) -> Result<SimulationProcess, LaunchError> {
    let child = spawn(command, cwd)?;
    Ok(SimulationProcess {
        child,
        command: command.to_string(),
        exit_code: None,
    })
}

/// Handle to a running (or finished) coprocess that leads its own process group.
///
/// Dropping the handle does not stop the process.
#[derive(Debug)]
pub struct SimulationProcess {
    child: Child,
    command: String,
    exit_code: Option<i32>,
}

impl SimulationProcess {
    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Returns the exit code if the process has finished, without blocking.
    pub fn try_wait(&mut self) -> Result<Option<i32>, LaunchError> {
        if self.exit_code.is_some() {
            return Ok(self.exit_code);
        }
        let pid = self.pid();
        let status = self
            .child
            .try_wait()
            .map_err(|source| LaunchError::Wait { pid, source })?;
        self.exit_code = status.map(exit_code);
        Ok(self.exit_code)
    }

    pub fn is_running(&mut self) -> Result<bool, LaunchError> {
        Ok(self.try_wait()?.is_none())
    }

    /// Blocks until the process exits.
    pub fn wait(&mut self) -> Result<i32, LaunchError> {
        if let Some(code) = self.exit_code {
            return Ok(code);
        }
        let pid = self.pid();
        let status = self
            .child
            .wait()
            .map_err(|source| LaunchError::Wait { pid, source })?;
        let code = exit_code(status);
        self.exit_code = Some(code);
        Ok(code)
    }

    /// Sends SIGTERM to the whole process group.
    pub fn terminate(&mut self) -> Result<(), LaunchError> {
        #[cfg(unix)]
        {
            self.signal_group(libc::SIGTERM)
        }
        #[cfg(not(unix))]
        {
            self.kill()
        }
    }

    /// Sends SIGKILL to the whole process group.
    pub fn kill(&mut self) -> Result<(), LaunchError> {
        #[cfg(unix)]
        {
            self.signal_group(libc::SIGKILL)
        }
        #[cfg(not(unix))]
        {
            let pid = self.pid();
            match self.child.kill() {
                Err(e) if e.kind() != io::ErrorKind::InvalidInput => {
                    Err(LaunchError::Signal { pid, source: e })
                }
                _ => Ok(()),
            }
        }
    }

    #[cfg(unix)]
    fn signal_group(&mut self, signal: libc::c_int) -> Result<(), LaunchError> {
        let pid = self.pid();
        let pgid = pid as libc::pid_t;
        debug!(pgid, signal, "Signalling process group.");
        // SAFETY: kill(2) with a negative pid only sends a signal; no memory is touched.
        let rc = unsafe { libc::kill(-pgid, signal) };
        if rc == -1 {
            let err = io::Error::last_os_error();
            if err.raw_os_error() == Some(libc::ESRCH) {
                warn!(pgid, "Process group already gone.");
                return Ok(());
            }
            return Err(LaunchError::Signal { pid, source: err });
        }
        Ok(())
    }
}
