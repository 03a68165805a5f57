//! External toolchain invocation
//!
//! The vendor binaries directory is put on the search path of each child
//! process; the parent's environment is never modified. Long-running
//! invocations are polled so a timeout or a cancellation request can kill
//! the child.

use crate::error::{ConfigError, FlowError, Result};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Child, Command};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Interval between child status polls
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Limits applied to one external invocation
#[derive(Debug, Clone, Default)]
pub struct RunLimits {
    /// Kill the child after this long
    pub timeout: Option<Duration>,
    /// Kill the child once this flag is set
    pub cancel: Option<Arc<AtomicBool>>,
}

impl RunLimits {
    /// No timeout, no cancellation
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Set the timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the cancellation flag
    #[must_use]
    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

/// Location of the vendor toolchain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    bin_dir: PathBuf,
}

impl Toolchain {
    /// Toolchain with binaries in `bin_dir`
    pub fn new(bin_dir: impl Into<PathBuf>) -> Self {
        Self {
            bin_dir: bin_dir.into(),
        }
    }

    /// Binaries directory
    pub fn bin_dir(&self) -> &Path {
        &self.bin_dir
    }

    /// Search path for child processes: the toolchain first, then the
    /// inherited `PATH`.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be placed on a search path.
    pub fn search_path(&self) -> Result<OsString> {
        let inherited = std::env::var_os("PATH").unwrap_or_default();
        let dirs = std::iter::once(self.bin_dir.clone()).chain(std::env::split_paths(&inherited));
        std::env::join_paths(dirs).map_err(|e| {
            ConfigError::invalid_setting(
                crate::settings::VIVADO_BIN_DIR,
                self.bin_dir.display().to_string(),
                e.to_string(),
            )
            .into()
        })
    }

    /// Command for `program` with the toolchain on its search path.
    ///
    /// # Errors
    ///
    /// Returns error if the search path cannot be built.
    pub fn command(&self, program: impl AsRef<OsStr>) -> Result<Command> {
        let mut command = Command::new(program);
        command.env("PATH", self.search_path()?);
        Ok(command)
    }
}

/// Run a command to completion under the given limits.
///
/// # Errors
///
/// Returns error if the child cannot be spawned, exits unsuccessfully,
/// times out or is cancelled.
pub fn run(command: &mut Command, limits: &RunLimits) -> Result<()> {
    let tool = command.get_program().to_string_lossy().into_owned();
    info!("Running {tool}");
    debug!("{command:?}");

    let mut child = command
        .spawn()
        .map_err(|e| FlowError::backend(&tool, format!("failed to start: {e}")))?;
    let started = Instant::now();

    loop {
        if let Some(status) = child.try_wait()? {
            debug!("{tool} finished in {:?}", started.elapsed());
            if status.success() {
                return Ok(());
            }
            return Err(FlowError::ToolFailed {
                tool,
                status: status.to_string(),
            });
        }

        if limits.cancelled() {
            warn!("Cancelling {tool}");
            stop(&mut child)?;
            return Err(FlowError::Cancelled);
        }

        if let Some(timeout) = limits.timeout {
            if started.elapsed() >= timeout {
                warn!("{tool} exceeded {timeout:?}, killing it");
                stop(&mut child)?;
                return Err(FlowError::Timeout {
                    duration_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                });
            }
        }

        std::thread::sleep(POLL_INTERVAL);
    }
}

fn stop(child: &mut Child) -> Result<()> {
    // The child may exit between the poll and the kill.
    if let Err(e) = child.kill() {
        debug!("kill: {e}");
    }
    child.wait()?;
    Ok(())
}
