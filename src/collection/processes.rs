//! Tracking of the processes that belong to a named program.
//!
//! For Linux, the OS is read through `/proc` directly.
//! For everything else, this is handled by sysinfo.

cfg_if::cfg_if! {
    if #[cfg(target_os = "linux")] {
        pub mod linux;
        pub use self::linux::ProcfsSource;
    }
}

pub mod sysinfo;
pub use self::sysinfo::SysinfoSource;

use std::{
    fmt::Debug,
    io,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, OnceLock, PoisonError},
    time::{Duration, Instant},
};

use anyhow::anyhow;
use indexmap::IndexMap;

use super::error::{CollectionError, CollectionResult};

cfg_if::cfg_if! {
    if #[cfg(target_family = "windows")] {
        /// A Windows process ID.
        pub type Pid = usize;
    } else if #[cfg(target_family = "unix")] {
        /// A UNIX process ID.
        pub type Pid = libc::pid_t;
    }
}

/// Maximum length of the kernel's process name (the field is 16 bytes, but this
/// includes a null terminator).
///
/// Targets longer than this can never match the name, so they are matched
/// against the command line instead.
pub const MAX_STAT_NAME_LEN: usize = 15;

/// How long a full sync is considered recent.
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(10);

/// Somewhere process information can be read from.
pub trait ProcessSource: Debug + Send + Sync {
    /// Lists every running process. Gives up with
    /// [`CollectionError::DeadlineExceeded`] once `deadline` has passed.
    fn pids(&self, deadline: Option<Instant>) -> CollectionResult<Vec<Pid>>;

    /// Whether a process with this ID currently exists.
    fn exists(&self, pid: Pid) -> bool;

    /// The kernel's name for the process. On Linux this is truncated to
    /// [`MAX_STAT_NAME_LEN`] bytes.
    fn name(&self, pid: Pid) -> io::Result<String>;

    /// The process' arguments, starting with the command itself.
    fn cmdline(&self, pid: Pid) -> io::Result<Vec<String>>;

    /// The path to the process' executable.
    fn exe(&self, pid: Pid) -> io::Result<PathBuf>;
}

/// The default [`ProcessSource`] for this platform.
pub fn default_source() -> Arc<dyn ProcessSource> {
    cfg_if::cfg_if! {
        if #[cfg(target_os = "linux")] {
            Arc::new(ProcfsSource::default())
        } else {
            Arc::new(SysinfoSource::new())
        }
    }
}

/// A process that matched a [`ProcessCache`]'s target.
///
/// The executable path and command line are looked up the first time they are
/// asked for and then kept for the life of the handle, as neither changes after
/// the process starts.
#[derive(Debug)]
pub struct ProcessHandle {
    pid: Pid,
    name: String,
    exe: OnceLock<String>,
    cmdline: OnceLock<String>,
    source: Arc<dyn ProcessSource>,
}

impl ProcessHandle {
    pub(crate) fn new(pid: Pid, name: String, source: Arc<dyn ProcessSource>) -> Self {
        Self {
            pid,
            name,
            exe: OnceLock::new(),
            cmdline: OnceLock::new(),
            source,
        }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// The name this process was matched by.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The path to the executable.
    pub fn exe(&self) -> CollectionResult<&str> {
        if let Some(exe) = self.exe.get() {
            return Ok(exe);
        }

        let exe = self
            .source
            .exe(self.pid)
            .map_err(|err| self.lookup_error(err, "executable path"))?;

        // Two threads racing here both resolve the same value, so whichever one
        // wins is fine.
        Ok(self.exe.get_or_init(|| exe.to_string_lossy().into_owned()))
    }

    /// The full command line, with arguments separated by spaces.
    pub fn cmdline(&self) -> CollectionResult<&str> {
        if let Some(cmdline) = self.cmdline.get() {
            return Ok(cmdline);
        }

        let args = self
            .source
            .cmdline(self.pid)
            .map_err(|err| self.lookup_error(err, "command line"))?;

        Ok(self.cmdline.get_or_init(|| args.join(" ")))
    }

    fn lookup_error(&self, err: io::Error, what: &str) -> CollectionError {
        if err.kind() == io::ErrorKind::NotFound {
            CollectionError::ProcessNotFound { pid: self.pid }
        } else {
            CollectionError::General(
                anyhow::Error::new(err)
                    .context(format!("failed to read the {what} of PID {}", self.pid)),
            )
        }
    }
}

/// Matched processes in the order they were found.
pub type ProcessSet = IndexMap<Pid, Arc<ProcessHandle>>;

#[derive(Debug, Clone)]
pub struct ProcessCacheOptions {
    /// Rescan on every call instead of reusing the last result.
    pub disable_pid_caching: bool,

    /// How long a sync is considered recent. This is only reported in the logs;
    /// a populated cache is reused regardless.
    pub sync_interval: Duration,
}

impl Default for ProcessCacheOptions {
    fn default() -> Self {
        Self {
            disable_pid_caching: false,
            sync_interval: DEFAULT_SYNC_INTERVAL,
        }
    }
}

#[derive(Debug, Default)]
struct ProcessCacheState {
    processes: ProcessSet,
    last_sync: Option<Instant>,
}

/// Finds the processes belonging to a program, reusing previous results where
/// it can.
///
/// Calls are serialized: if one caller is scanning, the others wait for it and
/// then see what it found.
#[derive(Debug)]
pub struct ProcessCache {
    name: String,
    options: ProcessCacheOptions,
    source: Arc<dyn ProcessSource>,
    state: Mutex<ProcessCacheState>,
}

impl ProcessCache {
    /// Creates a cache for processes called `name`, read from this platform's
    /// default source.
    pub fn new(name: impl Into<String>, options: ProcessCacheOptions) -> Self {
        Self::with_source(name, options, default_source())
    }

    pub fn with_source(
        name: impl Into<String>, options: ProcessCacheOptions, source: Arc<dyn ProcessSource>,
    ) -> Self {
        Self {
            name: name.into(),
            options,
            source,
            state: Mutex::new(ProcessCacheState::default()),
        }
    }

    /// The name being searched for.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the matching processes.
    pub fn get(&self) -> CollectionResult<ProcessSet> {
        self.get_with_deadline(None)
    }

    /// Returns the matching processes, giving up on enumeration once `deadline`
    /// has passed.
    pub fn get_with_deadline(&self, deadline: Option<Instant>) -> CollectionResult<ProcessSet> {
        // Nothing in here can leave the state half-updated, so a poisoned lock is
        // still usable.
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        if !state.processes.is_empty() {
            if !self.options.disable_pid_caching {
                let now = Instant::now();
                match state.last_sync {
                    Some(last_sync) if last_sync + self.options.sync_interval < now => {
                        log::debug!(
                            "Have {} cached processes, but sync interval elapsed: {:?}",
                            state.processes.len(),
                            now.duration_since(last_sync),
                        );
                    }
                    _ => {
                        log::debug!(
                            "Returning {} cached processes, last sync: {:?}",
                            state.processes.len(),
                            state.last_sync,
                        );
                    }
                }

                return Ok(state.processes.clone());
            }

            log::debug!(
                "Have {} cached processes, but pid caching is disabled, performing a sync",
                state.processes.len()
            );
        } else {
            log::debug!("No cached processes found for {}, performing a sync", self.name);
        }

        let source = &self.source;
        state.processes.retain(|pid, _| source.exists(*pid));

        let pids = source.pids(deadline).map_err(|err| match err {
            CollectionError::DeadlineExceeded => CollectionError::DeadlineExceeded,
            err => CollectionError::General(anyhow!(err).context("failed to get processes")),
        })?;

        let mut processes = ProcessSet::default();
        for pid in pids {
            match self.is_match(pid) {
                Ok(true) => {
                    log::debug!("Found process {} with PID {pid}", self.name);
                    processes.insert(
                        pid,
                        Arc::new(ProcessHandle::new(pid, self.name.clone(), source.clone())),
                    );
                }
                Ok(false) => {}
                Err(err) => {
                    log::debug!("Failed to read details for PID {pid}: {err}");
                }
            }
        }

        log::debug!(
            "Synced processes for {}, found {} processes",
            self.name,
            processes.len()
        );

        state.processes = processes;
        state.last_sync = Some(Instant::now());

        Ok(state.processes.clone())
    }

    /// Checks a process against the target name.
    fn is_match(&self, pid: Pid) -> io::Result<bool> {
        if self.name.len() <= MAX_STAT_NAME_LEN {
            return Ok(self.source.name(pid)? == self.name);
        }

        let args = self.source.cmdline(pid)?;
        let Some(command) = args.first().filter(|command| !command.is_empty()) else {
            return Ok(false);
        };

        let base_name = Path::new(command).file_name();
        Ok(base_name.is_some_and(|base| base == self.name.as_str()) || *command == self.name)
    }
}
