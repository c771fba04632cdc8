//! Process lookups backed by sysinfo, used where there is no procfs to read.

use std::{
    io,
    path::PathBuf,
    sync::{Mutex, MutexGuard, PoisonError},
    time::Instant,
};

use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System, UpdateKind};

use super::{Pid, ProcessSource};
use crate::collection::error::{CollectionError, CollectionResult};

#[derive(Debug, Default)]
pub struct SysinfoSource {
    system: Mutex<System>,
}

impl SysinfoSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn system(&self) -> MutexGuard<'_, System> {
        self.system.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Refreshes a single process and runs `f` on it, or fails with
    /// [`io::ErrorKind::NotFound`] if it is gone.
    fn with_process<T>(
        &self, pid: Pid, refresh_kind: ProcessRefreshKind, f: impl FnOnce(&sysinfo::Process) -> T,
    ) -> io::Result<T> {
        let pid = to_sysinfo_pid(pid);
        let mut system = self.system();
        system.refresh_processes_specifics(ProcessesToUpdate::Some(&[pid]), true, refresh_kind);

        system
            .process(pid)
            .map(f)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("no process with PID {pid}")))
    }
}

fn to_sysinfo_pid(pid: Pid) -> sysinfo::Pid {
    sysinfo::Pid::from(pid as usize)
}

impl ProcessSource for SysinfoSource {
    fn pids(&self, deadline: Option<Instant>) -> CollectionResult<Vec<Pid>> {
        let mut system = self.system();
        system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing(),
        );

        // sysinfo can't be interrupted partway, so this is only checked after.
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(CollectionError::DeadlineExceeded);
        }

        Ok(system
            .processes()
            .keys()
            .map(|pid| pid.as_u32() as Pid)
            .collect())
    }

    fn exists(&self, pid: Pid) -> bool {
        self.with_process(pid, ProcessRefreshKind::nothing(), |_| ())
            .is_ok()
    }

    fn name(&self, pid: Pid) -> io::Result<String> {
        self.with_process(pid, ProcessRefreshKind::nothing(), |process| {
            process.name().to_string_lossy().into_owned()
        })
    }

    fn cmdline(&self, pid: Pid) -> io::Result<Vec<String>> {
        self.with_process(
            pid,
            ProcessRefreshKind::nothing().with_cmd(UpdateKind::OnlyIfNotSet),
            |process| {
                process
                    .cmd()
                    .iter()
                    .map(|arg| arg.to_string_lossy().into_owned())
                    .collect()
            },
        )
    }

    fn exe(&self, pid: Pid) -> io::Result<PathBuf> {
        self.with_process(
            pid,
            ProcessRefreshKind::nothing().with_exe(UpdateKind::OnlyIfNotSet),
            |process| process.exe().map(|exe| exe.to_path_buf()),
        )?
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("executable path of PID {pid} is not available"),
            )
        })
    }
}
