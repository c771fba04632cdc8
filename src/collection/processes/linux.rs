//! Linux process code for reading process data via `/proc/`.

use std::{
    fs::{self, File},
    io::{self, Read},
    path::{Path, PathBuf},
    time::Instant,
};

use anyhow::Context;
use rustix::{
    fd::OwnedFd,
    fs::{Mode, OFlags},
};

use super::{Pid, ProcessSource};
use crate::collection::error::{CollectionError, CollectionResult};

fn is_str_numeric(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

/// Reads processes out of a procfs mount, usually `/proc`.
#[derive(Debug, Clone)]
pub struct ProcfsSource {
    root: PathBuf,
}

impl Default for ProcfsSource {
    fn default() -> Self {
        Self::new("/proc")
    }
}

impl ProcfsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Opens `/proc/<PID>` so the files inside are all read from the same
    /// process, even if the PID gets reused halfway through.
    fn open_pid_dir(&self, pid: Pid) -> io::Result<OwnedFd> {
        let path = self.root.join(pid.to_string());
        let fd = rustix::fs::openat(
            rustix::fs::CWD,
            path.as_path(),
            OFlags::PATH | OFlags::DIRECTORY | OFlags::CLOEXEC,
            Mode::empty(),
        )?;

        Ok(fd)
    }

    fn read_file(&self, pid: Pid, child: &str) -> io::Result<Vec<u8>> {
        let dir = self.open_pid_dir(pid)?;
        let fd = rustix::fs::openat(&dir, child, OFlags::RDONLY | OFlags::CLOEXEC, Mode::empty())?;

        let mut buffer = Vec::new();
        File::from(fd).read_to_end(&mut buffer)?;

        Ok(buffer)
    }
}

impl ProcessSource for ProcfsSource {
    fn pids(&self, deadline: Option<Instant>) -> CollectionResult<Vec<Pid>> {
        let entries = fs::read_dir(&self.root)
            .with_context(|| format!("failed to read {}", self.root.display()))?;

        // Note this will only return PIDs of _processes_, not threads.
        let mut pids = Vec::new();
        for entry in entries.flatten() {
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                return Err(CollectionError::DeadlineExceeded);
            }

            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            if is_str_numeric(&file_name) {
                if let Ok(pid) = file_name.parse::<Pid>() {
                    pids.push(pid);
                }
            }
        }

        Ok(pids)
    }

    fn exists(&self, pid: Pid) -> bool {
        self.open_pid_dir(pid).is_ok()
    }

    fn name(&self, pid: Pid) -> io::Result<String> {
        let comm = self.read_file(pid, "comm")?;
        let comm = String::from_utf8_lossy(&comm);

        Ok(comm.strip_suffix('\n').unwrap_or(&comm).to_string())
    }

    fn cmdline(&self, pid: Pid) -> io::Result<Vec<String>> {
        let cmdline = self.read_file(pid, "cmdline")?;
        let cmdline = String::from_utf8_lossy(&cmdline);
        let cmdline = cmdline.trim_end_matches('\0');

        if cmdline.is_empty() {
            // Kernel threads and zombies have no command line.
            Ok(Vec::new())
        } else {
            Ok(cmdline.split('\0').map(str::to_string).collect())
        }
    }

    fn exe(&self, pid: Pid) -> io::Result<PathBuf> {
        let dir = self.open_pid_dir(pid)?;
        let target = rustix::fs::readlinkat(&dir, "exe", Vec::new())?;

        Ok(Path::new(&*target.to_string_lossy()).to_path_buf())
    }
}
