//! Wireless link status, read through whichever tool the host has.
//!
//! In order of preference this uses `iw`, then `nmcli`, and finally
//! `/proc/net/wireless`. All of them are normalized into a [`NetworkStatus`].

pub mod iw;
pub mod nmcli;
pub mod proc_net;

use std::{
    fmt::{self, Debug, Display},
    io,
    path::{Path, PathBuf},
    process::Command,
    str::FromStr,
    sync::Arc,
    time::Duration,
};

use serde::Deserialize;

use super::error::{CollectionError, CollectionResult};
use crate::utils::general::leading_number;

pub use self::{iw::IwBackend, nmcli::NmcliBackend, proc_net::ProcNetBackend};

/// Where the kernel lists wireless interfaces.
pub const PROC_NET_WIRELESS: &str = "/proc/net/wireless";

/// The state of a wireless link.
///
/// Fields a backend can't supply are left at zero. A field that was present but
/// failed to parse is set to `-1`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkStatus {
    pub network_name: String,

    /// Signal strength in dBm.
    pub signal_strength: i32,

    pub frequency_mhz: i32,
    pub tx_speed_mbps: f64,
    pub rx_speed_mbps: f64,
    pub tx_retries: i64,
    pub tx_failed: i64,

    /// Average beacon signal in dBm.
    pub beacon_signal_avg: i32,

    pub connected_time: Duration,
    pub inactive_time: Duration,
}

/// Every field-level problem hit while parsing one backend's output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(Vec<String>);

impl FieldErrors {
    pub fn push(&mut self, error: impl Into<String>) {
        self.0.push(error.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Returns the status as-is if nothing went wrong, otherwise wraps it in
    /// [`WifiError::Parse`].
    pub(crate) fn into_result(self, status: NetworkStatus) -> WifiResult<NetworkStatus> {
        if self.is_empty() {
            Ok(status)
        } else {
            Err(WifiError::Parse {
                partial: Box::new(status),
                errors: self,
            })
        }
    }
}

impl Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("\n"))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WifiError {
    #[error("wireless adapter not found")]
    AdapterNotFound,

    #[error("wireless adapter is not connected")]
    NotConnected,

    /// Some fields could not be parsed. Whatever was read is kept in `partial`.
    #[error("failed to parse wireless status:\n{errors}")]
    Parse {
        partial: Box<NetworkStatus>,
        errors: FieldErrors,
    },

    #[error("{context}")]
    Command {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl WifiError {
    pub(crate) fn command(context: impl Into<String>, source: io::Error) -> Self {
        WifiError::Command {
            context: context.into(),
            source,
        }
    }
}

pub type WifiResult<T> = Result<T, WifiError>;

/// Something that can report the status of one adapter.
pub trait WifiBackend: Debug + Send + Sync {
    fn kind(&self) -> BackendKind;

    fn get_status(&self) -> WifiResult<NetworkStatus>;
}

/// The result of running a command to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// The exit code, or `None` if the command was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs external programs.
pub trait CommandRunner: Debug + Send + Sync {
    fn run(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput>;
}

/// Runs commands on the host.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCommands;

impl CommandRunner for SystemCommands {
    fn run(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput> {
        let output = Command::new(program).args(args).output()?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Answers what tools and files exist on the host.
pub trait SystemProbe {
    /// Whether `program` can be found on `PATH`.
    fn has_program(&self, program: &str) -> bool;

    fn path_exists(&self, path: &Path) -> bool;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct HostProbe;

impl SystemProbe for HostProbe {
    fn has_program(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }

    fn path_exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// The available backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Iw,
    Nmcli,
    #[serde(alias = "proc_net")]
    Proc,
}

impl BackendKind {
    pub const ALL: [BackendKind; 3] = [BackendKind::Iw, BackendKind::Nmcli, BackendKind::Proc];

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Iw => "iw",
            BackendKind::Nmcli => "nmcli",
            BackendKind::Proc => "proc",
        }
    }

    /// How this backend is described in the logs.
    fn source_description(&self) -> &'static str {
        match self {
            BackendKind::Iw => "iw",
            BackendKind::Nmcli => "nmcli",
            BackendKind::Proc => PROC_NET_WIRELESS,
        }
    }

    fn is_available(&self, probe: &dyn SystemProbe) -> bool {
        match self {
            BackendKind::Iw => probe.has_program("iw"),
            BackendKind::Nmcli => probe.has_program("nmcli"),
            BackendKind::Proc => probe.path_exists(Path::new(PROC_NET_WIRELESS)),
        }
    }
}

impl Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "iw" => Ok(BackendKind::Iw),
            "nmcli" => Ok(BackendKind::Nmcli),
            "proc" | "proc_net" => Ok(BackendKind::Proc),
            _ => Err(format!("'{s}' is not a wireless backend")),
        }
    }
}

/// Reports the status of one wireless adapter through a backend picked once,
/// up front.
#[derive(Debug)]
pub struct LinkStatusProvider {
    adapter: String,
    backend: Box<dyn WifiBackend>,
}

impl LinkStatusProvider {
    /// Picks the best backend available on this host.
    pub fn new(adapter: impl Into<String>) -> CollectionResult<Self> {
        Self::with_system(adapter, None, Arc::new(SystemCommands), &HostProbe)
    }

    /// Picks a backend using the given probe, running commands with `runner`.
    /// If `preferred` is set, only that backend is considered.
    pub fn with_system(
        adapter: impl Into<String>, preferred: Option<BackendKind>, runner: Arc<dyn CommandRunner>,
        probe: &dyn SystemProbe,
    ) -> CollectionResult<Self> {
        let adapter = adapter.into();

        let kind = match preferred {
            Some(kind) if kind.is_available(probe) => kind,
            Some(kind) => {
                log::warn!("Wireless backend {kind} was requested but is not available");
                return Err(CollectionError::Unsupported);
            }
            None => BackendKind::ALL
                .into_iter()
                .find(|kind| kind.is_available(probe))
                .ok_or(CollectionError::Unsupported)?,
        };

        log::info!("Using {} for wifi stats", kind.source_description());

        let backend: Box<dyn WifiBackend> = match kind {
            BackendKind::Iw => Box::new(IwBackend::new(adapter.clone(), runner)),
            BackendKind::Nmcli => Box::new(NmcliBackend::new(adapter.clone(), runner)),
            BackendKind::Proc => Box::new(ProcNetBackend::new(
                adapter.clone(),
                PathBuf::from(PROC_NET_WIRELESS),
            )),
        };

        Ok(Self { adapter, backend })
    }

    /// Uses an already-built backend.
    pub fn with_backend(adapter: impl Into<String>, backend: Box<dyn WifiBackend>) -> Self {
        Self {
            adapter: adapter.into(),
            backend,
        }
    }

    pub fn adapter(&self) -> &str {
        &self.adapter
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    pub fn get_status(&self) -> WifiResult<NetworkStatus> {
        self.backend.get_status()
    }
}

/// Parses a bitrate like `866.7 MBit/s VHT-MCS 9` into Mbps.
pub(crate) fn parse_rate(value: &str) -> Result<f64, String> {
    let (rate, unit) =
        leading_number(value).map_err(|err| format!("invalid bitrate {value:?}: {err}"))?;

    let scale = match unit.map(str::to_ascii_lowercase).as_deref() {
        Some("kbit/s" | "kb/s") => 1e-3,
        Some("gbit/s" | "gb/s") => 1e3,
        _ => 1.0,
    };

    Ok(rate * scale)
}

/// Parses a whole number that may carry a unit suffix, like `-42 dBm`.
pub(crate) fn parse_int<T: FromStr>(field: &str, value: &str, suffix: &str) -> Result<T, String>
where
    T::Err: Display,
{
    let value = value.trim();
    value
        .strip_suffix(suffix)
        .unwrap_or(value)
        .trim()
        .parse()
        .map_err(|err| format!("invalid {field} {value:?}: {err}"))
}

#[cfg(test)]
mod test {
    use std::sync::Mutex;

    use hashbrown::{HashMap, HashSet};

    use super::*;

    /// Replays canned command output.
    #[derive(Debug, Default)]
    pub(crate) struct FakeCommands {
        outputs: HashMap<String, io::Result<CommandOutput>>,
        pub(crate) calls: Mutex<Vec<String>>,
    }

    impl FakeCommands {
        pub(crate) fn with_output(mut self, command: &str, code: i32, stdout: &str) -> Self {
            self.outputs.insert(
                command.to_string(),
                Ok(CommandOutput {
                    code: Some(code),
                    stdout: stdout.to_string(),
                    stderr: String::new(),
                }),
            );
            self
        }

        /// A command that wrote nothing to stdout and `stderr` to stderr.
        pub(crate) fn with_failure(mut self, command: &str, code: i32, stderr: &str) -> Self {
            self.outputs.insert(
                command.to_string(),
                Ok(CommandOutput {
                    code: Some(code),
                    stdout: String::new(),
                    stderr: stderr.to_string(),
                }),
            );
            self
        }

        pub(crate) fn with_error(mut self, command: &str, kind: io::ErrorKind) -> Self {
            self.outputs
                .insert(command.to_string(), Err(io::Error::from(kind)));
            self
        }
    }

    impl CommandRunner for FakeCommands {
        fn run(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput> {
            let command = std::iter::once(program)
                .chain(args.iter().copied())
                .collect::<Vec<_>>()
                .join(" ");
            self.calls.lock().unwrap().push(command.clone());

            match self.outputs.get(&command) {
                Some(Ok(output)) => Ok(output.clone()),
                Some(Err(err)) => Err(io::Error::from(err.kind())),
                None => Err(io::Error::from(io::ErrorKind::NotFound)),
            }
        }
    }

    #[derive(Debug, Default)]
    struct FakeProbe {
        programs: HashSet<&'static str>,
        paths: HashSet<PathBuf>,
    }

    impl FakeProbe {
        fn new(programs: &[&'static str], proc_net: bool) -> Self {
            let mut paths = HashSet::new();
            if proc_net {
                paths.insert(PathBuf::from(PROC_NET_WIRELESS));
            }

            Self {
                programs: programs.iter().copied().collect(),
                paths,
            }
        }
    }

    impl SystemProbe for FakeProbe {
        fn has_program(&self, program: &str) -> bool {
            self.programs.contains(program)
        }

        fn path_exists(&self, path: &Path) -> bool {
            self.paths.contains(path)
        }
    }

    fn select(probe: &FakeProbe, preferred: Option<BackendKind>) -> CollectionResult<BackendKind> {
        LinkStatusProvider::with_system("wlan0", preferred, Arc::new(FakeCommands::default()), probe)
            .map(|provider| provider.backend_kind())
    }

    #[test]
    fn backend_priority() {
        assert_eq!(
            select(&FakeProbe::new(&["iw", "nmcli"], true), None).unwrap(),
            BackendKind::Iw
        );
        assert_eq!(
            select(&FakeProbe::new(&["nmcli"], true), None).unwrap(),
            BackendKind::Nmcli
        );
        assert_eq!(
            select(&FakeProbe::new(&[], true), None).unwrap(),
            BackendKind::Proc
        );
        assert!(matches!(
            select(&FakeProbe::new(&[], false), None),
            Err(CollectionError::Unsupported)
        ));
    }

    #[test]
    fn preferred_backend() {
        let probe = FakeProbe::new(&["iw", "nmcli"], true);
        assert_eq!(
            select(&probe, Some(BackendKind::Proc)).unwrap(),
            BackendKind::Proc
        );

        let probe = FakeProbe::new(&["iw"], false);
        assert!(matches!(
            select(&probe, Some(BackendKind::Nmcli)),
            Err(CollectionError::Unsupported)
        ));
    }

    #[test]
    fn provider_uses_selected_backend() {
        let commands = Arc::new(FakeCommands::default().with_output(
            "nmcli -t -f ACTIVE,NAME,SSID,CHAN,FREQ,RATE,SIGNAL,DEVICE dev wifi",
            0,
            "yes:home:home:36:5180 MHz:405 Mbit/s:61:wlan0\n",
        ));
        let provider = LinkStatusProvider::with_system(
            "wlan0",
            None,
            commands.clone(),
            &FakeProbe::new(&["nmcli"], false),
        )
        .unwrap();

        // Picking a backend doesn't run anything.
        assert!(commands.calls.lock().unwrap().is_empty());

        assert_eq!(provider.adapter(), "wlan0");
        assert_eq!(provider.backend_kind(), BackendKind::Nmcli);

        let status = provider.get_status().unwrap();
        assert_eq!(status.network_name, "home");
        assert_eq!(status.signal_strength, -61);
        assert_eq!(status.frequency_mhz, 5180);
        assert_eq!(status.tx_speed_mbps, 405.0);
        assert_eq!(commands.calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn backend_kind_from_str() {
        assert_eq!("iw".parse::<BackendKind>().unwrap(), BackendKind::Iw);
        assert_eq!("NMCLI".parse::<BackendKind>().unwrap(), BackendKind::Nmcli);
        assert_eq!("proc_net".parse::<BackendKind>().unwrap(), BackendKind::Proc);
        assert_eq!(
            "wext".parse::<BackendKind>().unwrap_err(),
            "'wext' is not a wireless backend"
        );

        for kind in BackendKind::ALL {
            assert_eq!(kind.as_str().parse::<BackendKind>().unwrap(), kind);
        }
    }

    #[test]
    fn rates() {
        assert_eq!(parse_rate(" 866.7 MBit/s VHT-MCS 9 80MHz short GI").unwrap(), 866.7);
        assert_eq!(parse_rate("405 Mbit/s").unwrap(), 405.0);
        assert_eq!(parse_rate("54").unwrap(), 54.0);
        assert!((parse_rate("1.2 GBit/s").unwrap() - 1200.0).abs() < 1e-9);
        assert!((parse_rate("500 kBit/s").unwrap() - 0.5).abs() < 1e-12);
        assert!(parse_rate("fast").is_err());
        assert!(parse_rate("").is_err());
    }

    #[test]
    fn ints() {
        assert_eq!(parse_int::<i32>("signal", " -42 dBm", " dBm").unwrap(), -42);
        assert_eq!(parse_int::<i64>("tx retries", "17", "").unwrap(), 17);
        assert_eq!(
            parse_int::<i32>("signal", "weak dBm", " dBm").unwrap_err(),
            "invalid signal \"weak dBm\": invalid digit found in string"
        );
    }

    #[test]
    fn field_errors_display() {
        let mut errors = FieldErrors::default();
        errors.push("invalid signal \"x\"");
        errors.push("invalid bitrate \"y\"");

        assert_eq!(
            errors.to_string(),
            "invalid signal \"x\"\ninvalid bitrate \"y\""
        );
        assert_eq!(errors.iter().count(), 2);

        let err = errors
            .into_result(NetworkStatus {
                network_name: "home".into(),
                signal_strength: -1,
                ..Default::default()
            })
            .unwrap_err();
        match err {
            WifiError::Parse { partial, errors } => {
                assert_eq!(partial.network_name, "home");
                assert_eq!(partial.signal_strength, -1);
                assert!(!errors.is_empty());
            }
            err => panic!("unexpected error: {err}"),
        }

        assert!(FieldErrors::default()
            .into_result(NetworkStatus::default())
            .is_ok());
    }
}
