//! Link status from `/proc/net/wireless`. This only has basic stats, and no
//! network name.

use std::{fs, path::PathBuf};

use super::{BackendKind, FieldErrors, NetworkStatus, WifiBackend, WifiError, WifiResult};

const UNKNOWN_NETWORK: &str = "unknown";

#[derive(Debug)]
pub struct ProcNetBackend {
    adapter: String,
    path: PathBuf,
}

impl ProcNetBackend {
    pub fn new(adapter: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            adapter: adapter.into(),
            path: path.into(),
        }
    }
}

impl WifiBackend for ProcNetBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Proc
    }

    fn get_status(&self) -> WifiResult<NetworkStatus> {
        let contents = fs::read_to_string(&self.path).map_err(|err| {
            WifiError::command(format!("failed to read {}", self.path.display()), err)
        })?;

        parse_proc_net_wireless(&contents, &self.adapter)
    }
}

/// Parses `/proc/net/wireless`, which looks like:
///
/// ```text
/// Inter-| sta-|   Quality        |   Discarded packets               | Missed | WE
///  face | tus | link level noise |  nwid  crypt   frag  retry   misc | beacon | 22
///  wlan0: 0000   70.  -40.  -256        0      0      0      0     12        0
/// ```
pub(crate) fn parse_proc_net_wireless(out: &str, adapter: &str) -> WifiResult<NetworkStatus> {
    let row = out.lines().find_map(|line| {
        let columns = line.split_whitespace().collect::<Vec<_>>();
        let device = columns.first()?.strip_suffix(':')?;

        (device == adapter).then_some(columns)
    });
    let Some(columns) = row else {
        return Err(WifiError::AdapterNotFound);
    };

    let mut errors = FieldErrors::default();
    let column = |index: usize| columns.get(index).copied().unwrap_or_default();

    let signal_strength = column(3)
        .trim_end_matches('.')
        .parse::<i32>()
        .unwrap_or_else(|err| {
            errors.push(format!("invalid signal level {:?}: {err}", column(3)));
            -1
        });

    let tx_speed_mbps = column(2).parse::<f64>().unwrap_or_else(|err| {
        errors.push(format!("invalid link quality {:?}: {err}", column(2)));
        -1.0
    });

    errors.into_result(NetworkStatus {
        network_name: UNKNOWN_NETWORK.to_string(),
        signal_strength,
        tx_speed_mbps,
        ..Default::default()
    })
}
