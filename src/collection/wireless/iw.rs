//! Link status from `iw`, which has the most detailed stats.

use std::{io, sync::Arc, time::Duration};

use super::{
    parse_int, parse_rate, BackendKind, CommandRunner, FieldErrors, NetworkStatus, WifiBackend,
    WifiError, WifiResult,
};
use crate::utils::general::leading_number;

/// `iw` exits with `-ENODEV` when the adapter does not exist.
const EXIT_NO_DEVICE: i32 = 237;

#[derive(Debug)]
pub struct IwBackend {
    adapter: String,
    runner: Arc<dyn CommandRunner>,
}

impl IwBackend {
    pub fn new(adapter: impl Into<String>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            adapter: adapter.into(),
            runner,
        }
    }

    /// Adds the optional counters from `iw dev <adapter> station dump`. Any
    /// failure here is ignored.
    fn enrich(&self, status: &mut NetworkStatus) {
        match self
            .runner
            .run("iw", &["dev", &self.adapter, "station", "dump"])
        {
            Ok(output) if output.success() => parse_station_dump(&output.stdout, status),
            Ok(output) => {
                log::debug!("iw station dump exited with {:?}", output.code);
            }
            Err(err) => {
                log::debug!("Failed to run iw station dump: {err}");
            }
        }
    }
}

impl WifiBackend for IwBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Iw
    }

    fn get_status(&self) -> WifiResult<NetworkStatus> {
        let output = self
            .runner
            .run("iw", &["dev", &self.adapter, "link"])
            .map_err(|err| WifiError::command("failed to run iw", err))?;

        if output.code == Some(EXIT_NO_DEVICE) || output.stderr.contains("No such device") {
            return Err(WifiError::AdapterNotFound);
        } else if !output.success() {
            return Err(WifiError::command(
                format!("iw exited with {:?}", output.code),
                io::Error::other(output.stderr.trim().to_string()),
            ));
        }

        let (mut status, errors) = parse_link(&output.stdout)?;
        self.enrich(&mut status);

        errors.into_result(status)
    }
}

/// Parses `iw dev <adapter> link`.
pub(crate) fn parse_link(out: &str) -> WifiResult<(NetworkStatus, FieldErrors)> {
    if out.contains("Not connected") {
        return Err(WifiError::NotConnected);
    }
    if out.contains("No such device") {
        return Err(WifiError::AdapterNotFound);
    }

    let mut status = NetworkStatus::default();
    let mut errors = FieldErrors::default();

    for line in out.lines() {
        let Some((key, value)) = line.trim().split_once(':') else {
            continue;
        };

        match key {
            "SSID" => status.network_name = value.trim().to_string(),
            "freq" => match leading_number(value) {
                Ok((freq, _)) => status.frequency_mhz = freq as i32,
                Err(err) => {
                    status.frequency_mhz = -1;
                    errors.push(format!("invalid freq {:?}: {err}", value.trim()));
                }
            },
            "signal" => {
                status.signal_strength = parse_int("signal", value, "dBm").unwrap_or_else(|err| {
                    errors.push(err);
                    -1
                });
            }
            "rx bitrate" => {
                status.rx_speed_mbps = parse_rate(value).unwrap_or_else(|err| {
                    errors.push(err);
                    -1.0
                });
            }
            "tx bitrate" => {
                status.tx_speed_mbps = parse_rate(value).unwrap_or_else(|err| {
                    errors.push(err);
                    -1.0
                });
            }
            _ => {}
        }
    }

    Ok((status, errors))
}

/// Parses `iw dev <adapter> station dump` into `status`, skipping anything
/// that doesn't parse.
pub(crate) fn parse_station_dump(out: &str, status: &mut NetworkStatus) {
    for line in out.lines() {
        let Some((key, value)) = line.trim().split_once(':') else {
            continue;
        };

        match key {
            "tx retries" => {
                if let Ok(retries) = parse_int("tx retries", value, "") {
                    status.tx_retries = retries;
                }
            }
            "tx failed" => {
                if let Ok(failed) = parse_int("tx failed", value, "") {
                    status.tx_failed = failed;
                }
            }
            "beacon signal avg" => {
                if let Ok(signal) = parse_int("beacon signal avg", value, "dBm") {
                    status.beacon_signal_avg = signal;
                }
            }
            "connected time" => {
                if let Ok(secs) = parse_int("connected time", value, "seconds") {
                    status.connected_time = Duration::from_secs(secs);
                }
            }
            "inactive time" => {
                if let Ok(ms) = parse_int("inactive time", value, "ms") {
                    status.inactive_time = Duration::from_millis(ms);
                }
            }
            _ => {}
        }
    }
}
