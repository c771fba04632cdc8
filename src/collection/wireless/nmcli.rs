//! Link status from NetworkManager's `nmcli`.

use std::sync::Arc;

use super::{
    parse_int, parse_rate, BackendKind, CommandRunner, FieldErrors, NetworkStatus, WifiBackend,
    WifiError, WifiResult,
};
use crate::utils::general::leading_number;

const FIELDS: &str = "ACTIVE,NAME,SSID,CHAN,FREQ,RATE,SIGNAL,DEVICE";

// Column positions within FIELDS.
const SSID: usize = 2;
const FREQ: usize = 4;
const RATE: usize = 5;
const SIGNAL: usize = 6;

#[derive(Debug)]
pub struct NmcliBackend {
    adapter: String,
    runner: Arc<dyn CommandRunner>,
}

impl NmcliBackend {
    pub fn new(adapter: impl Into<String>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            adapter: adapter.into(),
            runner,
        }
    }
}

impl WifiBackend for NmcliBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Nmcli
    }

    fn get_status(&self) -> WifiResult<NetworkStatus> {
        let output = self
            .runner
            .run("nmcli", &["-t", "-f", FIELDS, "dev", "wifi"])
            .map_err(|err| WifiError::command("failed to run nmcli", err))?;

        if !output.success() {
            return Err(WifiError::command(
                format!("nmcli exited with {:?}", output.code),
                std::io::Error::other(output.stderr.trim().to_string()),
            ));
        }

        parse_dev_wifi(&output.stdout, &self.adapter)
    }
}

/// Splits a line of `nmcli -t` output, where a literal `:` is written as `\:`
/// and a literal `\` as `\\`.
pub(crate) fn split_terse(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            }
            ':' => fields.push(std::mem::take(&mut current)),
            c => current.push(c),
        }
    }
    fields.push(current);

    fields
}

/// Parses `nmcli -t -f ACTIVE,NAME,SSID,CHAN,FREQ,RATE,SIGNAL,DEVICE dev wifi`
/// for the given adapter.
pub(crate) fn parse_dev_wifi(out: &str, adapter: &str) -> WifiResult<NetworkStatus> {
    // Every row ends with "".
    if adapter.is_empty() {
        return Err(WifiError::AdapterNotFound);
    }

    let mut adapter_found = false;

    for line in out.lines() {
        if !line.ends_with(adapter) {
            continue;
        }
        adapter_found = true;

        if line.starts_with("yes:") {
            return parse_active_row(&split_terse(line));
        }
    }

    if adapter_found {
        Err(WifiError::NotConnected)
    } else {
        Err(WifiError::AdapterNotFound)
    }
}

fn parse_active_row(fields: &[String]) -> WifiResult<NetworkStatus> {
    let mut errors = FieldErrors::default();
    let field = |index: usize| fields.get(index).map(String::as_str).unwrap_or_default();

    let signal_strength = match parse_int::<i32>("signal", field(SIGNAL), "") {
        Ok(signal) => -signal,
        Err(err) => {
            errors.push(err);
            -1
        }
    };

    let tx_speed_mbps = parse_rate(field(RATE)).unwrap_or_else(|err| {
        errors.push(err);
        -1.0
    });

    let frequency_mhz = match leading_number(field(FREQ)) {
        Ok((freq, _)) => freq as i32,
        Err(err) => {
            errors.push(format!("invalid freq {:?}: {err}", field(FREQ)));
            -1
        }
    };

    let status = NetworkStatus {
        network_name: field(SSID).to_string(),
        signal_strength,
        frequency_mhz,
        tx_speed_mbps,
        ..Default::default()
    };

    errors.into_result(status)
}

#[cfg(test)]
mod test {
    use std::io;

    use super::*;
    use crate::collection::wireless::test::FakeCommands;

    const DEV_WIFI: &str = "\
no:AP[1]:Neighbours:1:2412 MHz:130 Mbit/s:42:wlan0
yes:AP[2]:home-net:36:5180 MHz:405 Mbit/s:61:wlan0
no:AP[1]:cafe\\:guest:6:2437 MHz:54 Mbit/s:30:wlan1
";

    #[test]
    fn splits_terse_fields() {
        assert_eq!(split_terse("yes:a:b"), vec!["yes", "a", "b"]);
        assert_eq!(split_terse("cafe\\:guest:x"), vec!["cafe:guest", "x"]);
        assert_eq!(split_terse("back\\\\slash:"), vec!["back\\slash", ""]);
        assert_eq!(split_terse(""), vec![""]);
    }

    #[test]
    fn parses_active_row() {
        let status = parse_dev_wifi(DEV_WIFI, "wlan0").unwrap();

        assert_eq!(
            status,
            NetworkStatus {
                network_name: "home-net".into(),
                signal_strength: -61,
                frequency_mhz: 5180,
                tx_speed_mbps: 405.0,
                ..Default::default()
            }
        );
    }

    #[test]
    fn escaped_network_name() {
        let out = "yes:AP[1]:cafe\\:guest:6:2437 MHz:54 Mbit/s:30:wlan1\n";
        let status = parse_dev_wifi(out, "wlan1").unwrap();

        assert_eq!(status.network_name, "cafe:guest");
        assert_eq!(status.signal_strength, -30);
    }

    #[test]
    fn adapter_without_active_row() {
        assert!(matches!(
            parse_dev_wifi(DEV_WIFI, "wlan1"),
            Err(WifiError::NotConnected)
        ));
        assert!(matches!(
            parse_dev_wifi(DEV_WIFI, "wlan2"),
            Err(WifiError::AdapterNotFound)
        ));
        assert!(matches!(parse_dev_wifi("", "wlan0"), Err(WifiError::AdapterNotFound)));
    }

    #[test]
    fn empty_adapter_matches_nothing() {
        let out = "yes:AP[1]:neighbour:6:2437 MHz:54 Mbit/s:30:wlan1\n";
        assert!(matches!(parse_dev_wifi(out, ""), Err(WifiError::AdapterNotFound)));
    }

    #[test]
    fn bad_fields() {
        let out = "yes:AP[1]:home-net:36:--:fast:??:wlan0\n";

        match parse_dev_wifi(out, "wlan0") {
            Err(WifiError::Parse { partial, errors }) => {
                assert_eq!(partial.network_name, "home-net");
                assert_eq!(partial.signal_strength, -1);
                assert_eq!(partial.tx_speed_mbps, -1.0);
                assert_eq!(partial.frequency_mhz, -1);
                assert_eq!(errors.iter().count(), 3);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn runs_nmcli() {
        let backend = NmcliBackend::new(
            "wlan0",
            Arc::new(FakeCommands::default().with_output(
                "nmcli -t -f ACTIVE,NAME,SSID,CHAN,FREQ,RATE,SIGNAL,DEVICE dev wifi",
                0,
                DEV_WIFI,
            )),
        );
        assert_eq!(backend.get_status().unwrap().network_name, "home-net");

        let backend = NmcliBackend::new(
            "wlan0",
            Arc::new(FakeCommands::default().with_error(
                "nmcli -t -f ACTIVE,NAME,SSID,CHAN,FREQ,RATE,SIGNAL,DEVICE dev wifi",
                io::ErrorKind::NotFound,
            )),
        );
        assert!(matches!(backend.get_status(), Err(WifiError::Command { .. })));
    }
}
