use std::{sync::Arc, thread, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use sbcmon::{
    collection::{
        cpu::{self, CpuDataType, CpuHarvest, CpuUsageTracker},
        processes::ProcessCache,
        wireless::{HostProbe, LinkStatusProvider, NetworkStatus, SystemCommands, WifiError},
        CollectionError, CollectionResult,
    },
    options::{self, ProcessSettings, SbcmonArgs, WirelessSettings},
};

fn main() -> Result<()> {
    let args = SbcmonArgs::parse();

    #[cfg(feature = "logging")]
    if let Some(debug_log) = args.debug_log() {
        sbcmon::utils::logging::init_logger(
            log::LevelFilter::Debug,
            std::ffi::OsStr::new(debug_log),
        )
        .context("Unable to initialize the debug logger.")?;
    }

    let config = options::get_config(&args).context("Unable to properly parse or read the config file.")?;
    let settings = options::init(&args, &config).context("Found an issue while setting up sbcmon.")?;

    match sample_cpu(settings.rate) {
        Ok(harvest) => print_cpu(&harvest, settings.per_core),
        Err(err) => println!("cpu: {err:#}"),
    }

    if let Some(process) = &settings.process {
        report_processes(process);
    }

    if let Some(wireless) = &settings.wireless {
        report_wireless(wireless);
    }

    Ok(())
}

/// Reads the counters twice, `rate` apart.
fn sample_cpu(rate: Duration) -> CollectionResult<CpuHarvest> {
    let mut tracker = CpuUsageTracker::new();
    tracker.update(cpu::read_counters()?);
    thread::sleep(rate);

    Ok(tracker.update(cpu::read_counters()?))
}

fn print_cpu(harvest: &CpuHarvest, per_core: bool) {
    match harvest.avg() {
        Some(avg) => println!("cpu: {avg:.2}%"),
        None => println!("cpu: no valid reading"),
    }

    if per_core {
        for data in harvest.iter() {
            if let CpuDataType::Cpu(index) = data.data_type {
                println!("cpu{index}: {:.2}%", data.usage);
            }
        }
    }
}

fn report_processes(settings: &ProcessSettings) {
    let cache = ProcessCache::new(settings.name.clone(), settings.cache.clone());

    let processes = match cache.get() {
        Ok(processes) => processes,
        Err(err) => {
            println!("process {}: {err:#}", settings.name);
            return;
        }
    };

    if processes.is_empty() {
        println!("process {}: not running", settings.name);
    }

    for handle in processes.values() {
        let describe = |detail: CollectionResult<&str>| match detail {
            Ok(detail) => detail.to_string(),
            Err(err) => format!("<{err}>"),
        };

        println!("process {}: pid {}", handle.name(), handle.pid());
        println!("  exe: {}", describe(handle.exe()));
        println!("  cmdline: {}", describe(handle.cmdline()));
    }
}

fn report_wireless(settings: &WirelessSettings) {
    let adapter = &settings.adapter;
    let provider = match LinkStatusProvider::with_system(
        adapter,
        settings.backend,
        Arc::new(SystemCommands),
        &HostProbe,
    ) {
        Ok(provider) => provider,
        Err(CollectionError::Unsupported) => {
            println!("wireless {adapter}: no wireless backend available");
            return;
        }
        Err(err) => {
            println!("wireless {adapter}: {err:#}");
            return;
        }
    };

    let backend = provider.backend_kind();
    match provider.get_status() {
        Ok(status) => print_status(adapter, backend, &status),
        Err(WifiError::Parse { partial, errors }) => {
            print_status(adapter, backend, &partial);
            for error in errors.iter() {
                println!("  warning: {error}");
            }
        }
        Err(err) => println!("wireless {adapter}: {err}"),
    }
}

fn print_status(adapter: &str, backend: impl std::fmt::Display, status: &NetworkStatus) {
    println!("wireless {adapter}: {} (via {backend})", status.network_name);
    println!("  signal: {} dBm", status.signal_strength);

    if status.frequency_mhz != 0 {
        println!("  frequency: {} MHz", status.frequency_mhz);
    }

    println!(
        "  bitrate: tx {:.1} Mbps, rx {:.1} Mbps",
        status.tx_speed_mbps, status.rx_speed_mbps
    );

    if !status.connected_time.is_zero() {
        println!("  tx retries: {}, tx failed: {}", status.tx_retries, status.tx_failed);
        println!("  beacon signal avg: {} dBm", status.beacon_signal_avg);
        println!(
            "  connected: {}, inactive: {}",
            humantime::format_duration(status.connected_time),
            humantime::format_duration(status.inactive_time)
        );
    }
}
