//! How the CLI arguments and config file are turned into the settings sbcmon
//! runs with. Arguments take precedence over the config file.

pub mod args;
pub mod config;
mod error;

use std::{path::PathBuf, time::Duration};

pub use self::{
    args::SbcmonArgs,
    config::Config,
    error::{OptionError, OptionResult},
};
use self::config::StringOrNum;
use crate::collection::{processes::ProcessCacheOptions, wireless::BackendKind};

/// Where the config file lives, relative to the user's config directory.
pub const DEFAULT_CONFIG_FILE_LOCATION: &str = "sbcmon/sbcmon.toml";

pub const DEFAULT_RATE: Duration = Duration::from_secs(1);
pub const MINIMUM_RATE: Duration = Duration::from_millis(250);

/// What to look for, and how.
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    /// Time between the two CPU counter reads.
    pub rate: Duration,
    pub per_core: bool,
    pub process: Option<ProcessSettings>,
    pub wireless: Option<WirelessSettings>,
}

#[derive(Debug, Clone)]
pub struct ProcessSettings {
    pub name: String,
    pub cache: ProcessCacheOptions,
}

#[derive(Debug, Clone)]
pub struct WirelessSettings {
    pub adapter: String,
    pub backend: Option<BackendKind>,
}

/// Returns the config path to use, and whether it was explicitly asked for.
pub fn get_config_path(config_location: Option<&str>) -> Option<(PathBuf, bool)> {
    if let Some(location) = config_location {
        return Some((PathBuf::from(location), true));
    }

    dirs::config_dir().map(|dir| (dir.join(DEFAULT_CONFIG_FILE_LOCATION), false))
}

/// Loads the config file picked by the arguments, or the default one.
pub fn get_config(args: &SbcmonArgs) -> OptionResult<Config> {
    match get_config_path(args.general.config_location.as_deref()) {
        Some((path, explicit)) => Config::read(&path, explicit),
        None => Ok(Config::default()),
    }
}

/// Merges the arguments over the config.
pub fn init(args: &SbcmonArgs, config: &Config) -> OptionResult<MonitorSettings> {
    let rate = get_rate(args, config)?;
    let per_core = args.general.per_core || config.cpu.per_core;

    let process = match args.process.process.as_ref().or(config.process.name.as_ref()) {
        Some(name) if name.is_empty() => {
            return Err(OptionError::invalid_arg_value("process"));
        }
        Some(name) => Some(ProcessSettings {
            name: name.clone(),
            cache: get_cache_options(args, config)?,
        }),
        None => None,
    };

    let backend = match &args.wireless.backend {
        Some(backend) => Some(
            backend
                .parse::<BackendKind>()
                .map_err(|_| OptionError::invalid_arg_value("backend"))?,
        ),
        None => config.wireless.backend,
    };

    let wireless = match (&args.wireless.adapter, &config.wireless.adapter) {
        (Some(adapter), _) if adapter.is_empty() => {
            return Err(OptionError::invalid_arg_value("adapter"));
        }
        (None, Some(adapter)) if adapter.is_empty() => {
            return Err(OptionError::invalid_config_value("wireless", "adapter"));
        }
        (Some(adapter), _) | (None, Some(adapter)) => Some(WirelessSettings {
            adapter: adapter.clone(),
            backend,
        }),
        (None, None) => None,
    };

    Ok(MonitorSettings {
        rate,
        per_core,
        process,
        wireless,
    })
}

fn get_rate(args: &SbcmonArgs, config: &Config) -> OptionResult<Duration> {
    let rate = if let Some(rate) = &args.general.rate {
        try_parse_ms(rate).map_err(|_| OptionError::invalid_arg_value("rate"))?
    } else if let Some(rate) = &config.general.rate {
        parse_string_or_num(rate).map_err(|_| OptionError::invalid_config_value("general", "rate"))?
    } else {
        return Ok(DEFAULT_RATE);
    };

    if rate < MINIMUM_RATE {
        let source = if args.general.rate.is_some() {
            "'--rate'"
        } else {
            "'rate' in '[general]'"
        };
        let reason = format!("{source} must be greater than 250ms.");

        return Err(if args.general.rate.is_some() {
            OptionError::arg(reason)
        } else {
            OptionError::config(reason)
        });
    }

    Ok(rate)
}

fn get_cache_options(args: &SbcmonArgs, config: &Config) -> OptionResult<ProcessCacheOptions> {
    let mut options = ProcessCacheOptions {
        disable_pid_caching: args.process.disable_pid_caching || config.process.disable_pid_caching,
        ..Default::default()
    };

    if let Some(interval) = &config.process.sync_interval {
        options.sync_interval = parse_string_or_num(interval)
            .map_err(|_| OptionError::invalid_config_value("process", "sync_interval"))?;
    }

    Ok(options)
}

fn parse_string_or_num(value: &StringOrNum) -> Result<Duration, ()> {
    match value {
        StringOrNum::String(s) => try_parse_ms(s),
        StringOrNum::Num(ms) => Ok(Duration::from_millis(*ms)),
    }
}

/// Parses a duration given either as plain milliseconds (`"500"`) or in a
/// human format (`"2s"`, `"1m 30s"`).
fn try_parse_ms(s: &str) -> Result<Duration, ()> {
    let s = s.trim();
    if let Ok(ms) = s.parse::<u64>() {
        Ok(Duration::from_millis(ms))
    } else {
        humantime::parse_duration(s).map_err(|_| ())
    }
}
