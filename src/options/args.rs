//! Argument parsing via clap.

use clap::*;
use indoc::indoc;

const TEMPLATE: &str = indoc! {
    "{name} {version}
    {author}

    {about}

    {usage-heading} {usage}

    {all-args}"
};

const USAGE: &str = "sbcmon [OPTIONS]";

/// The arguments for sbcmon.
#[derive(Parser, Debug, Default)]
#[command(
    name = crate_name!(),
    version = crate_version!(),
    author = crate_authors!(),
    about = crate_description!(),
    color = ColorChoice::Auto,
    help_template = TEMPLATE,
    override_usage = USAGE,
)]
pub struct SbcmonArgs {
    #[command(flatten)]
    pub(crate) general: GeneralArgs,

    #[command(flatten)]
    pub(crate) process: ProcessArgs,

    #[command(flatten)]
    pub(crate) wireless: WirelessArgs,
}

impl SbcmonArgs {
    /// The file to write debug logs to, if any.
    pub fn debug_log(&self) -> Option<&str> {
        self.general.debug_log.as_deref()
    }
}

#[derive(Args, Clone, Debug, Default)]
#[command(next_help_heading = "General Options")]
pub(crate) struct GeneralArgs {
    #[arg(
        short = 'C',
        long = "config",
        value_name = "PATH",
        help = "Sets the location of the config file.",
        long_help = "Sets the location of the config file. Expects a config file in the TOML format. \
                    Unlike the default location, a file given here must exist."
    )]
    pub(crate) config_location: Option<String>,

    #[arg(
        short = 'r',
        long,
        value_name = "TIME",
        help = "Sets how long to sample CPU counters for.",
        long_help = "Sets how long to wait between the two CPU counter reads. Takes a number in \
                    milliseconds or a human duration (e.g. 5s). The minimum is 250ms, and the \
                    default is 1s."
    )]
    pub(crate) rate: Option<String>,

    #[arg(
        long = "debug_log",
        value_name = "PATH",
        help = "Writes debug logs to the given file."
    )]
    pub(crate) debug_log: Option<String>,

    #[arg(
        long = "per_core",
        help = "Reports the usage of every core.",
        long_help = "Reports the usage of every core as well as the average across all of them."
    )]
    pub(crate) per_core: bool,
}

#[derive(Args, Clone, Debug, Default)]
#[command(next_help_heading = "Process Options")]
pub(crate) struct ProcessArgs {
    #[arg(
        short = 'p',
        long,
        value_name = "NAME",
        help = "Looks up the processes with the given name.",
        long_help = indoc! {
            "Looks up the processes with the given name. Names of up to 15 characters are
            compared with the kernel's process name. Longer names are compared with the
            program in the command line, either by its file name or by its full path."
        }
    )]
    pub(crate) process: Option<String>,

    #[arg(
        long = "disable_pid_caching",
        help = "Rescans processes on every lookup instead of reusing the last result."
    )]
    pub(crate) disable_pid_caching: bool,
}

#[derive(Args, Clone, Debug, Default)]
#[command(next_help_heading = "Wireless Options")]
pub(crate) struct WirelessArgs {
    #[arg(
        short = 'a',
        long,
        value_name = "ADAPTER",
        help = "Reports the link status of the given wireless adapter, such as wlan0."
    )]
    pub(crate) adapter: Option<String>,

    #[arg(
        long,
        value_name = "BACKEND",
        value_parser = ["iw", "nmcli", "proc"],
        help = "Forces a wireless backend.",
        long_help = indoc! {
            "Forces a wireless backend instead of picking the best one available.
            By default iw is used if installed, then nmcli, then /proc/net/wireless."
        }
    )]
    pub(crate) backend: Option<String>,
}
