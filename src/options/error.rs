use std::{borrow::Cow, path::PathBuf};

/// A problem with a configured option and why it is wrong.
///
/// These are shown to the user as-is, so say what to fix. Values being
/// pointed at go in _single quotes_ (e.g. `'bad'`).
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum OptionError {
    #[error("Configuration file error: {0}")]
    Config(Cow<'static, str>),

    #[error("Argument error: {0}")]
    Argument(Cow<'static, str>),

    #[error("Could not read the config file '{}': {reason}", path.display())]
    ConfigFile { path: PathBuf, reason: String },
}

impl OptionError {
    pub(crate) fn config<R: Into<Cow<'static, str>>>(reason: R) -> Self {
        OptionError::Config(reason.into())
    }

    /// An invalid value for `key` in the `[section]` table.
    pub(crate) fn invalid_config_value(section: &str, key: &str) -> Self {
        OptionError::Config(Cow::Owned(format!(
            "'{key}' in '[{section}]' was set with an invalid value, please update it in your config file."
        )))
    }

    pub(crate) fn arg<R: Into<Cow<'static, str>>>(reason: R) -> Self {
        OptionError::Argument(reason.into())
    }

    /// An invalid value for the `--flag` argument.
    pub(crate) fn invalid_arg_value(flag: &str) -> Self {
        OptionError::Argument(Cow::Owned(format!(
            "'--{flag}' was set with an invalid value, please update your arguments."
        )))
    }

    pub(crate) fn config_file(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        OptionError::ConfigFile {
            path: path.into(),
            reason: err.to_string(),
        }
    }
}

pub type OptionResult<T> = Result<T, OptionError>;

impl From<toml_edit::de::Error> for OptionError {
    fn from(err: toml_edit::de::Error) -> Self {
        OptionError::Config(err.to_string().into())
    }
}
