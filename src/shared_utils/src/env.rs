use std::str::FromStr;

use thiserror::Error;

/// An environment variable is set but cannot be used.
#[derive(Debug, Error)]
pub enum EnvVarError {
    #[error("Environment variable {name} is not valid unicode")]
    NotUnicode { name: String },

    #[error("Environment variable {name} has invalid value {value:?}: {message}")]
    Parse {
        name: String,
        value: String,
        message: String,
    },
}

/// Reads an optional environment variable.
///
/// Unset and empty (after trimming) both yield `Ok(None)`; a value that is
/// not valid unicode is an error rather than being silently ignored.
pub fn get_env_var_opt(name: &str) -> Result<Option<String>, EnvVarError> {
    match std::env::var(name) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value.trim().to_string())),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(std::env::VarError::NotUnicode(_)) => Err(EnvVarError::NotUnicode {
            name: name.to_string(),
        }),
    }
}

/// Reads an optional environment variable and parses it with [`FromStr`].
pub fn parse_env_var<T>(name: &str) -> Result<Option<T>, EnvVarError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(value) = get_env_var_opt(name)? else {
        return Ok(None);
    };
    value
        .parse::<T>()
        .map(Some)
        .map_err(|e| EnvVarError::Parse {
            name: name.to_string(),
            value,
            message: e.to_string(),
        })
}
