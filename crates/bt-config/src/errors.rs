use std::fmt;

#[derive(Debug, Clone)]
pub enum ConfigError {
    Io(String),
    Parse(String),
    TierConflict {
        profile: String,
        field: String,
    },
    CustomMissingField {
        field: String,
    },
    AliasConflict {
        canonical: String,
        alias: String,
    },
    BoundsViolation {
        field: String,
        value: String,
        bound: String,
    },
    StopModeConflict {
        detail: String,
    },
    TypeMismatch {
        field: String,
        expected: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "config io error: {msg}"),
            ConfigError::Parse(msg) => write!(f, "config parse error: {msg}"),
            ConfigError::TierConflict { profile, field } => write!(
                f,
                "execution.profile={profile} is a preset; execution.{field} must not be set explicitly"
            ),
            ConfigError::CustomMissingField { field } => write!(
                f,
                "execution.profile=custom requires execution.{field} to be set"
            ),
            ConfigError::AliasConflict { canonical, alias } => write!(
                f,
                "{canonical} and its alias {alias} were both given with different values"
            ),
            ConfigError::BoundsViolation { field, value, bound } => {
                write!(f, "{field}={value} is out of bounds ({bound})")
            }
            ConfigError::StopModeConflict { detail } => write!(f, "risk.stop_resolution_mode conflict: {detail}"),
            ConfigError::TypeMismatch { field, expected } => {
                write!(f, "{field} must be {expected}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
