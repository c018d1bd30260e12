use std::fmt;

#[derive(Debug)]
pub enum ArtifactError {
    Io(String),
    Serialize(String),
}

impl fmt::Display for ArtifactError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactError::Io(msg) => write!(f, "artifact io error: {msg}"),
            ArtifactError::Serialize(msg) => write!(f, "artifact serialize error: {msg}"),
        }
    }
}

impl std::error::Error for ArtifactError {}

impl From<std::io::Error> for ArtifactError {
    fn from(e: std::io::Error) -> Self {
        ArtifactError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for ArtifactError {
    fn from(e: serde_json::Error) -> Self {
        ArtifactError::Serialize(e.to_string())
    }
}

impl From<serde_yaml::Error> for ArtifactError {
    fn from(e: serde_yaml::Error) -> Self {
        ArtifactError::Serialize(e.to_string())
    }
}
