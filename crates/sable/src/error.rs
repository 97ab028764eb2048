//! Engine-level errors.
//!
//! Most runtime faults are logged and degraded rather than returned (see the
//! scene and asset modules). [`EngineError`] covers the calls where the
//! caller has to decide: scene registration, configuration and save data.

use std::fmt;
use std::io;

#[derive(Debug)]
pub enum EngineError {
    /// A scene was registered with an empty name.
    EmptySceneName,
    /// A scene with this name is already registered.
    DuplicateScene(String),
    /// Configuration could not be parsed.
    Config(String),
    Io(io::Error),
    /// Save data could not be encoded or decoded.
    Serialize(String),
    AssetLoad { path: String, reason: String },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::EmptySceneName => f.write_str("scene name must not be empty"),
            EngineError::DuplicateScene(name) => write!(f, "scene '{name}' is already registered"),
            EngineError::Config(e) => write!(f, "invalid configuration: {e}"),
            EngineError::Io(e) => write!(f, "i/o error: {e}"),
            EngineError::Serialize(e) => write!(f, "serialization failed: {e}"),
            EngineError::AssetLoad { path, reason } => {
                write!(f, "failed to load asset '{path}': {reason}")
            }
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for EngineError {
    fn from(e: io::Error) -> Self {
        EngineError::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::*;

    #[test]
    fn io_errors_convert_and_chain() {
        fn read() -> Result<(), EngineError> {
            Err(io::Error::new(io::ErrorKind::NotFound, "gone"))?;
            Ok(())
        }

        let err = read().unwrap_err();
        assert!(matches!(err, EngineError::Io(_)));
        assert!(err.source().is_some());
        assert_eq!(err.to_string(), "i/o error: gone");
    }

    #[test]
    fn messages_name_the_subject() {
        let err = EngineError::AssetLoad {
            path: "hero.png".into(),
            reason: "no such file".into(),
        };
        assert_eq!(err.to_string(), "failed to load asset 'hero.png': no such file");
        assert_eq!(
            EngineError::DuplicateScene("menu".into()).to_string(),
            "scene 'menu' is already registered"
        );
    }
}
