//! Save data on disk.
//!
//! A [`DataFile`] stores one serde value as JSON, optionally passed through an
//! [`XorCipher`] first. The cipher only keeps casual readers out of save
//! files; it is not encryption.
//!
//! ```text
//! save: T ──serde_json──▶ bytes ──xor?──▶ file
//! load: file ──xor?──▶ bytes ──serde_json──▶ T
//! ```

use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::EngineError;

/// Key used by [`XorCipher::default`].
pub const DEFAULT_KEY: &str = "SsableS";

/// Repeating-key XOR. Applying it twice returns the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XorCipher {
    key: Vec<u8>,
}

impl XorCipher {
    /// # Panics
    ///
    /// Panics if `key` is empty.
    pub fn new(key: impl AsRef<[u8]>) -> Self {
        let key = key.as_ref().to_vec();
        assert!(!key.is_empty(), "XorCipher key must not be empty");
        Self { key }
    }

    pub fn apply(&self, data: &mut [u8]) {
        for (byte, k) in data.iter_mut().zip(self.key.iter().cycle()) {
            *byte ^= k;
        }
    }
}

impl Default for XorCipher {
    fn default() -> Self {
        Self::new(DEFAULT_KEY)
    }
}

/// A typed save file.
pub struct DataFile<T> {
    path: PathBuf,
    cipher: Option<XorCipher>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Serialize + DeserializeOwned> DataFile<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cipher: None,
            _marker: PhantomData,
        }
    }

    pub fn with_cipher(mut self, cipher: XorCipher) -> Self {
        self.cipher = Some(cipher);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_obfuscated(&self) -> bool {
        self.cipher.is_some()
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Write `value`, creating parent directories as needed. Failures are
    /// logged and returned.
    pub fn save(&self, value: &T) -> Result<(), EngineError> {
        self.try_save(value).inspect_err(|e| {
            log::error!("Failed to save {}: {e}", self.path.display());
        })
    }

    fn try_save(&self, value: &T) -> Result<(), EngineError> {
        let mut data = serde_json::to_vec(value).map_err(|e| EngineError::Serialize(e.to_string()))?;
        if let Some(cipher) = &self.cipher {
            cipher.apply(&mut data);
        }
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        fs::write(&self.path, data)?;
        log::debug!("Saved {}", self.path.display());
        Ok(())
    }

    /// Read the stored value. A missing file yields `None`; an unreadable or
    /// corrupt one yields `None` and logs an error.
    pub fn load(&self) -> Option<T> {
        if !self.exists() {
            return None;
        }
        match self.try_load() {
            Ok(value) => Some(value),
            Err(e) => {
                log::error!("Failed to load {}: {e}", self.path.display());
                None
            }
        }
    }

    fn try_load(&self) -> Result<T, EngineError> {
        let mut data = fs::read(&self.path)?;
        if let Some(cipher) = &self.cipher {
            cipher.apply(&mut data);
        }
        serde_json::from_slice(&data).map_err(|e| EngineError::Serialize(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Progress {
        level: u32,
        name: String,
    }

    fn progress() -> Progress {
        Progress {
            level: 3,
            name: "Ash".to_string(),
        }
    }

    #[test]
    fn cipher_is_its_own_inverse() {
        let cipher = XorCipher::new("key");
        let mut data = b"hello world".to_vec();
        cipher.apply(&mut data);
        assert_ne!(data, b"hello world");
        cipher.apply(&mut data);
        assert_eq!(data, b"hello world");
    }

    #[test]
    #[should_panic(expected = "must not be empty")]
    fn empty_key_panics() {
        XorCipher::new("");
    }

    #[test]
    fn saves_into_new_directories() {
        let dir = tempfile::tempdir().unwrap();
        let file = DataFile::<Progress>::new(dir.path().join("saves/slot1.json"));

        file.save(&progress()).unwrap();

        assert_eq!(file.load(), Some(progress()));
        let raw = fs::read_to_string(file.path()).unwrap();
        assert!(raw.contains("\"Ash\""));
    }

    #[test]
    fn obfuscated_files_hide_plain_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slot.dat");
        let file = DataFile::<Progress>::new(&path).with_cipher(XorCipher::default());

        file.save(&progress()).unwrap();

        let raw = fs::read(&path).unwrap();
        assert!(!raw.windows(3).any(|w| w == b"Ash"));
        assert_eq!(file.load(), Some(progress()));

        let plain = DataFile::<Progress>::new(&path);
        assert_eq!(plain.load(), None);
    }

    #[test]
    fn missing_or_corrupt_files_load_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let file = DataFile::<Progress>::new(dir.path().join("none.json"));
        assert_eq!(file.load(), None);

        fs::write(file.path(), b"{ not json").unwrap();
        assert_eq!(file.load(), None);
    }
}
