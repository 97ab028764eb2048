//! # Assets — Decoded Textures Behind Handles
//!
//! Modules never hold image data. [`AssetStore::load_texture`] returns a
//! [`TextureHandle`], an index into the store, and caches it by path so the
//! same file decodes once.
//!
//! ```text
//! AssetStore
//! ┌───────────────────────────────────────────┐
//! │ textures: Vec<Texture>                    │
//! │   [0] 1x1 white (default)  ◄── always    │
//! │   [1] "hero.png"                          │
//! │                                           │
//! │ paths: HashMap<PathBuf, TextureHandle>    │
//! │   "hero.png" → Handle(1)                  │
//! └───────────────────────────────────────────┘
//! ```
//!
//! A file that fails to decode is logged and answered with the white
//! default, so a missing sprite shows up as a tinted rectangle instead of a
//! crash. [`reload_texture`](AssetStore::reload_texture) replaces the pixels
//! behind an existing handle; the handle value never changes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::EngineError;
use crate::render::TextureHandle;

/// RGBA8 pixels, row-major from the top-left.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Texture {
    fn white() -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: vec![255; 4],
        }
    }

    fn decode(path: &Path) -> Result<Self, EngineError> {
        let img = image::open(path)
            .map_err(|e| EngineError::AssetLoad {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?
            .to_rgba8();
        let (width, height) = img.dimensions();
        Ok(Self {
            width,
            height,
            pixels: img.into_raw(),
        })
    }
}

pub struct AssetStore {
    textures: Vec<Texture>,
    paths: HashMap<PathBuf, TextureHandle>,
}

impl AssetStore {
    pub fn new() -> Self {
        Self {
            textures: vec![Texture::white()],
            paths: HashMap::new(),
        }
    }

    /// Load and cache a texture. Failures are logged and yield
    /// [`TextureHandle::WHITE`].
    pub fn load_texture(&mut self, path: impl AsRef<Path>) -> TextureHandle {
        let path = path.as_ref();
        match self.try_load_texture(path) {
            Ok(handle) => handle,
            Err(e) => {
                log::error!("{e}");
                TextureHandle::WHITE
            }
        }
    }

    pub fn try_load_texture(&mut self, path: impl AsRef<Path>) -> Result<TextureHandle, EngineError> {
        let path = path.as_ref();
        if let Some(handle) = self.paths.get(path) {
            return Ok(*handle);
        }

        let texture = Texture::decode(path)?;
        log::info!("Loaded texture {} ({}x{})", path.display(), texture.width, texture.height);
        let handle = self.push(texture);
        self.paths.insert(path.to_path_buf(), handle);
        Ok(handle)
    }

    /// Store generated pixels under a new handle.
    ///
    /// # Panics
    ///
    /// Panics if `pixels` is not `width * height * 4` bytes long.
    pub fn insert_rgba(&mut self, width: u32, height: u32, pixels: Vec<u8>) -> TextureHandle {
        assert_eq!(
            pixels.len(),
            width as usize * height as usize * 4,
            "RGBA data does not match {width}x{height}"
        );
        self.push(Texture { width, height, pixels })
    }

    /// Decode `path` again into its existing handle. Returns `false`, keeping
    /// the old pixels, if the path was never loaded or fails to decode.
    pub fn reload_texture(&mut self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        let Some(handle) = self.paths.get(path).copied() else {
            log::warn!("Cannot reload {}: never loaded", path.display());
            return false;
        };
        match Texture::decode(path) {
            Ok(texture) => {
                self.textures[handle.0 as usize] = texture;
                log::info!("Reloaded texture {}", path.display());
                true
            }
            Err(e) => {
                log::warn!("Reload failed: {e}");
                false
            }
        }
    }

    pub fn texture(&self, handle: TextureHandle) -> Option<&Texture> {
        self.textures.get(handle.0 as usize)
    }

    pub fn handle_of(&self, path: impl AsRef<Path>) -> Option<TextureHandle> {
        self.paths.get(path.as_ref()).copied()
    }

    /// Number of textures, including the white default.
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    fn push(&mut self, texture: Texture) -> TextureHandle {
        let handle = TextureHandle(self.textures.len() as u32);
        self.textures.push(texture);
        handle
    }
}

impl Default for AssetStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_png(path: &Path, width: u32, height: u32, rgba: [u8; 4]) {
        image::RgbaImage::from_pixel(width, height, image::Rgba(rgba))
            .save(path)
            .unwrap();
    }

    #[test]
    fn handle_zero_is_white() {
        let store = AssetStore::new();
        let white = store.texture(TextureHandle::WHITE).unwrap();
        assert_eq!((white.width, white.height), (1, 1));
        assert_eq!(white.pixels, vec![255; 4]);
    }

    #[test]
    fn loads_and_caches_by_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hero.png");
        write_png(&path, 2, 3, [10, 20, 30, 255]);

        let mut store = AssetStore::new();
        let handle = store.load_texture(&path);
        assert_eq!(handle, TextureHandle(1));
        assert_eq!(store.load_texture(&path), handle);
        assert_eq!(store.len(), 2);

        let texture = store.texture(handle).unwrap();
        assert_eq!((texture.width, texture.height), (2, 3));
        assert_eq!(&texture.pixels[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn missing_file_falls_back_to_white() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = AssetStore::new();

        assert_eq!(store.load_texture(dir.path().join("nope.png")), TextureHandle::WHITE);
        assert!(matches!(
            store.try_load_texture(dir.path().join("nope.png")),
            Err(EngineError::AssetLoad { .. })
        ));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn reload_keeps_the_handle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tile.png");
        write_png(&path, 1, 1, [0, 0, 0, 255]);

        let mut store = AssetStore::new();
        let handle = store.load_texture(&path);
        write_png(&path, 1, 1, [255, 0, 0, 255]);

        assert!(store.reload_texture(&path));
        assert_eq!(store.handle_of(&path), Some(handle));
        assert_eq!(store.texture(handle).unwrap().pixels, vec![255, 0, 0, 255]);
    }

    #[test]
    fn generated_textures_get_fresh_handles() {
        let mut store = AssetStore::new();
        let handle = store.insert_rgba(2, 1, vec![0; 8]);
        assert_eq!(handle, TextureHandle(1));
        assert_eq!(store.texture(handle).unwrap().width, 2);
    }
}
