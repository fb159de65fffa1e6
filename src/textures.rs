//! Decoding of surface textures and skybox faces into RGBA pixels.
//!
//! Everything here is CPU-only; [`gpu`](crate::gpu) uploads the result.
//!
//! # Supported Formats
//!
//! - PNG
//! - JPEG

use std::path::{Path, PathBuf};

use crate::error::TextureError;

/// Decoded RGBA8 pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    /// Raw RGBA pixel data (width * height * 4 bytes).
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl TextureData {
    /// Wrap raw RGBA data.
    ///
    /// # Panics
    ///
    /// Panics if `data` is not exactly `width * height * 4` bytes.
    pub fn from_rgba(data: Vec<u8>, width: u32, height: u32) -> Self {
        assert_eq!(
            data.len(),
            (width * height * 4) as usize,
            "RGBA data size mismatch"
        );
        Self { data, width, height }
    }

    /// Decode an image file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TextureError> {
        let img = image::open(path.as_ref())?.into_rgba8();
        let (width, height) = img.dimensions();
        Ok(Self {
            data: img.into_raw(),
            width,
            height,
        })
    }

    /// A 1x1 texture of one colour.
    ///
    /// ```ignore
    /// let white = TextureData::solid([255, 255, 255, 255]);
    /// ```
    pub fn solid(rgba: [u8; 4]) -> Self {
        Self {
            data: rgba.to_vec(),
            width: 1,
            height: 1,
        }
    }

    /// A `width` x `height` texture of one colour.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let data = rgba.repeat((width * height) as usize);
        Self { data, width, height }
    }

    /// Bytes per row of the pixel data.
    pub fn bytes_per_row(&self) -> u32 {
        self.width * 4
    }
}

/// The six faces of a cubemap, in `+x, -x, +y, -y, +z, -z` order.
#[derive(Debug, Clone, PartialEq)]
pub struct CubeFaces {
    /// Face width and height in pixels.
    pub size: (u32, u32),
    /// Pixels per face.
    pub faces: [TextureData; 6],
}

impl CubeFaces {
    /// Decode six face images.
    ///
    /// A face that fails to decode is logged and replaced with black, as long
    /// as at least one face loads. Faces of different sizes are an error.
    pub fn load(paths: &[PathBuf; 6]) -> Result<Self, TextureError> {
        let mut loaded: Vec<Option<TextureData>> = Vec::with_capacity(6);
        let mut first_error = None;

        for path in paths {
            match TextureData::from_file(path) {
                Ok(face) => loaded.push(Some(face)),
                Err(e) => {
                    log::warn!("Skybox face {} failed to load: {}", path.display(), e);
                    first_error.get_or_insert(e);
                    loaded.push(None);
                }
            }
        }

        let Some(reference) = loaded.iter().flatten().next() else {
            return Err(first_error.unwrap_or(TextureError::NoFaces));
        };
        let size = (reference.width, reference.height);

        for (face, path) in loaded.iter().zip(paths) {
            if let Some(face) = face {
                let found = (face.width, face.height);
                if found != size {
                    return Err(TextureError::FaceSize {
                        path: path.clone(),
                        expected: size,
                        found,
                    });
                }
            }
        }

        let mut loaded = loaded.into_iter();
        let faces = std::array::from_fn(|_| {
            loaded
                .next()
                .flatten()
                .unwrap_or_else(|| TextureData::filled(size.0, size.1, [0, 0, 0, 255]))
        });

        Ok(Self { size, faces })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_png(dir: &Path, name: &str, size: u32, rgba: [u8; 4]) -> PathBuf {
        let path = dir.join(name);
        image::RgbaImage::from_pixel(size, size, image::Rgba(rgba))
            .save(&path)
            .unwrap();
        path
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("orrery-textures-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_solid() {
        let tex = TextureData::solid([1, 2, 3, 4]);
        assert_eq!(tex.data, vec![1, 2, 3, 4]);
        assert_eq!((tex.width, tex.height), (1, 1));
        assert_eq!(tex.bytes_per_row(), 4);
    }

    #[test]
    #[should_panic(expected = "RGBA data size mismatch")]
    fn test_from_rgba_size_mismatch() {
        TextureData::from_rgba(vec![0; 7], 1, 2);
    }

    #[test]
    fn test_missing_file_is_error() {
        let err = TextureData::from_file("does/not/exist.png").unwrap_err();
        assert!(matches!(err, TextureError::ImageLoad(_)));
    }

    #[test]
    fn test_png_roundtrip() {
        let dir = scratch_dir("png");
        let path = write_png(&dir, "red.png", 3, [255, 0, 0, 255]);
        let tex = TextureData::from_file(&path).unwrap();
        assert_eq!((tex.width, tex.height), (3, 3));
        assert_eq!(&tex.data[..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn test_cube_missing_face_is_black() {
        let dir = scratch_dir("cube");
        let mut paths: [PathBuf; 6] =
            std::array::from_fn(|i| write_png(&dir, &format!("{}.png", i + 1), 2, [200, 200, 200, 255]));
        paths[3] = dir.join("absent.png");

        let cube = CubeFaces::load(&paths).unwrap();
        assert_eq!(cube.size, (2, 2));
        assert_eq!(&cube.faces[3].data[..4], &[0, 0, 0, 255]);
        assert_eq!(&cube.faces[0].data[..4], &[200, 200, 200, 255]);
    }

    #[test]
    fn test_cube_size_mismatch() {
        let dir = scratch_dir("mismatch");
        let mut paths: [PathBuf; 6] =
            std::array::from_fn(|i| write_png(&dir, &format!("{}.png", i + 1), 2, [0, 0, 255, 255]));
        paths[5] = write_png(&dir, "big.png", 4, [0, 0, 255, 255]);

        let err = CubeFaces::load(&paths).unwrap_err();
        assert!(matches!(err, TextureError::FaceSize { found: (4, 4), .. }));
    }

    #[test]
    fn test_cube_all_missing() {
        let paths: [PathBuf; 6] = std::array::from_fn(|i| PathBuf::from(format!("nowhere/{i}.png")));
        assert!(CubeFaces::load(&paths).is_err());
    }
}
