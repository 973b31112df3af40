//! Image collaborator: loads and releases the images a map refers to.

use std::path::{Path, PathBuf};

use crate::error::ImageError;

/// Loads images referenced by tilesets and image layers.
///
/// Every handle returned by [`load_image`](ImageLoader::load_image) is handed
/// back exactly once through [`release_image`](ImageLoader::release_image),
/// either by [`TileMap::release`](crate::assets::map::TileMap::release) or by
/// the decoder itself when a decode fails after some images were loaded.
pub trait ImageLoader {
    type Image;

    fn load_image(&mut self, path: &Path) -> Result<Self::Image, ImageError>;

    fn release_image(&mut self, image: Self::Image);
}

impl<L: ImageLoader + ?Sized> ImageLoader for &mut L {
    type Image = L::Image;

    fn load_image(&mut self, path: &Path) -> Result<Self::Image, ImageError> {
        (**self).load_image(path)
    }

    fn release_image(&mut self, image: Self::Image) {
        (**self).release_image(image);
    }
}

/// Pixel dimensions of a loaded image, for loaders whose handles know them.
pub trait ImageSize {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
}

/// Headless loader: checks that the image file exists and hands out its path.
///
/// Useful for tools that only need the decoded tree, and as the default
/// loader of [`load_map`](crate::load_map).
#[derive(Debug, Clone, Copy, Default)]
pub struct ImagePaths;

impl ImageLoader for ImagePaths {
    type Image = PathBuf;

    fn load_image(&mut self, path: &Path) -> Result<PathBuf, ImageError> {
        if path.is_file() {
            Ok(path.to_path_buf())
        } else {
            Err(ImageError::NotFound(path.to_path_buf()))
        }
    }

    fn release_image(&mut self, _image: PathBuf) {}
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_paths_requires_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiles.png");
        std::fs::write(&path, b"png").unwrap();

        assert_eq!(ImagePaths.load_image(&path).unwrap(), path);
        assert!(matches!(
            ImagePaths.load_image(&dir.path().join("missing.png")),
            Err(ImageError::NotFound(_))
        ));
    }
}
