use std::path::Path;

use crate::{error::IoError, media::is_image_path};

/// Sorted list of image paths relative to the image pool root.
///
/// Entries use `/` separators and are sorted lexically; this order drives
/// every downstream index (frame numbers, logs, pair files).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageManifest(Vec<String>);

impl ImageManifest {
    /// Build a manifest from arbitrary names, sorting and removing duplicates.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names = names.into_iter().map(Into::into).collect::<Vec<_>>();
        names.sort();
        names.dedup();
        Self(names)
    }

    /// Number of images.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the manifest holds no images.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the relative image names in order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &str> + ExactSizeIterator {
        self.0.iter().map(String::as_str)
    }

    /// The names as a slice.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Write the manifest as a text file, one name per line.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), IoError> {
        let mut contents = self.0.join("\n");
        if !contents.is_empty() {
            contents.push('\n');
        }
        std::fs::write(path, contents)?;
        Ok(())
    }
}

impl<'a> IntoIterator for &'a ImageManifest {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Recursively list every image in the pool.
///
/// # Arguments
///
/// * `images_dir` - The image pool root.
///
/// # Returns
///
/// The sorted manifest, empty if the directory does not exist.
pub fn list_images(images_dir: impl AsRef<Path>) -> Result<ImageManifest, IoError> {
    let images_dir = images_dir.as_ref();
    if !images_dir.exists() {
        return Ok(ImageManifest::default());
    }

    let mut names = Vec::new();
    // directory links are not descended, links to files are listed
    for entry in walkdir::WalkDir::new(images_dir) {
        let entry = entry?;
        if !entry.path().is_file() || !is_image_path(entry.path()) {
            continue;
        }
        let Ok(rel_path) = entry.path().strip_prefix(images_dir) else {
            continue;
        };
        let name = rel_path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        names.push(name);
    }

    let manifest = ImageManifest::from_names(names);

    log::info!("Found {} images for processing", manifest.len());
    if !manifest.is_empty() {
        log::info!("First few image names:");
        for (i, name) in manifest.iter().take(5).enumerate() {
            log::info!("  {}: {}", i + 1, name);
        }
    }

    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_pool_is_empty() -> Result<(), IoError> {
        let tmp_dir = tempfile::tempdir()?;
        let manifest = list_images(tmp_dir.path().join("images"))?;
        assert!(manifest.is_empty());
        Ok(())
    }

    #[test]
    fn sorted_relative_paths() -> Result<(), IoError> {
        let tmp_dir = tempfile::tempdir()?;
        let root = tmp_dir.path();
        std::fs::create_dir_all(root.join("walk"))?;
        std::fs::create_dir_all(root.join("b_dir.png"))?;
        for name in [
            "z.jpg",
            "a.PNG",
            "walk/frame_000001.jpg",
            "walk/frame_000000.jpg",
            "readme.md",
        ] {
            std::fs::write(root.join(name), b"")?;
        }

        let manifest = list_images(root)?;
        assert_eq!(
            manifest.as_slice(),
            &[
                "a.PNG",
                "walk/frame_000000.jpg",
                "walk/frame_000001.jpg",
                "z.jpg"
            ]
        );

        // listing an unchanged pool again yields the same manifest
        assert_eq!(list_images(root)?, manifest);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn directory_links_are_not_followed() -> Result<(), IoError> {
        let tmp_dir = tempfile::tempdir()?;
        let root = tmp_dir.path();
        std::fs::create_dir_all(root.join("walk"))?;
        std::fs::write(root.join("walk/frame_000000.jpg"), b"")?;
        std::os::unix::fs::symlink(root, root.join("walk/loop"))?;
        std::os::unix::fs::symlink(
            root.join("walk/frame_000000.jpg"),
            root.join("linked.jpg"),
        )?;

        let manifest = list_images(root)?;
        assert_eq!(
            manifest.as_slice(),
            &["linked.jpg", "walk/frame_000000.jpg"]
        );
        Ok(())
    }

    #[test]
    fn from_names_dedups() {
        let manifest = ImageManifest::from_names(["b", "a", "b"]);
        assert_eq!(manifest.as_slice(), &["a", "b"]);
    }

    #[test]
    fn write_list() -> Result<(), IoError> {
        let tmp_dir = tempfile::tempdir()?;
        let path = tmp_dir.path().join("list.txt");
        ImageManifest::from_names(["x/1.jpg", "0.jpg"]).write(&path)?;
        assert_eq!(std::fs::read_to_string(&path)?, "0.jpg\nx/1.jpg\n");
        Ok(())
    }
}
