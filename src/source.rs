//! Enumerate the images of a folder and cycle through them

use crate::errors::{ConveyorError, ConveyorResult};
use std::fs;
use std::path::{Path, PathBuf};

/// File extensions accepted as images, compared case-insensitively
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// An endless, fixed-order sequence over the images found in a folder
#[derive(Debug)]
pub struct ImageSource {
    paths: Vec<PathBuf>,
    index: usize,
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
        .unwrap_or(false)
}

impl ImageSource {
    /// Collect the images directly contained in `dir`, ordered by file name.
    ///
    /// Fails with [`ConveyorError::NoImages`] if nothing matches.
    pub fn discover<P: AsRef<Path>>(dir: P) -> ConveyorResult<Self> {
        let dir = dir.as_ref();
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && has_image_extension(&path) {
                paths.push(path);
            }
        }
        paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Self::from_paths(dir, paths)
    }

    /// Wrap an already enumerated list of images.
    pub fn from_paths<P: AsRef<Path>>(dir: P, paths: Vec<PathBuf>) -> ConveyorResult<Self> {
        if paths.is_empty() {
            Err(ConveyorError::NoImages(dir.as_ref().to_path_buf()))
        } else {
            Ok(Self { paths, index: 0 })
        }
    }

    /// The next path, wrapping around after the last one.
    pub fn next_path(&mut self) -> &Path {
        let current = self.index;
        self.index = (self.index + 1) % self.paths.len();
        &self.paths[current]
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"").unwrap();
    }

    fn names(source: &ImageSource) -> Vec<String> {
        source
            .paths()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn filters_by_extension_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "c.jpeg");
        touch(dir.path(), "a.PNG");
        touch(dir.path(), "b.Jpg");
        touch(dir.path(), "notes.txt");
        touch(dir.path(), "png");
        fs::create_dir(dir.path().join("nested.png")).unwrap();
        touch(&dir.path().join("nested.png"), "inner.png");

        let source = ImageSource::discover(dir.path()).unwrap();
        assert_eq!(names(&source), vec!["a.PNG", "b.Jpg", "c.jpeg"]);
    }

    #[test]
    fn folder_without_images_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "readme.md");
        touch(dir.path(), "photo.gif");

        match ImageSource::discover(dir.path()) {
            Err(ConveyorError::NoImages(path)) => assert_eq!(path, dir.path()),
            other => panic!("expected NoImages, got {:?}", other),
        }
    }

    #[test]
    fn missing_folder_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        assert!(matches!(
            ImageSource::discover(&missing),
            Err(ConveyorError::IoError(_))
        ));
    }

    #[test]
    fn folder_with_bracket_characters() {
        let dir = tempfile::tempdir().unwrap();
        let odd = dir.path().join("shots [2025]");
        fs::create_dir(&odd).unwrap();
        touch(&odd, "x.png");

        let source = ImageSource::discover(&odd).unwrap();
        assert_eq!(names(&source), vec!["x.png"]);
    }

    #[cfg(unix)]
    #[test]
    fn folder_with_non_utf8_name() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir().unwrap();
        let odd = dir.path().join(OsStr::from_bytes(b"raw \xff\xfe"));
        fs::create_dir(&odd).unwrap();
        touch(&odd, "y.jpg");

        let source = ImageSource::discover(&odd).unwrap();
        assert_eq!(names(&source), vec!["y.jpg"]);
    }

    #[test]
    fn cycles_back_to_the_first_path() {
        for n in 1..=5 {
            let paths: Vec<PathBuf> = (0..n).map(|i| PathBuf::from(format!("{}.png", i))).collect();
            let mut source = ImageSource::from_paths("/", paths.clone()).unwrap();
            for expected in &paths {
                assert_eq!(source.next_path(), expected.as_path());
            }
            assert_eq!(source.next_path(), paths[0].as_path());
        }
    }
}
