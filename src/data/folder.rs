//! Directory-based image classification datasets
//!
//! Each immediate subdirectory of the root is a class bucket:
//!
//! ```text
//! root/
//!   cat/
//!     img_001.png
//!   dog/
//!     img_002.JPG
//! ```

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use super::frame::{Column, DataFrame};
use crate::error::Result;

/// Column holding the file path of each image
pub const IMAGE_COLUMN: &str = "image_id";

/// Column holding the class (subdirectory) name of each image
pub const TARGET_COLUMN: &str = "target";

/// Image file suffixes recognized by default (matched case-insensitively)
pub const IMG_EXTENSIONS: &[&str] =
    &[".jpg", ".jpeg", ".png", ".ppm", ".bmp", ".pgm", ".tif", ".tiff", ".webp"];

/// Options for [`folder_to_frame`]
#[derive(Debug, Clone)]
pub struct FolderOptions {
    /// Accepted filename suffixes, e.g. `".png"`
    pub extensions: Vec<String>,
    /// Shuffle the resulting rows
    pub shuffle: bool,
    /// Seed for the shuffle
    pub seed: u64,
}

impl Default for FolderOptions {
    fn default() -> Self {
        Self {
            extensions: IMG_EXTENSIONS.iter().map(|e| (*e).to_string()).collect(),
            shuffle: false,
            seed: 42,
        }
    }
}

impl FolderOptions {
    /// Shuffle rows with the given seed
    pub fn shuffled(mut self, seed: u64) -> Self {
        self.shuffle = true;
        self.seed = seed;
        self
    }

    /// Replace the accepted extensions
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    fn matches(&self, path: &Path) -> bool {
        let name = path.to_string_lossy().to_lowercase();
        self.extensions.iter().any(|ext| name.ends_with(&ext.to_lowercase()))
    }
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort();
    Ok(entries)
}

/// Scan `directory` and list every image with its class label.
///
/// Returns a frame with columns [`IMAGE_COLUMN`] and [`TARGET_COLUMN`].
/// Files directly under the root and files with unrecognized suffixes are
/// ignored. Without shuffling, rows are ordered by class then file name.
pub fn folder_to_frame<P: AsRef<Path>>(directory: P, options: &FolderOptions) -> Result<DataFrame> {
    let mut images = Vec::new();
    let mut targets = Vec::new();

    for class_dir in sorted_entries(directory.as_ref())? {
        if !class_dir.is_dir() {
            continue;
        }
        let label = match class_dir.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => continue,
        };
        for file in sorted_entries(&class_dir)? {
            if options.matches(&file) {
                images.push(file.to_string_lossy().into_owned());
                targets.push(label.clone());
            }
        }
    }

    let classes: BTreeSet<&String> = targets.iter().collect();
    info!("Found {} files belonging to {} classes.", images.len(), classes.len());

    let frame = DataFrame::from_columns(vec![
        Column::text(IMAGE_COLUMN, images),
        Column::text(TARGET_COLUMN, targets),
    ])?;

    if options.shuffle {
        let mut order: Vec<usize> = (0..frame.len()).collect();
        let mut rng = StdRng::seed_from_u64(options.seed);
        order.shuffle(&mut rng);
        return Ok(frame.take(&order));
    }
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir(root.join("cat")).unwrap();
        fs::create_dir(root.join("dog")).unwrap();
        fs::write(root.join("cat/a.png"), b"").unwrap();
        fs::write(root.join("cat/b.JPG"), b"").unwrap();
        fs::write(root.join("cat/notes.txt"), b"").unwrap();
        fs::write(root.join("dog/c.jpeg"), b"").unwrap();
        fs::write(root.join("stray.png"), b"").unwrap();
        dir
    }

    #[test]
    fn test_scans_class_buckets() {
        let dir = make_tree();
        let df = folder_to_frame(dir.path(), &FolderOptions::default()).unwrap();

        assert_eq!(df.len(), 3);
        assert_eq!(df.column(TARGET_COLUMN).unwrap().keys(), vec!["cat", "cat", "dog"]);
        let ids = df.column(IMAGE_COLUMN).unwrap().keys();
        assert!(ids[0].ends_with("a.png"));
        assert!(ids[1].ends_with("b.JPG"));
        assert!(ids.iter().all(|p| !p.ends_with("stray.png")));
    }

    #[test]
    fn test_custom_extensions() {
        let dir = make_tree();
        let opts = FolderOptions::default().with_extensions([".TXT"]);
        let df = folder_to_frame(dir.path(), &opts).unwrap();
        assert_eq!(df.len(), 1);
        assert_eq!(df.column(TARGET_COLUMN).unwrap().keys(), vec!["cat"]);
    }

    #[test]
    fn test_shuffle_is_seeded() {
        let dir = make_tree();
        let a = folder_to_frame(dir.path(), &FolderOptions::default().shuffled(7)).unwrap();
        let b = folder_to_frame(dir.path(), &FolderOptions::default().shuffled(7)).unwrap();
        assert_eq!(a, b);

        let mut ids = a.column(IMAGE_COLUMN).unwrap().keys();
        ids.sort();
        let mut plain = folder_to_frame(dir.path(), &FolderOptions::default())
            .unwrap()
            .column(IMAGE_COLUMN)
            .unwrap()
            .keys();
        plain.sort();
        assert_eq!(ids, plain);
    }

    #[test]
    fn test_missing_directory_is_io_error() {
        let err = folder_to_frame("/definitely/not/here", &FolderOptions::default()).unwrap_err();
        assert!(matches!(err, crate::Error::Io(_)));
    }
}
