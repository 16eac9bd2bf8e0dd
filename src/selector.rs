//! Resolves which wallpaper file to apply.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rand::Rng;
use thiserror::Error;
use tracing::debug;

use crate::config::WallpaperConfig;

/// Directory entry that tracks the active wallpaper, never offered as a choice.
pub const RESERVED_ENTRY: &str = "current";

#[derive(Debug, Error)]
pub enum SelectError {
    #[error("wallpaper directory {dir} is unavailable: {source}")]
    DirectoryUnavailable {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("the wallpaper list is empty")]
    EmptyList,
    #[error("no wallpapers found in {0}")]
    NoWallpapers(PathBuf),
}

impl SelectError {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::DirectoryUnavailable { .. } => "DirectoryUnavailable",
            Self::EmptyList => "EmptyList",
            Self::NoWallpapers(_) => "NoWallpapers",
        }
    }
}

/// Picks wallpapers from a directory, filtered by extension.
///
/// The randomness source is injected so callers decide how it is seeded.
pub struct WallpaperSelector<R> {
    dir: PathBuf,
    ext: String,
    rng: R,
}

impl<R> WallpaperSelector<R> {
    pub fn new(dir: impl Into<PathBuf>, ext: impl Into<String>, rng: R) -> Self {
        Self {
            dir: dir.into(),
            ext: ext.into(),
            rng,
        }
    }

    pub fn from_config(config: &WallpaperConfig, rng: R) -> Self {
        Self::new(config.dir_path(), config.ext.as_str(), rng)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File names in the wallpaper directory matching the extension, sorted.
    ///
    /// A missing or unreadable directory is an error, not an empty list.
    pub fn list_wallpapers(&self) -> Result<Vec<String>, SelectError> {
        let unavailable = |source| SelectError::DirectoryUnavailable {
            dir: self.dir.clone(),
            source,
        };

        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(unavailable)? {
            let entry = entry.map_err(unavailable)?;
            let Ok(name) = entry.file_name().into_string() else {
                debug!("skipping non UTF-8 entry {}", entry.path().display());
                continue;
            };
            if name == RESERVED_ENTRY || !self.matches_ext(&name) || !entry.path().is_file() {
                continue;
            }
            names.push(name);
        }

        names.sort();
        Ok(names)
    }

    /// Joins `name` onto the directory. Whether the file exists is left to
    /// the apply command to find out.
    pub fn pick_explicit(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Builds a curated list out of names inside the wallpaper directory.
    pub fn curated_from_names(&self, names: &[String]) -> Vec<PathBuf> {
        names.iter().map(|name| self.pick_explicit(name)).collect()
    }

    fn matches_ext(&self, name: &str) -> bool {
        let ext = self.ext.as_bytes();
        let name = name.as_bytes();
        name.len() >= ext.len() && name[name.len() - ext.len()..].eq_ignore_ascii_case(ext)
    }
}

impl<R: Rng> WallpaperSelector<R> {
    /// Uniformly random wallpaper from the directory listing.
    pub fn pick_random(&mut self) -> Result<PathBuf, SelectError> {
        let names = self.list_wallpapers()?;
        let name = choose(&mut self.rng, &names)
            .ok_or_else(|| SelectError::NoWallpapers(self.dir.clone()))?;
        Ok(self.dir.join(name))
    }

    /// Uniformly random entry of `list`.
    pub fn pick_from_curated_list(&mut self, list: &[PathBuf]) -> Result<PathBuf, SelectError> {
        choose(&mut self.rng, list).cloned().ok_or(SelectError::EmptyList)
    }
}

fn choose<'a, T, R: Rng>(rng: &mut R, items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    items.get(rng.random_range(0..items.len()))
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::TempDir;

    use super::*;

    fn touch(dir: &Path, names: &[&str]) {
        for name in names {
            fs::write(dir.join(name), b"").unwrap();
        }
    }

    fn selector(dir: &Path, ext: &str, seed: u64) -> WallpaperSelector<StdRng> {
        WallpaperSelector::new(dir, ext, StdRng::seed_from_u64(seed))
    }

    #[test]
    fn test_list_excludes_current() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), &["b.jpg", "a.jpg", "current"]);

        let names = selector(dir.path(), "", 0).list_wallpapers().unwrap();
        assert_eq!(names, vec!["a.jpg", "b.jpg"]);
    }

    #[test]
    fn test_list_filters_extension() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), &["a.jpg", "b.JPG", "c.png", "notes.txt"]);
        fs::create_dir(dir.path().join("nested.jpg")).unwrap();

        let names = selector(dir.path(), ".jpg", 0).list_wallpapers().unwrap();
        assert_eq!(names, vec!["a.jpg", "b.JPG"]);
    }

    #[test]
    fn test_list_missing_directory() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");

        let err = selector(&missing, ".jpg", 0).list_wallpapers().unwrap_err();
        assert!(matches!(err, SelectError::DirectoryUnavailable { .. }));
        assert_eq!(err.kind(), "DirectoryUnavailable");
    }

    #[test]
    fn test_pick_explicit_joins_without_checking() {
        let selector = selector(Path::new("/walls"), ".jpg", 0);
        assert_eq!(selector.pick_explicit("sunset.jpg"), PathBuf::from("/walls/sunset.jpg"));
    }

    #[test]
    fn test_pick_random_never_returns_current() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), &["a.jpg", "b.jpg", "current"]);
        let allowed = [dir.path().join("a.jpg"), dir.path().join("b.jpg")];

        let mut seen = Vec::new();
        for seed in 0..64 {
            let picked = selector(dir.path(), "", seed).pick_random().unwrap();
            assert!(allowed.contains(&picked), "unexpected pick {}", picked.display());
            if !seen.contains(&picked) {
                seen.push(picked);
            }
        }
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn test_pick_random_empty_directory() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), &["current"]);

        let err = selector(dir.path(), ".jpg", 0).pick_random().unwrap_err();
        assert!(matches!(err, SelectError::NoWallpapers(_)));
    }

    #[test]
    fn test_curated_list_empty() {
        let mut selector = selector(Path::new("/walls"), ".jpg", 7);
        let err = selector.pick_from_curated_list(&[]).unwrap_err();
        assert!(matches!(err, SelectError::EmptyList));
    }

    #[test]
    fn test_curated_list_single_entry() {
        for seed in 0..16 {
            let mut selector = selector(Path::new("/walls"), ".jpg", seed);
            let picked = selector.pick_from_curated_list(&[PathBuf::from("a")]).unwrap();
            assert_eq!(picked, PathBuf::from("a"));
        }
    }

    #[test]
    fn test_curated_from_names() {
        let selector = selector(Path::new("/walls"), ".jpg", 0);
        let list = selector.curated_from_names(&["a.jpg".to_string(), "b.jpg".to_string()]);
        assert_eq!(list, vec![PathBuf::from("/walls/a.jpg"), PathBuf::from("/walls/b.jpg")]);
    }
}
