use color_eyre::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Log file written by the tracing appender.
pub const LOG_FILE: &str = "genre-trends.log";

/// Registry of known cache files
const CACHE_FILES: &[&str] = &[LOG_FILE];

/// Manages cache directory and cache file operations
#[derive(Clone, Debug)]
pub struct CacheManager {
    pub(crate) cache_dir: PathBuf,
}

impl CacheManager {
    /// Create a CacheManager with a custom cache directory (primarily for testing)
    pub fn with_dir(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    /// Create a new CacheManager for the given app name
    pub fn new(app_name: &str) -> Result<Self> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| color_eyre::eyre::eyre!("Could not determine cache directory"))?
            .join(app_name);

        Ok(Self { cache_dir })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Get path to a specific cache file
    pub fn cache_file(&self, filename: &str) -> PathBuf {
        self.cache_dir.join(filename)
    }

    pub fn ensure_cache_dir(&self) -> Result<()> {
        if !self.cache_dir.exists() {
            fs::create_dir_all(&self.cache_dir)?;
        }
        Ok(())
    }

    /// Clear all registered cache files. Returns how many were removed.
    pub fn clear_all(&self) -> Result<usize> {
        let mut removed = 0;
        for filename in CACHE_FILES {
            let file_path = self.cache_file(filename);
            if file_path.exists() {
                fs::remove_file(&file_path)?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_clear_all_removes_log() {
        let dir = TempDir::new().unwrap();
        let cache = CacheManager::with_dir(dir.path().join("genre-trends"));
        cache.ensure_cache_dir().unwrap();
        fs::write(cache.cache_file(LOG_FILE), "line\n").unwrap();
        fs::write(cache.cache_file("unrelated.txt"), "keep").unwrap();

        assert_eq!(cache.clear_all().unwrap(), 1);
        assert!(!cache.cache_file(LOG_FILE).exists());
        assert!(cache.cache_file("unrelated.txt").exists());
    }

    #[test]
    fn test_clear_all_on_missing_dir() {
        let dir = TempDir::new().unwrap();
        let cache = CacheManager::with_dir(dir.path().join("absent"));
        assert_eq!(cache.clear_all().unwrap(), 0);
    }
}
