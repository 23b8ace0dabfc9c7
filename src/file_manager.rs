//! # File Management Module
//!
//! Questo modulo gestisce le operazioni sui file richieste dal motore.
//!
//! ## Operazioni sui file:
//! - `list_files()`: file di una directory (non ricorsivo), in ordine
//!   lessicografico per nome, così l'ordine non dipende dal filesystem
//! - `remove_if_exists()`: rimozione che tollera un target già assente
//! - `format_size()`: bytes in formato leggibile (KB, MB, GB)

use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;
use walkdir::WalkDir;

/// Manages file operations and discovery
pub struct FileManager;

impl FileManager {
    /// Regular files directly inside `dir`, sorted by file name
    pub fn list_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| {
                e.into_io_error()
                    .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "directory walk failed"))
            })?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }

        Ok(files)
    }

    /// Delete `path`; an already missing file is not an error.
    /// Returns whether something was removed.
    pub async fn remove_if_exists(path: &Path) -> io::Result<bool> {
        match fs::remove_file(path).await {
            Ok(()) => {
                debug!("Deleted file: {}", path.display());
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Already absent: {}", path.display());
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Size of a file, if it exists
    pub async fn file_size(path: &Path) -> Option<u64> {
        fs::metadata(path).await.ok().map(|m| m.len())
    }

    /// Get human-readable file size
    pub fn format_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_list_files_sorted_and_flat() {
        let dir = TempDir::new().unwrap();
        for name in ["b.png", "a.jpg", "C.txt"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("deep.jpg"), b"x").unwrap();

        let names: Vec<String> = FileManager::list_files(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["C.txt", "a.jpg", "b.png"]);
    }

    #[test]
    fn test_list_files_missing_dir() {
        assert!(FileManager::list_files(Path::new("/definitely/not/here")).is_err());
    }

    #[tokio::test]
    async fn test_remove_if_exists_tolerates_absence() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ffmpeg2pass-0.log");
        std::fs::write(&path, b"stats").unwrap();

        assert!(FileManager::remove_if_exists(&path).await.unwrap());
        assert!(!path.exists());
        assert!(!FileManager::remove_if_exists(&path).await.unwrap());
    }

    #[test]
    fn test_format_size() {
        assert_eq!(FileManager::format_size(512), "512 B");
        assert_eq!(FileManager::format_size(9 * 1024 * 1024), "9.00 MB");
        assert_eq!(FileManager::format_size(1536), "1.50 KB");
    }
}
