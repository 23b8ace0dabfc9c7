//! # Image Staging Module
//!
//! ffmpeg legge una sequenza di immagini solo se numerata. Prima di
//! assemblare il video, ogni immagine della directory viene copiata come
//! `img-01.<ext>`, `img-02.<ext>`, ... accanto agli originali, che restano
//! intatti. Dopo l'esecuzione vengono rimosse solo queste copie.
//!
//! ## Formato:
//! Le copie mantengono l'estensione delle sorgenti, quindi la sequenza deve
//! avere un solo formato (le varianti JPEG contano come `jpg`). Directory
//! con formati misti vengono rifiutate.
//!
//! ## Ordine:
//! Lessicografico per nome file, non l'ordine (dipendente dal filesystem)
//! del listing della directory.

use crate::editor::operation::StagedCopy;
use crate::error::{Field, ValidationError};
use crate::file_manager::FileManager;
use crate::media::{MediaFile, MediaKind};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Name of the `index`-th staged copy, 1-indexed
pub fn staged_name(index: usize, extension: &str) -> String {
    format!("img-{:02}.{}", index, extension)
}

/// Numbered copies of every image of one directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSequence {
    dir: PathBuf,
    extension: String,
    copies: Vec<StagedCopy>,
}

impl ImageSequence {
    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn copies(&self) -> &[StagedCopy] {
        &self.copies
    }

    /// ffmpeg input pattern matching every staged name
    pub fn pattern(&self) -> PathBuf {
        self.dir.join(format!("img-%02d.{}", self.extension))
    }

    /// Targets of the copies, in order
    pub fn targets(&self) -> Vec<PathBuf> {
        self.copies.iter().map(|c| c.target.clone()).collect()
    }

    pub fn into_copies(self) -> Vec<StagedCopy> {
        self.copies
    }
}

/// Copies needed to turn the images of `dir` into a numbered sequence
pub fn plan_staging(dir: &Path) -> Result<ImageSequence, ValidationError> {
    if !dir.is_dir() {
        return Err(ValidationError::ImagesDirectory {
            field: Field::ImagesDirectory,
            path: dir.to_path_buf(),
            reason: "not a directory".to_string(),
        });
    }

    let files = FileManager::list_files(dir).map_err(|e| ValidationError::ImagesDirectory {
        field: Field::ImagesDirectory,
        path: dir.to_path_buf(),
        reason: e.to_string(),
    })?;

    let images: Vec<MediaFile> = files
        .into_iter()
        .map(MediaFile::new)
        .filter(|file| file.fits(MediaKind::Image))
        .collect();

    if images.is_empty() {
        return Err(ValidationError::NoImages {
            path: dir.to_path_buf(),
        });
    }

    let formats: BTreeSet<String> = images.iter().filter_map(MediaFile::format).collect();
    let extension = match formats.len() {
        1 => formats.into_iter().next().unwrap_or_default(),
        _ => {
            return Err(ValidationError::MixedImageFormats {
                path: dir.to_path_buf(),
                extensions: formats.into_iter().collect::<Vec<_>>().join(", "),
            })
        }
    };

    let copies: Vec<StagedCopy> = images
        .iter()
        .enumerate()
        .map(|(i, file)| StagedCopy {
            source: file.path().to_path_buf(),
            target: dir.join(staged_name(i + 1, &extension)),
        })
        .collect();

    // never clobber an existing file, original or leftover from an aborted run
    if let Some(conflict) = copies.iter().find(|c| c.target.exists()) {
        return Err(ValidationError::StagingConflict {
            path: conflict.target.clone(),
        });
    }

    Ok(ImageSequence {
        dir: dir.to_path_buf(),
        extension,
        copies,
    })
}

/// Performs the copies in order, stopping at the first failure.
///
/// Returns how many copies were made alongside the outcome, so the caller
/// only cleans up files this run created.
pub async fn apply(copies: &[StagedCopy]) -> (usize, std::io::Result<()>) {
    for (done, copy) in copies.iter().enumerate() {
        if fs::try_exists(&copy.target).await.unwrap_or(true) {
            return (
                done,
                Err(std::io::Error::new(
                    std::io::ErrorKind::AlreadyExists,
                    format!("staging target already exists: {}", copy.target.display()),
                )),
            );
        }

        debug!(
            "Staging {} as {}",
            copy.source.display(),
            copy.target.display()
        );
        if let Err(e) = fs::copy(&copy.source, &copy.target).await {
            // a failed copy may still leave a partial target behind
            return (done + 1, Err(e));
        }
    }
    (copies.len(), Ok(()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), name.as_bytes()).unwrap();
    }

    fn target_names(sequence: &ImageSequence) -> Vec<String> {
        sequence
            .targets()
            .iter()
            .map(|t| t.file_name().unwrap().to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_staged_name() {
        assert_eq!(staged_name(1, "jpg"), "img-01.jpg");
        assert_eq!(staged_name(12, "png"), "img-12.png");
        assert_eq!(staged_name(100, "jpg"), "img-100.jpg");
    }

    #[test]
    fn test_plan_staging_orders_by_name_and_skips_non_images() {
        let dir = TempDir::new().unwrap();
        for name in ["beach.jpg", "Alps.JPG", "notes.txt", "clip.mp4", "city.jpeg"] {
            write(dir.path(), name);
        }

        let sequence = plan_staging(dir.path()).unwrap();
        let sources: Vec<_> = sequence
            .copies()
            .iter()
            .map(|c| c.source.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(sources, vec!["Alps.JPG", "beach.jpg", "city.jpeg"]);
        assert_eq!(sequence.extension(), "jpg");
        assert_eq!(target_names(&sequence), vec!["img-01.jpg", "img-02.jpg", "img-03.jpg"]);
    }

    #[test]
    fn test_png_only_directory_keeps_png_names() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.png");
        write(dir.path(), "b.PNG");

        let sequence = plan_staging(dir.path()).unwrap();
        for copy in sequence.copies() {
            assert_eq!(
                copy.target.extension().unwrap(),
                "png",
                "staged copy of {} changed format",
                copy.source.display()
            );
        }
        assert_eq!(target_names(&sequence), vec!["img-01.png", "img-02.png"]);
        assert_eq!(sequence.pattern(), dir.path().join("img-%02d.png"));
    }

    #[test]
    fn test_mixed_formats_are_rejected() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.png");
        write(dir.path(), "b.jpg");
        write(dir.path(), "c.webp");

        match plan_staging(dir.path()) {
            Err(ValidationError::MixedImageFormats { extensions, .. }) => {
                assert_eq!(extensions, "jpg, png, webp");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_plan_staging_errors() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "readme.md");
        assert!(matches!(
            plan_staging(dir.path()),
            Err(ValidationError::NoImages { .. })
        ));

        assert!(matches!(
            plan_staging(&dir.path().join("missing")),
            Err(ValidationError::ImagesDirectory {
                field: Field::ImagesDirectory,
                ..
            })
        ));

        let conflict = TempDir::new().unwrap();
        write(conflict.path(), "a.png");
        write(conflict.path(), "img-01.png");
        assert!(matches!(
            plan_staging(conflict.path()),
            Err(ValidationError::StagingConflict { .. })
        ));
    }

    #[tokio::test]
    async fn test_apply_copies_without_touching_originals() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.jpg");
        write(dir.path(), "b.jpg");

        let sequence = plan_staging(dir.path()).unwrap();
        let (done, result) = apply(sequence.copies()).await;
        assert!(result.is_ok());
        assert_eq!(done, 2);
        assert_eq!(std::fs::read(dir.path().join("img-01.jpg")).unwrap(), b"a.jpg");
        assert_eq!(std::fs::read(dir.path().join("img-02.jpg")).unwrap(), b"b.jpg");
        assert!(dir.path().join("a.jpg").exists());
        assert!(dir.path().join("b.jpg").exists());
    }

    #[tokio::test]
    async fn test_apply_refuses_late_conflict() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.png");
        write(dir.path(), "b.png");
        let sequence = plan_staging(dir.path()).unwrap();

        // appears between planning and execution
        write(dir.path(), "img-02.png");
        let (done, result) = apply(sequence.copies()).await;
        assert_eq!(done, 1);
        assert_eq!(result.unwrap_err().kind(), std::io::ErrorKind::AlreadyExists);
        assert_eq!(std::fs::read(dir.path().join("img-02.png")).unwrap(), b"img-02.png");
    }
}
