//! Attachment storage for claim submissions.

use rand::Rng;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const MAX_FILES: usize = 10;
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;
pub const ALLOWED_EXTENSIONS: [&str; 9] = [
    "jpeg", "jpg", "png", "gif", "pdf", "doc", "docx", "txt", "xlsx",
];

/// A file part received with a submission, not yet written to disk.
#[derive(Debug, Clone)]
pub struct PendingUpload {
    pub original_name: String,
    pub bytes: Vec<u8>,
}

impl PendingUpload {
    pub fn extension(&self) -> Option<String> {
        extension_of(&self.original_name)
    }

    pub fn is_allowed(&self) -> bool {
        self.extension()
            .is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub filename: String,
    pub original_name: String,
    pub size: usize,
    pub path: PathBuf,
}

fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

/// `files-<millis>-<random>.<ext>`
pub fn stored_name(original_name: &str, millis: i64) -> String {
    let suffix: u32 = rand::rng().random_range(0..1_000_000_000);
    match extension_of(original_name) {
        Some(ext) => format!("files-{millis}-{suffix}.{ext}"),
        None => format!("files-{millis}-{suffix}"),
    }
}

/// Writes every upload under `dir`. On the first failure the files already
/// written are removed again.
pub async fn save_all(dir: &Path, uploads: Vec<PendingUpload>) -> std::io::Result<Vec<StoredFile>> {
    if uploads.is_empty() {
        return Ok(Vec::new());
    }
    tokio::fs::create_dir_all(dir).await?;

    let mut stored = Vec::with_capacity(uploads.len());
    for upload in uploads {
        let filename = stored_name(&upload.original_name, chrono::Utc::now().timestamp_millis());
        let path = dir.join(&filename);
        if let Err(e) = tokio::fs::write(&path, &upload.bytes).await {
            remove_all(&stored).await;
            return Err(e);
        }
        debug!(filename = %filename, size = upload.bytes.len(), "Stored attachment");
        stored.push(StoredFile {
            filename,
            original_name: upload.original_name,
            size: upload.bytes.len(),
            path,
        });
    }
    Ok(stored)
}

pub async fn remove_all(files: &[StoredFile]) {
    for file in files {
        if let Err(e) = tokio::fs::remove_file(&file.path).await {
            warn!(filename = %file.filename, error = %e, "Failed to remove attachment");
        }
    }
}

/// Maps a requested file name to a path inside `dir`.
///
/// Returns `None` for anything that is not a plain file name.
pub fn resolve_download(dir: &Path, filename: &str) -> Option<PathBuf> {
    let plain = !filename.is_empty()
        && !filename.starts_with('.')
        && !filename.contains(['/', '\\', '\0'])
        && !filename.contains("..");
    plain.then(|| dir.join(filename))
}

pub fn content_type_for(filename: &str) -> &'static str {
    match extension_of(filename).as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("pdf") => "application/pdf",
        Some("doc") => "application/msword",
        Some("docx") => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str) -> PendingUpload {
        PendingUpload {
            original_name: name.to_string(),
            bytes: b"data".to_vec(),
        }
    }

    #[test]
    fn extension_allowlist_is_case_insensitive() {
        assert!(upload("photo.JPG").is_allowed());
        assert!(upload("estimate.xlsx").is_allowed());
        assert!(!upload("run.exe").is_allowed());
        assert!(!upload("README").is_allowed());
    }

    #[test]
    fn stored_names_keep_the_extension() {
        let name = stored_name("Damage Photo.PNG", 1_700_000_000_000);
        assert!(name.starts_with("files-1700000000000-"));
        assert!(name.ends_with(".png"));
    }

    #[test]
    fn downloads_reject_anything_but_plain_names() {
        let dir = Path::new("/srv/uploads");
        assert_eq!(
            resolve_download(dir, "files-1-2.pdf"),
            Some(dir.join("files-1-2.pdf"))
        );
        assert_eq!(resolve_download(dir, "../secret"), None);
        assert_eq!(resolve_download(dir, "a/b.pdf"), None);
        assert_eq!(resolve_download(dir, "a\\b.pdf"), None);
        assert_eq!(resolve_download(dir, ".env"), None);
        assert_eq!(resolve_download(dir, ""), None);
    }

    #[tokio::test]
    async fn save_and_remove_round_trip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let stored = save_all(dir.path(), vec![upload("a.txt"), upload("b.pdf")])
            .await
            .unwrap();

        assert_eq!(stored.len(), 2);
        assert!(stored.iter().all(|f| f.path.exists() && f.size == 4));

        remove_all(&stored).await;
        assert!(stored.iter().all(|f| !f.path.exists()));
    }
}
