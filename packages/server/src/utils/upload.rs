use std::path::{Path, PathBuf};

use axum::extract::multipart::Field;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::AppError;

/// A multipart file persisted under the upload directory.
pub struct StoredFile {
    /// Path relative to the upload directory, e.g. `videos/<name>`.
    /// This is what gets persisted on the entity.
    pub relative_path: String,
    pub absolute_path: PathBuf,
    pub size: u64,
}

/// Strip anything path-like from a client-supplied filename.
fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect();
    if cleaned.trim_matches('.').is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

/// Stream a multipart field to `<base_dir>/<subdir>`, enforcing `max_size`.
///
/// Files get a uuid prefix so concurrent uploads of the same filename
/// never collide. The partial file is removed when the stream errors
/// out or overruns the size limit.
pub async fn save_field(
    mut field: Field<'_>,
    base_dir: &Path,
    subdir: &str,
    max_size: u64,
) -> Result<StoredFile, AppError> {
    let original = field
        .file_name()
        .map(sanitize_filename)
        .unwrap_or_else(|| "upload".to_string());
    let filename = format!("{}-{}", Uuid::new_v4(), original);
    let dest = base_dir.join(subdir).join(&filename);

    let result = async {
        let mut file = tokio::fs::File::create(&dest)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create upload file: {e}")))?;

        let mut total: u64 = 0;
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
        {
            total += chunk.len() as u64;
            if total > max_size {
                return Err(AppError::Validation(format!(
                    "File exceeds maximum size of {max_size} bytes"
                )));
            }
            file.write_all(&chunk)
                .await
                .map_err(|e| AppError::Internal(format!("Upload write failed: {e}")))?;
        }

        file.flush()
            .await
            .map_err(|e| AppError::Internal(format!("Upload flush failed: {e}")))?;

        Ok(total)
    }
    .await;

    match result {
        Ok(size) => Ok(StoredFile {
            relative_path: format!("{subdir}/{filename}"),
            absolute_path: dest,
            size,
        }),
        Err(e) => {
            let _ = tokio::fs::remove_file(&dest).await;
            Err(e)
        }
    }
}

/// Best-effort removal of files left behind by a failed request.
pub async fn discard(files: &[&StoredFile]) {
    for f in files {
        let _ = tokio::fs::remove_file(&f.absolute_path).await;
    }
}
