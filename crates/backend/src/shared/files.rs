use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};

static FILES_DIR: OnceCell<PathBuf> = OnceCell::new();

/// Remember the uploaded-files directory and make sure it exists.
pub fn initialize_files_dir(dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir)?;
    FILES_DIR
        .set(dir.to_path_buf())
        .map_err(|_| anyhow::anyhow!("Files directory already initialized"))?;
    tracing::info!("Files directory: {}", dir.display());
    Ok(())
}

pub fn get_files_dir() -> &'static Path {
    FILES_DIR
        .get()
        .expect("Files directory has not been initialized")
}

/// Store an uploaded document under a fresh name, returning the
/// relative URL the client can later download it from.
pub async fn save_file(original_name: &str, bytes: &[u8]) -> anyhow::Result<String> {
    let safe_name = sanitize_file_name(original_name);
    let stored_name = format!("{}_{}", uuid::Uuid::new_v4(), safe_name);
    let path = get_files_dir().join(&stored_name);
    tokio::fs::write(&path, bytes).await?;
    Ok(format!("/api/files/download/{}", stored_name))
}

/// Keep only characters that are safe in a file name; blocks traversal.
fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    cleaned.trim_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_traversal() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "_.._etc_passwd");
        assert_eq!(sanitize_file_name("bill_2024-03.pdf"), "bill_2024-03.pdf");
    }
}
