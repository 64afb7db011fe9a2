use std::path::Path;

use tempfile::NamedTempFile;

/// Write `content` to `target` through a sibling temp file so readers never
/// observe a half-written session.
pub async fn atomic_write_async(target: &Path, content: &str) -> std::io::Result<()> {
    let parent = target.parent().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "target has no parent")
    })?;
    tokio::fs::create_dir_all(parent).await?;

    let temp = NamedTempFile::new_in(parent)?;
    tokio::fs::write(temp.path(), content).await?;
    temp.persist(target)?;
    Ok(())
}

/// `Ok(None)` when the file does not exist.
pub async fn read_optional(target: &Path) -> std::io::Result<Option<String>> {
    match tokio::fs::read_to_string(target).await {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}
