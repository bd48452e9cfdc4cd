// Replace-by-rename writes: readers never observe a half-written document

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Stage `contents` in a temp file next to `path`, fsync it, then rename over `path`
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let parent = parent_dir(path);
    std::fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(contents)?;
    tmp.as_file_mut().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// [`write_atomic`] on the blocking pool
pub(crate) async fn write_atomic_async(path: &Path, contents: &[u8]) -> io::Result<()> {
    let path: PathBuf = path.to_path_buf();
    let contents = contents.to_vec();
    tokio::task::spawn_blocking(move || write_atomic(&path, &contents))
        .await
        .map_err(io::Error::other)?
}
