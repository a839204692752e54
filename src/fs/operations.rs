use std::{
    ffi::OsString,
    io::{ErrorKind, SeekFrom},
    path::{Path, PathBuf},
};

use fs4::tokio::AsyncFileExt;
use tokio::{
    fs::File,
    io::{self, AsyncReadExt, AsyncSeekExt, AsyncWriteExt},
};

/// Reads the whole file under a shared lock. A missing file is not an error.
pub async fn read_locked(path: &Path) -> Result<Option<String>, io::Error> {
    let mut file = match File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    file.lock_shared()?;
    let mut contents = String::new();
    let result = file.read_to_string(&mut contents).await;
    file.unlock_async().await?;
    result?;

    Ok(Some(contents))
}

/// Replaces file contents under an exclusive lock. The file is truncated only after the lock is
/// held so readers never observe a half-truncated file from another writer.
pub async fn overwrite_locked(path: &Path, contents: &[u8]) -> Result<(), io::Error> {
    let mut file = File::options()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .await?;

    // Semi-safe acquire-release for a file
    file.lock_exclusive()?;
    let result = overwrite_with_file(&mut file, contents).await;
    file.unlock_async().await?;
    result
}

async fn overwrite_with_file(file: &mut File, contents: &[u8]) -> Result<(), io::Error> {
    file.set_len(0).await?;
    file.seek(SeekFrom::Start(0)).await?;
    file.write_all(contents).await?;
    file.flush().await?;
    file.sync_data().await
}

/// `<original>.backup.<stamp>`, next to the original.
pub fn backup_path(path: &Path, stamp: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".backup.");
    name.push(stamp);
    PathBuf::from(name)
}

pub async fn copy_to_backup(path: &Path, stamp: &str) -> Result<PathBuf, io::Error> {
    let backup = backup_path(path, stamp);
    tokio::fs::copy(path, &backup).await?;
    Ok(backup)
}
