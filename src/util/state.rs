use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::trace;

use super::fs::safe_write_all;

#[derive(Debug, Error)]
pub enum ReadWriteError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

/// Directory holding the client's durable state (the session record).
///
/// Resolves to the XDG state directory when available, falling back to
/// `~/.local/state`.
pub fn default_state_dir() -> PathBuf {
    let dir = if let Some(state_dir) = dirs::state_dir() {
        state_dir
    } else {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".local")
            .join("state")
    };
    dir.join(env!("CARGO_PKG_NAME"))
}

async fn ensure_parent(path: &Path) -> io::Result<()> {
    if let Some(dir) = path.parent() {
        let res = fs::create_dir_all(dir).await;
        // create_dir will error if the directory already exists.
        // check if that is the reason it failed.
        if res.is_err() && !std::fs::exists(dir).unwrap_or(false) {
            return res;
        }
    }
    Ok(())
}

/// Durably store a JSON record at the given path.
pub async fn store<P: AsRef<Path>, V: Serialize>(path: P, value: &V) -> Result<(), ReadWriteError> {
    let path = path.as_ref().to_path_buf();
    trace!("storing local state: {}", path.display());
    let buf = serde_json::to_vec(value)?;

    // make sure that the file directory exists
    ensure_parent(&path).await?;

    tokio::task::spawn_blocking(move || safe_write_all(path, &buf))
        .await
        .expect("safe_write_all should not panic")?;
    Ok(())
}

/// Read a JSON record, returning `None` when no record exists.
pub async fn read<P: AsRef<Path>, V: DeserializeOwned>(
    path: P,
) -> Result<Option<V>, ReadWriteError> {
    let path = path.as_ref();
    trace!("read local state {}", path.display());

    match fs::read_to_string(path).await {
        Ok(contents) => {
            // We have a previously saved record
            let value = serde_json::from_str::<V>(&contents)?;
            Ok(Some(value))
        }
        Err(err) => match err.kind() {
            // We don't have a saved record
            io::ErrorKind::NotFound => Ok(None),

            // We have a record but failed to load it
            _ => Err(err.into()),
        },
    }
}

/// Remove a stored record. Removing a record that does not exist is not
/// an error.
pub async fn remove<P: AsRef<Path>>(path: P) -> io::Result<()> {
    let path = path.as_ref();
    trace!("removing local state {}", path.display());
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Record {
        token: String,
    }

    #[tokio::test]
    async fn it_round_trips_a_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let record = Record {
            token: "abc".into(),
        };
        store(&path, &record).await.unwrap();

        let loaded: Option<Record> = read(&path).await.unwrap();
        assert_eq!(loaded, Some(record));
    }

    #[tokio::test]
    async fn it_returns_none_for_a_missing_record() {
        let dir = tempfile::tempdir().unwrap();
        let loaded: Option<Record> = read(dir.path().join("missing.json")).await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn it_tolerates_removing_a_missing_record() {
        let dir = tempfile::tempdir().unwrap();
        remove(dir.path().join("missing.json")).await.unwrap();
    }
}
