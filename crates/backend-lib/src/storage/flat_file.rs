//! Flat-file backend: one JSON document per collection under a data directory.
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::{fs as tokio_fs, io::AsyncWriteExt};

use super::{Collection, Persistence, TableStorage, Tables};
use crate::error::AppError;

const WRITE_CHECK_FILE: &str = ".write-check";

/// Persistence into a directory of JSON files
#[derive(Debug, Clone)]
pub struct JsonDirectory {
    root: PathBuf,
}

impl JsonDirectory {
    /// Write through a temp file and rename, so readers never see half a file
    async fn write_atomic(&self, file_name: &str, contents: &str) -> Result<(), AppError> {
        let path = self.root.join(file_name);
        let tmp = self.root.join(format!("{file_name}.tmp"));

        let mut file = tokio_fs::File::create(&tmp).await?;
        file.write_all(contents.as_bytes()).await?;
        file.sync_all().await?;
        drop(file);

        tokio_fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

#[async_trait]
impl Persistence for JsonDirectory {
    const DURABLE: bool = true;
    const NAME: &'static str = "flat_file";

    async fn persist(&self, dirty: Vec<(Collection, String)>) -> Result<(), AppError> {
        for (collection, json) in dirty {
            if let Err(e) = self.write_atomic(collection.file_name(), &json).await {
                tracing::error!(
                    collection = collection.file_name(),
                    error = %e,
                    "failed to persist collection"
                );
                return Err(e);
            }
        }
        Ok(())
    }

    async fn check_writable(&self) -> Result<(), AppError> {
        let path = self.root.join(WRITE_CHECK_FILE);
        tokio_fs::write(&path, b"ok").await?;
        tokio_fs::remove_file(&path).await?;
        Ok(())
    }
}

pub type FlatFileStorage = TableStorage<JsonDirectory>;

impl FlatFileStorage {
    /// Open (or create) a data directory and load every collection in it
    pub async fn open<P: AsRef<Path>>(root: P) -> Result<Self, AppError> {
        let root = root.as_ref().to_path_buf();
        tokio_fs::create_dir_all(&root).await?;

        let mut tables = Tables::default();
        for collection in Collection::ALL {
            let path = root.join(collection.file_name());
            if !tokio_fs::try_exists(&path).await? {
                continue;
            }
            let content = tokio_fs::read_to_string(&path).await?;
            tables.load_json(collection, &content)?;
        }

        Ok(Self::with_tables(tables, JsonDirectory { root }))
    }
}
