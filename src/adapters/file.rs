//! File-Backed Order Repository
//!
//! Implements the `OrderRepository` port as one JSON document per order
//! under a data directory. Writes go to a temporary file that is renamed
//! into place, so readers never observe a partially written record.

use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::domain::{Order, OrderRepository};
use crate::error::{Error, Result};

const RECORD_EXTENSION: &str = "json";

/// Directory of `<order_uid>.json` files
#[derive(Debug, Clone)]
pub struct FileOrderRepository {
    root: PathBuf,
}

impl FileOrderRepository {
    /// Open (creating if needed) a repository rooted at `root`.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        debug!(path = %root.display(), "Opened file order repository");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File holding `order_uid`, or `None` when the id cannot name a file
    /// in the store directory. Such ids can never be stored.
    fn record_path(&self, order_uid: &str) -> Option<PathBuf> {
        if order_uid.is_empty()
            || order_uid.starts_with('.')
            || order_uid.contains(|c: char| matches!(c, '/' | '\\' | '\0'))
        {
            return None;
        }
        Some(
            self.root
                .join(format!("{}.{}", order_uid, RECORD_EXTENSION)),
        )
    }

    async fn read_record(path: &Path) -> Result<Order> {
        let bytes = fs::read(path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn list_records(&self) -> Result<Vec<Order>> {
        let mut orders = Vec::new();
        let mut dir = fs::read_dir(&self.root).await?;

        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            let is_record = path.extension().is_some_and(|ext| ext == RECORD_EXTENSION)
                && !entry.file_name().to_string_lossy().starts_with('.');
            if !is_record {
                continue;
            }

            match Self::read_record(&path).await {
                Ok(order) => orders.push(order),
                // Removed between listing and reading
                Err(Error::Io(e)) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }

        Ok(orders)
    }
}

/// Race `fut` against the token.
async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        result = fut => result,
    }
}

fn not_found(order_uid: &str) -> Error {
    Error::OrderNotFound {
        order_uid: order_uid.to_string(),
    }
}

#[async_trait]
impl OrderRepository for FileOrderRepository {
    #[instrument(skip(self, cancel, order), fields(order_uid = %order.order_uid))]
    async fn save(&self, cancel: &CancellationToken, order: &Order) -> Result<()> {
        let path = self.record_path(&order.order_uid).ok_or_else(|| {
            Error::InvalidArgument(format!(
                "order_uid not usable as a file name: {:?}",
                order.order_uid
            ))
        })?;
        let tmp = self.root.join(format!(
            ".{}.{}.tmp",
            order.order_uid,
            uuid::Uuid::new_v4()
        ));
        let bytes = serde_json::to_vec(order)?;

        let result = cancellable(cancel, async {
            fs::write(&tmp, &bytes).await?;
            fs::rename(&tmp, &path).await?;
            Ok(())
        })
        .await;

        if result.is_err() {
            if let Err(e) = fs::remove_file(&tmp).await {
                if e.kind() != ErrorKind::NotFound {
                    warn!(path = %tmp.display(), error = %e, "Failed to remove temp record");
                }
            }
        }
        result
    }

    async fn get_by_id(&self, cancel: &CancellationToken, order_uid: &str) -> Result<Order> {
        let path = self
            .record_path(order_uid)
            .ok_or_else(|| not_found(order_uid))?;
        cancellable(cancel, async {
            match Self::read_record(&path).await {
                Err(Error::Io(e)) if e.kind() == ErrorKind::NotFound => Err(not_found(order_uid)),
                other => other,
            }
        })
        .await
    }

    async fn get_all(&self, cancel: &CancellationToken) -> Result<Vec<Order>> {
        cancellable(cancel, self.list_records()).await
    }

    async fn delete(&self, cancel: &CancellationToken, order_uid: &str) -> Result<()> {
        let path = self
            .record_path(order_uid)
            .ok_or_else(|| not_found(order_uid))?;
        cancellable(cancel, async {
            match fs::remove_file(&path).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Err(not_found(order_uid)),
                Err(e) => Err(e.into()),
            }
        })
        .await
    }

    async fn count(&self, cancel: &CancellationToken) -> Result<usize> {
        cancellable(cancel, async {
            let mut dir = fs::read_dir(&self.root).await?;
            let mut count = 0;
            while let Some(entry) = dir.next_entry().await? {
                let path = entry.path();
                if path.extension().is_some_and(|ext| ext == RECORD_EXTENSION)
                    && !entry.file_name().to_string_lossy().starts_with('.')
                {
                    count += 1;
                }
            }
            Ok(count)
        })
        .await
    }
}
