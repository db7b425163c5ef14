//! Multi-cloud storage abstraction for the warehouse root.
//!
//! A [`StorageProvider`] is rooted at the warehouse URL. All paths passed to
//! it are relative to that root, and the URLs it hands out for Delta Lake are
//! built from the same root so both views of the warehouse agree.

mod azure;
mod gcs;
mod local;
mod s3;
mod url_parser;

pub use azure::AzureConfig;
pub use gcs::GcsConfig;
pub use local::LocalConfig;
pub use s3::S3Config;
pub use url_parser::BackendConfig;

use bytes::Bytes;
use futures::TryStreamExt;
use object_store::path::Path;
use object_store::{Attribute, AttributeValue, Attributes, ObjectStore, PutOptions, PutPayload};
use snafu::prelude::*;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use crate::emit;
use crate::error::{ObjectStoreSnafu, StorageError};
use crate::metrics::events::{RequestStatus, StorageOperation, StorageRequest};

/// A reference-counted storage provider.
pub type StorageProviderRef = Arc<StorageProvider>;

/// Storage provider that abstracts over different cloud storage backends.
#[derive(Clone)]
pub struct StorageProvider {
    pub(crate) config: BackendConfig,
    pub(crate) object_store: Arc<dyn ObjectStore>,
    pub(crate) root_url: String,
    pub(crate) storage_options: HashMap<String, String>,
}

impl std::fmt::Debug for StorageProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StorageProvider<{}>", self.root_url)
    }
}

impl StorageProvider {
    /// Create a storage provider for the given URL with storage options.
    pub async fn for_url_with_options(
        url: &str,
        options: HashMap<String, String>,
    ) -> Result<Self, StorageError> {
        match BackendConfig::parse_url(url)? {
            BackendConfig::S3(config) => Self::construct_s3(config, options),
            BackendConfig::Gcs(config) => Self::construct_gcs(config, options),
            BackendConfig::Azure(config) => Self::construct_azure(config, options),
            BackendConfig::Local(config) => Self::construct_local(config, options).await,
        }
    }

    /// Qualify a path with the configured key prefix.
    pub fn qualify_path<'a>(&self, path: &'a Path) -> Cow<'a, Path> {
        match self.config.key() {
            Some(prefix) => Cow::Owned(prefix.parts().chain(path.parts()).collect()),
            None => Cow::Borrowed(path),
        }
    }

    /// URL of a location below the root, in the form Delta Lake expects.
    pub fn url_for(&self, relative: &str) -> String {
        let relative = relative.trim_matches('/');
        if relative.is_empty() {
            self.root_url.clone()
        } else {
            format!("{}/{relative}", self.root_url)
        }
    }

    /// Local filesystem directory of a location below the root, if the
    /// provider is backed by the local filesystem.
    pub fn local_dir_for(&self, relative: &str) -> Option<std::path::PathBuf> {
        match &self.config {
            BackendConfig::Local(local) => {
                Some(std::path::Path::new(&local.path).join(relative.trim_matches('/')))
            }
            _ => None,
        }
    }

    /// List every object under `prefix`.
    ///
    /// Returned paths are relative to the root. A prefix that does not exist
    /// yields an empty list.
    pub async fn list_prefix(&self, prefix: &str) -> Result<Vec<Path>, StorageError> {
        let prefix_path = Path::from(prefix);
        let full_prefix = self.qualify_path(&prefix_path);
        let key_part_count = self
            .config
            .key()
            .map(|key| key.parts().count())
            .unwrap_or_default();

        let start = Instant::now();
        let result: Result<Vec<Path>, object_store::Error> = self
            .object_store
            .list(Some(&full_prefix))
            .map_ok(|meta| -> Path { meta.location.parts().skip(key_part_count).collect() })
            .try_collect()
            .await;

        emit!(StorageRequest {
            operation: StorageOperation::List,
            status: RequestStatus::from_result(&result),
            duration: start.elapsed(),
        });

        match result {
            Ok(paths) => {
                debug!("Listed {} object(s) under {}", paths.len(), full_prefix);
                Ok(paths)
            }
            Err(object_store::Error::NotFound { .. }) => Ok(Vec::new()),
            Err(source) => Err(StorageError::ObjectStore { source }),
        }
    }

    /// Get the contents of a file.
    pub async fn get(&self, path: impl Into<Path>) -> Result<Bytes, StorageError> {
        let path = path.into();
        let start = Instant::now();

        let result = match self.object_store.get(&self.qualify_path(&path)).await {
            Ok(response) => response.bytes().await,
            Err(err) => Err(err),
        };

        emit!(StorageRequest {
            operation: StorageOperation::Get,
            status: RequestStatus::from_result(&result),
            duration: start.elapsed(),
        });

        result.context(ObjectStoreSnafu)
    }

    /// Put a Parquet file to a path with the correct content type.
    ///
    /// Local filesystem doesn't support attributes, so they are skipped there.
    pub async fn put_parquet(&self, path: &Path, bytes: Bytes) -> Result<(), StorageError> {
        let opts = if matches!(self.config, BackendConfig::Local(_)) {
            PutOptions::default()
        } else {
            PutOptions {
                attributes: Attributes::from_iter([(
                    Attribute::ContentType,
                    AttributeValue::from("application/vnd.apache.parquet"),
                )]),
                ..Default::default()
            }
        };

        let path = self.qualify_path(path);
        let start = Instant::now();
        let result = self
            .object_store
            .put_opts(&path, PutPayload::from(bytes), opts)
            .await;

        emit!(StorageRequest {
            operation: StorageOperation::Put,
            status: RequestStatus::from_result(&result),
            duration: start.elapsed(),
        });

        result.context(ObjectStoreSnafu)?;
        Ok(())
    }

    /// Get storage options for external integrations (e.g., Delta Lake).
    pub fn storage_options(&self) -> &HashMap<String, String> {
        &self.storage_options
    }

    /// Get the backend configuration.
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// URL of the root location.
    pub fn root_url(&self) -> &str {
        &self.root_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn local_provider(dir: &TempDir) -> StorageProvider {
        StorageProvider::for_url_with_options(dir.path().to_str().unwrap(), HashMap::new())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_put_get_and_list() {
        let dir = TempDir::new().unwrap();
        let storage = local_provider(&dir).await;

        storage
            .put_parquet(
                &Path::from("dbo/posting_type/part-0.parquet"),
                Bytes::from_static(b"PAR1"),
            )
            .await
            .unwrap();

        let bytes = storage.get("dbo/posting_type/part-0.parquet").await.unwrap();
        assert_eq!(bytes.as_ref(), b"PAR1");

        let listed = storage.list_prefix("dbo").await.unwrap();
        assert_eq!(listed, vec![Path::from("dbo/posting_type/part-0.parquet")]);
    }

    #[tokio::test]
    async fn test_list_missing_prefix_is_empty() {
        let dir = TempDir::new().unwrap();
        let storage = local_provider(&dir).await;

        assert!(storage.list_prefix("missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        let storage = local_provider(&dir).await;

        let err = storage.get("dbo/nothing.parquet").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_urls_below_root() {
        let dir = TempDir::new().unwrap();
        let storage = local_provider(&dir).await;
        let root = dir.path().to_str().unwrap().trim_end_matches('/');

        assert_eq!(storage.root_url(), format!("file://{root}"));
        assert_eq!(
            storage.url_for("dbo/journal_entry"),
            format!("file://{root}/dbo/journal_entry")
        );
        assert_eq!(
            storage.local_dir_for("/dbo/journal_entry/").unwrap(),
            dir.path().join("dbo/journal_entry")
        );
    }

    #[test]
    fn test_qualify_path_with_key() {
        let storage = StorageProvider {
            config: BackendConfig::parse_url("s3://lakehouse/bronze").unwrap(),
            object_store: Arc::new(object_store::memory::InMemory::new()),
            root_url: "s3://lakehouse/bronze".to_string(),
            storage_options: HashMap::new(),
        };

        let path = Path::from("dbo/cost_centre");
        assert_eq!(
            storage.qualify_path(&path).as_ref(),
            &Path::from("bronze/dbo/cost_centre")
        );
        assert_eq!(
            storage.url_for("dbo/cost_centre"),
            "s3://lakehouse/bronze/dbo/cost_centre"
        );
    }
}
