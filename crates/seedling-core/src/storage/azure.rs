//! Azure Blob Storage / ADLS Gen2 backend, including Microsoft Fabric OneLake.

use object_store::azure::{AzureConfigKey, MicrosoftAzureBuilder};
use object_store::path::Path;
use object_store::{ObjectStore, RetryConfig};
use snafu::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{AzureConfigSnafu, StorageError};

use super::{BackendConfig, StorageProvider};

/// Azure storage configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AzureConfig {
    pub account: String,
    pub container: String,
    pub key: Option<Path>,
    /// Address the account through the OneLake (Fabric) endpoint.
    pub fabric: bool,
}

impl AzureConfig {
    fn host(&self) -> String {
        if self.fabric {
            "onelake.dfs.fabric.microsoft.com".to_string()
        } else {
            format!("{}.dfs.core.windows.net", self.account)
        }
    }
}

impl StorageProvider {
    pub(super) fn construct_azure(
        config: AzureConfig,
        mut options: HashMap<String, String>,
    ) -> Result<Self, StorageError> {
        let mut builder = MicrosoftAzureBuilder::from_env()
            .with_account(&config.account)
            .with_container_name(&config.container)
            .with_retry(RetryConfig::default());

        for (key, value) in &options {
            let key: AzureConfigKey = key.parse().context(AzureConfigSnafu)?;
            builder = builder.with_config(key, value.clone());
        }

        if config.fabric {
            builder = builder.with_use_fabric_endpoint(true);
            options
                .entry("use_fabric_endpoint".to_string())
                .or_insert_with(|| "true".to_string());
        }

        let object_store: Arc<dyn ObjectStore> =
            Arc::new(builder.build().context(AzureConfigSnafu)?);

        let base = format!("abfss://{}@{}", config.container, config.host());
        let root = match &config.key {
            Some(key) => format!("{base}/{key}"),
            None => base,
        };

        Ok(Self {
            config: BackendConfig::Azure(config),
            object_store,
            root_url: root,
            storage_options: options,
        })
    }
}
