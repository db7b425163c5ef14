//! URL parsing for storage backends.
//!
//! Extracts backend configuration from the warehouse URL (S3, GCS, Azure,
//! OneLake or local filesystem).

use object_store::path::Path;
use regex::{Captures, Regex};
use std::sync::LazyLock;

use crate::error::{InvalidUrlSnafu, StorageError};

use super::{AzureConfig, GcsConfig, LocalConfig, S3Config};

const S3_PATH: &str =
    r"^https://s3\.(?P<region>[\w\-]+)\.amazonaws\.com/(?P<bucket>[a-z0-9\-\.]+)(/(?P<key>.+))?$";
const S3_VIRTUAL: &str =
    r"^https://(?P<bucket>[a-z0-9\-\.]+)\.s3\.(?P<region>[\w\-]+)\.amazonaws\.com(/(?P<key>.+))?$";
const S3_URL: &str = r"^[sS]3[aA]?://(?P<bucket>[a-z0-9\-\.]+)(/(?P<key>.+))?$";
const S3_ENDPOINT_URL: &str = r"^[sS]3[aA]?::(?<protocol>https?)://(?P<endpoint>[^:/]+):(?<port>\d+)/(?P<bucket>[a-z0-9\-\.]+)(/(?P<key>.+))?$";

const GCS_VIRTUAL: &str =
    r"^https://(?P<bucket>[a-z0-9\-_\.]+)\.storage\.googleapis\.com(/(?P<key>.+))?$";
const GCS_PATH: &str =
    r"^https://storage\.googleapis\.com/(?P<bucket>[a-z0-9\-_\.]+)(/(?P<key>.+))?$";
const GCS_URL: &str = r"^[gG][sS]://(?P<bucket>[a-z0-9\-\._]+)(/(?P<key>.+))?$";

const ONELAKE_URL: &str =
    r"^abfss?://(?P<container>[^@/]+)@onelake\.dfs\.fabric\.microsoft\.com(/(?P<key>.+))?$";
const ABFS_URL: &str = r"^abfss?://(?P<container>[a-z0-9\-]+)@(?P<account>[a-z0-9]+)\.dfs\.core\.windows\.net(/(?P<key>.+))?$";
const AZURE_HTTPS: &str = r"^https://(?P<account>[a-z0-9]+)\.(blob|dfs)\.core\.windows\.net/(?P<container>[a-z0-9\-]+)(/(?P<key>.+))?$";

const FILE_URI: &str = r"^file://(?P<path>.*)$";
const FILE_URL: &str = r"^file:(?P<path>.*)$";
const FILE_PATH: &str = r"^/(?P<path>.*)$";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Backend {
    S3,
    Gcs,
    OneLake,
    Azure,
    Local,
}

/// Matchers in priority order. OneLake must be tried before generic ABFS.
static MATCHERS: LazyLock<Vec<(Backend, Vec<Regex>)>> = LazyLock::new(|| {
    let compile = |patterns: &[&str]| -> Vec<Regex> {
        patterns
            .iter()
            .map(|p| Regex::new(p).expect("storage URL pattern is a valid regex"))
            .collect()
    };

    vec![
        (
            Backend::S3,
            compile(&[S3_PATH, S3_VIRTUAL, S3_ENDPOINT_URL, S3_URL]),
        ),
        (Backend::Gcs, compile(&[GCS_PATH, GCS_VIRTUAL, GCS_URL])),
        (Backend::OneLake, compile(&[ONELAKE_URL])),
        (Backend::Azure, compile(&[ABFS_URL, AZURE_HTTPS])),
        (Backend::Local, compile(&[FILE_URI, FILE_URL, FILE_PATH])),
    ]
});

/// Backend configuration enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    S3(S3Config),
    Gcs(GcsConfig),
    Azure(AzureConfig),
    Local(LocalConfig),
}

impl BackendConfig {
    /// Parse a URL into a backend configuration.
    pub fn parse_url(url: &str) -> Result<Self, StorageError> {
        for (backend, patterns) in MATCHERS.iter() {
            if let Some(caps) = patterns.iter().find_map(|r| r.captures(url)) {
                return Ok(match backend {
                    Backend::S3 => Self::parse_s3(&caps),
                    Backend::Gcs => Self::parse_gcs(&caps),
                    Backend::OneLake => Self::parse_onelake(&caps),
                    Backend::Azure => Self::parse_azure(&caps),
                    Backend::Local => Self::parse_local(&caps),
                });
            }
        }

        InvalidUrlSnafu {
            url: url.to_string(),
        }
        .fail()
    }

    fn parse_s3(caps: &Captures) -> Self {
        let region = std::env::var("AWS_DEFAULT_REGION")
            .ok()
            .or_else(|| caps.name("region").map(|m| m.as_str().to_string()));

        let endpoint = std::env::var("AWS_ENDPOINT").ok().or_else(|| {
            caps.name("endpoint").map(|endpoint| {
                let port = caps
                    .name("port")
                    .and_then(|p| p.as_str().parse::<u16>().ok())
                    .unwrap_or(443);
                let protocol = caps.name("protocol").map(|p| p.as_str()).unwrap_or("https");
                format!("{protocol}://{}:{port}", endpoint.as_str())
            })
        });

        BackendConfig::S3(S3Config {
            endpoint,
            region,
            bucket: group(caps, "bucket"),
            key: key(caps),
        })
    }

    fn parse_gcs(caps: &Captures) -> Self {
        BackendConfig::Gcs(GcsConfig {
            bucket: group(caps, "bucket"),
            key: key(caps),
        })
    }

    fn parse_onelake(caps: &Captures) -> Self {
        BackendConfig::Azure(AzureConfig {
            account: "onelake".to_string(),
            container: group(caps, "container"),
            key: key(caps),
            fabric: true,
        })
    }

    fn parse_azure(caps: &Captures) -> Self {
        BackendConfig::Azure(AzureConfig {
            account: group(caps, "account"),
            container: group(caps, "container"),
            key: key(caps),
            fabric: false,
        })
    }

    fn parse_local(caps: &Captures) -> Self {
        let path = group(caps, "path");
        let path = if path.starts_with('/') {
            path
        } else {
            format!("/{path}")
        };

        BackendConfig::Local(LocalConfig {
            path: path.trim_end_matches('/').to_string(),
        })
    }

    /// Key prefix inside the bucket/container, if any.
    pub(crate) fn key(&self) -> Option<&Path> {
        match self {
            BackendConfig::S3(s3) => s3.key.as_ref(),
            BackendConfig::Gcs(gcs) => gcs.key.as_ref(),
            BackendConfig::Azure(azure) => azure.key.as_ref(),
            BackendConfig::Local(_) => None,
        }
    }
}

/// Every pattern for a backend defines the groups read here, so a miss is unreachable.
fn group(caps: &Captures, name: &str) -> String {
    caps.name(name)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

fn key(caps: &Captures) -> Option<Path> {
    caps.name("key").map(|m| m.as_str().into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_s3_url_parsing() {
        let config = BackendConfig::parse_url("s3://lakehouse/bronze/tables").unwrap();
        match config {
            BackendConfig::S3(s3) => {
                assert_eq!(s3.bucket, "lakehouse");
                assert_eq!(s3.key, Some(Path::from("bronze/tables")));
            }
            _ => panic!("Expected S3 config"),
        }
    }

    #[test]
    fn test_s3_endpoint_url() {
        let config =
            BackendConfig::parse_url("s3::http://localhost:9000/lakehouse/bronze").unwrap();
        match config {
            BackendConfig::S3(s3) => {
                assert_eq!(s3.bucket, "lakehouse");
                assert_eq!(s3.endpoint, Some("http://localhost:9000".to_string()));
                assert_eq!(s3.key, Some(Path::from("bronze")));
            }
            _ => panic!("Expected S3 config"),
        }
    }

    #[test]
    fn test_gcs_url_parsing() {
        let config = BackendConfig::parse_url("gs://lakehouse/bronze").unwrap();
        match config {
            BackendConfig::Gcs(gcs) => {
                assert_eq!(gcs.bucket, "lakehouse");
                assert_eq!(gcs.key, Some(Path::from("bronze")));
            }
            _ => panic!("Expected Gcs config"),
        }
    }

    #[test]
    fn test_azure_url_parsing() {
        let config = BackendConfig::parse_url(
            "abfss://bronze@financestore.dfs.core.windows.net/Tables",
        )
        .unwrap();
        match config {
            BackendConfig::Azure(azure) => {
                assert_eq!(azure.account, "financestore");
                assert_eq!(azure.container, "bronze");
                assert_eq!(azure.key, Some(Path::from("Tables")));
                assert!(!azure.fabric);
            }
            _ => panic!("Expected Azure config"),
        }
    }

    #[test]
    fn test_onelake_url_parsing() {
        let config = BackendConfig::parse_url(
            "abfss://Finance@onelake.dfs.fabric.microsoft.com/Bronze_Lakehouse.Lakehouse/Tables",
        )
        .unwrap();
        match config {
            BackendConfig::Azure(azure) => {
                assert_eq!(azure.account, "onelake");
                assert_eq!(azure.container, "Finance");
                assert_eq!(
                    azure.key,
                    Some(Path::from("Bronze_Lakehouse.Lakehouse/Tables"))
                );
                assert!(azure.fabric);
            }
            _ => panic!("Expected Azure config"),
        }
    }

    #[test]
    fn test_local_forms() {
        for url in [
            "/var/lib/lakehouse",
            "file:///var/lib/lakehouse",
            "file:/var/lib/lakehouse/",
        ] {
            match BackendConfig::parse_url(url).unwrap() {
                BackendConfig::Local(local) => assert_eq!(local.path, "/var/lib/lakehouse"),
                other => panic!("Expected Local config for {url}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_invalid_url() {
        assert!(BackendConfig::parse_url("ftp://lakehouse").is_err());
        assert!(BackendConfig::parse_url("relative/lakehouse").is_err());
    }
}
