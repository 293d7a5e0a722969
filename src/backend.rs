//! Storage backend selection for snapshot uploads
//!
//! The config block lists one optional section per backend kind. Exactly
//! one must be present; validation turns the block into a
//! [`BackendDescriptor`] whose variant is fixed from then on.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const AWS_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
pub const AWS_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";

pub const GOOGLE_PROJECT_ID: &str = "GOOGLE_PROJECT_ID";
pub const GOOGLE_SERVICE_ACCOUNT_JSON_KEY: &str = "GOOGLE_SERVICE_ACCOUNT_JSON_KEY";

pub const AZURE_ACCOUNT_NAME: &str = "AZURE_ACCOUNT_NAME";
pub const AZURE_ACCOUNT_KEY: &str = "AZURE_ACCOUNT_KEY";

pub const OS_USERNAME: &str = "OS_USERNAME";
pub const OS_PASSWORD: &str = "OS_PASSWORD";
pub const OS_REGION_NAME: &str = "OS_REGION_NAME";
pub const OS_AUTH_URL: &str = "OS_AUTH_URL";
pub const OS_USER_DOMAIN_NAME: &str = "OS_USER_DOMAIN_NAME";
pub const OS_PROJECT_NAME: &str = "OS_PROJECT_NAME";
pub const OS_PROJECT_DOMAIN_NAME: &str = "OS_PROJECT_DOMAIN_NAME";
pub const OS_TENANT_ID: &str = "OS_TENANT_ID";
pub const OS_TENANT_NAME: &str = "OS_TENANT_NAME";
pub const ST_AUTH: &str = "ST_AUTH";
pub const ST_USER: &str = "ST_USER";
pub const ST_KEY: &str = "ST_KEY";
pub const OS_STORAGE_URL: &str = "OS_STORAGE_URL";
pub const OS_AUTH_TOKEN: &str = "OS_AUTH_TOKEN";

/// Swift auth schemes: keystone v3, v2 (by tenant name or id), v1, manual token
const SWIFT_AUTH_SCHEMES: &[&[&str]] = &[
    &[
        OS_USERNAME,
        OS_PASSWORD,
        OS_AUTH_URL,
        OS_USER_DOMAIN_NAME,
        OS_PROJECT_NAME,
        OS_PROJECT_DOMAIN_NAME,
    ],
    &[OS_USERNAME, OS_PASSWORD, OS_AUTH_URL, OS_TENANT_NAME],
    &[OS_USERNAME, OS_PASSWORD, OS_AUTH_URL, OS_TENANT_ID],
    &[ST_AUTH, ST_USER, ST_KEY],
    &[OS_STORAGE_URL, OS_AUTH_TOKEN],
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalSpec {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3Spec {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub endpoint: String,

    #[serde(default)]
    pub bucket: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub prefix: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GcsSpec {
    #[serde(default)]
    pub bucket: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub prefix: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureSpec {
    #[serde(default)]
    pub container: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub prefix: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwiftSpec {
    #[serde(default)]
    pub container: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub prefix: String,
}

/// Backend block as written in the cluster config
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendConfig {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub storage_secret_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local: Option<LocalSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3: Option<S3Spec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gcs: Option<GcsSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure: Option<AzureSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swift: Option<SwiftSpec>,
}

impl BackendConfig {
    /// Number of backend sections present
    pub fn populated(&self) -> usize {
        [
            self.local.is_some(),
            self.s3.is_some(),
            self.gcs.is_some(),
            self.azure.is_some(),
            self.swift.is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count()
    }
}

/// The single active storage backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Local(LocalSpec),
    S3(S3Spec),
    Gcs(GcsSpec),
    Azure(AzureSpec),
    Swift(SwiftSpec),
}

impl StorageBackend {
    pub fn kind(&self) -> &'static str {
        match self {
            StorageBackend::Local(_) => "local",
            StorageBackend::S3(_) => "s3",
            StorageBackend::Gcs(_) => "gcs",
            StorageBackend::Azure(_) => "azure",
            StorageBackend::Swift(_) => "swift",
        }
    }

    /// Human-readable upload target, for logs
    pub fn location(&self) -> String {
        let (scheme, root, prefix) = match self {
            StorageBackend::Local(spec) => return spec.path.clone(),
            StorageBackend::S3(spec) => ("s3", &spec.bucket, &spec.prefix),
            StorageBackend::Gcs(spec) => ("gs", &spec.bucket, &spec.prefix),
            StorageBackend::Azure(spec) => ("azure", &spec.container, &spec.prefix),
            StorageBackend::Swift(spec) => ("swift", &spec.container, &spec.prefix),
        };

        if prefix.is_empty() {
            format!("{}://{}", scheme, root)
        } else {
            format!("{}://{}/{}", scheme, root, prefix.trim_matches('/'))
        }
    }
}

/// Validated backend selection handed to the snapshot uploader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendDescriptor {
    pub storage_secret_name: String,
    pub storage: StorageBackend,
}

impl BackendDescriptor {
    pub fn kind(&self) -> &'static str {
        self.storage.kind()
    }

    /// Verify that `credentials` holds what the active backend needs
    pub fn check_credentials(&self, credentials: &StorageCredentials) -> Result<(), ConfigError> {
        let backend = self.kind();
        let missing = |key: &'static str| ConfigError::MissingCredential { backend, key };

        let required: &[&'static str] = match self.storage {
            StorageBackend::Local(_) => &[],
            StorageBackend::S3(_) => &[AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY],
            StorageBackend::Gcs(_) => &[GOOGLE_PROJECT_ID, GOOGLE_SERVICE_ACCOUNT_JSON_KEY],
            StorageBackend::Azure(_) => &[AZURE_ACCOUNT_NAME, AZURE_ACCOUNT_KEY],
            StorageBackend::Swift(_) => {
                // any complete scheme will do; otherwise report from the closest one
                let closest = SWIFT_AUTH_SCHEMES
                    .iter()
                    .min_by_key(|scheme| scheme.iter().filter(|k| !credentials.has(k)).count());
                match closest {
                    Some(scheme) => *scheme,
                    None => return Ok(()),
                }
            }
        };

        match required.iter().copied().find(|key| !credentials.has(key)) {
            Some(key) => Err(missing(key)),
            None => Ok(()),
        }
    }
}

impl TryFrom<BackendConfig> for BackendDescriptor {
    type Error = ConfigError;

    fn try_from(config: BackendConfig) -> Result<Self, Self::Error> {
        let count = config.populated();
        let BackendConfig {
            storage_secret_name,
            local,
            s3,
            gcs,
            azure,
            swift,
        } = config;

        let storage = match (local, s3, gcs, azure, swift) {
            (Some(spec), None, None, None, None) => StorageBackend::Local(spec),
            (None, Some(spec), None, None, None) => StorageBackend::S3(spec),
            (None, None, Some(spec), None, None) => StorageBackend::Gcs(spec),
            (None, None, None, Some(spec), None) => StorageBackend::Azure(spec),
            (None, None, None, None, Some(spec)) => StorageBackend::Swift(spec),
            _ => return Err(ConfigError::MultipleOrNoBackend { count }),
        };

        Ok(Self {
            storage_secret_name,
            storage,
        })
    }
}

/// Validate a backend block, selecting its single active variant
pub fn validate(config: &BackendConfig) -> Result<BackendDescriptor, ConfigError> {
    BackendDescriptor::try_from(config.clone())
}

/// Explicit credential set for the storage backend
///
/// Keys use the names of the provider SDK variables (`AWS_ACCESS_KEY_ID`,
/// `OS_AUTH_URL`, ...). Values are supplied by the caller, typically
/// from a mounted secret.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageCredentials {
    values: BTreeMap<String, String>,
}

impl StorageCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// True when `key` is present with a non-empty value
    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| !v.is_empty())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for StorageCredentials {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local() -> Option<LocalSpec> {
        Some(LocalSpec {
            path: "/var/snapshots".to_string(),
        })
    }

    fn s3() -> Option<S3Spec> {
        Some(S3Spec {
            bucket: "backups".to_string(),
            prefix: "kubed".to_string(),
            ..Default::default()
        })
    }

    #[test]
    fn test_single_backend_selected() {
        let config = BackendConfig {
            storage_secret_name: "snap-secret".to_string(),
            local: local(),
            ..Default::default()
        };
        let descriptor = validate(&config).unwrap();
        assert_eq!(descriptor.kind(), "local");
        assert_eq!(descriptor.storage_secret_name, "snap-secret");
        assert_eq!(descriptor.storage.location(), "/var/snapshots");
    }

    #[test]
    fn test_no_backend_rejected() {
        assert_eq!(
            validate(&BackendConfig::default()),
            Err(ConfigError::MultipleOrNoBackend { count: 0 })
        );
    }

    #[test]
    fn test_multiple_backends_rejected() {
        let config = BackendConfig {
            local: local(),
            s3: s3(),
            ..Default::default()
        };
        assert_eq!(
            validate(&config),
            Err(ConfigError::MultipleOrNoBackend { count: 2 })
        );
    }

    #[test]
    fn test_fails_iff_count_is_not_one() {
        for mask in 0u8..32 {
            let config = BackendConfig {
                local: (mask & 1 != 0).then(LocalSpec::default),
                s3: (mask & 2 != 0).then(S3Spec::default),
                gcs: (mask & 4 != 0).then(GcsSpec::default),
                azure: (mask & 8 != 0).then(AzureSpec::default),
                swift: (mask & 16 != 0).then(SwiftSpec::default),
                ..Default::default()
            };
            assert_eq!(
                validate(&config).is_ok(),
                mask.count_ones() == 1,
                "mask {:05b}",
                mask
            );
        }
    }

    #[test]
    fn test_location() {
        let descriptor = validate(&BackendConfig {
            s3: s3(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(descriptor.storage.location(), "s3://backups/kubed");

        let gcs = StorageBackend::Gcs(GcsSpec {
            bucket: "snaps".to_string(),
            prefix: String::new(),
        });
        assert_eq!(gcs.location(), "gs://snaps");
    }

    #[test]
    fn test_deserialize_backend() {
        let config: BackendConfig = serde_json::from_str(
            r#"{"storageSecretName":"s","gcs":{"bucket":"b","prefix":"p"}}"#,
        )
        .unwrap();
        assert_eq!(config.populated(), 1);
        assert_eq!(validate(&config).unwrap().kind(), "gcs");
    }

    #[test]
    fn test_credentials_s3() {
        let descriptor = validate(&BackendConfig {
            s3: s3(),
            ..Default::default()
        })
        .unwrap();

        let partial = StorageCredentials::new().with(AWS_ACCESS_KEY_ID, "AKIA");
        assert_eq!(
            descriptor.check_credentials(&partial),
            Err(ConfigError::MissingCredential {
                backend: "s3",
                key: AWS_SECRET_ACCESS_KEY,
            })
        );

        let full = partial.with(AWS_SECRET_ACCESS_KEY, "secret");
        assert!(descriptor.check_credentials(&full).is_ok());
    }

    #[test]
    fn test_credentials_empty_value_is_missing() {
        let descriptor = validate(&BackendConfig {
            azure: Some(AzureSpec::default()),
            ..Default::default()
        })
        .unwrap();
        let creds: StorageCredentials =
            [(AZURE_ACCOUNT_NAME, "acct"), (AZURE_ACCOUNT_KEY, "")].into_iter().collect();
        assert!(descriptor.check_credentials(&creds).is_err());
    }

    #[test]
    fn test_credentials_local_needs_nothing() {
        let descriptor = validate(&BackendConfig {
            local: local(),
            ..Default::default()
        })
        .unwrap();
        assert!(descriptor.check_credentials(&StorageCredentials::new()).is_ok());
    }

    #[test]
    fn test_credentials_swift_schemes() {
        let descriptor = validate(&BackendConfig {
            swift: Some(SwiftSpec::default()),
            ..Default::default()
        })
        .unwrap();

        let v1 = StorageCredentials::new()
            .with(ST_AUTH, "https://auth")
            .with(ST_USER, "user")
            .with(ST_KEY, "key");
        assert!(descriptor.check_credentials(&v1).is_ok());

        let manual = StorageCredentials::new()
            .with(OS_STORAGE_URL, "https://storage")
            .with(OS_AUTH_TOKEN, "token");
        assert!(descriptor.check_credentials(&manual).is_ok());

        let v2_partial = StorageCredentials::new()
            .with(OS_USERNAME, "user")
            .with(OS_PASSWORD, "pass")
            .with(OS_AUTH_URL, "https://keystone");
        assert_eq!(
            descriptor.check_credentials(&v2_partial),
            Err(ConfigError::MissingCredential {
                backend: "swift",
                key: OS_TENANT_NAME,
            })
        );
    }
}
