//! Janitor retention check
//!
//! Classifies log-store entries (Elasticsearch indices, InfluxDB
//! measurements) against a janitor's TTL. The check only selects
//! candidates; deleting them is the caller's job.

use crate::error::ConfigError;
use crate::ttl::TtlSpec;
use crate::types::RetainedArtifact;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Index prefix used when an Elasticsearch janitor does not set one
pub const DEFAULT_LOG_INDEX_PREFIX: &str = "logstash-";

/// Date suffix of daily log indices (`logstash-2023.04.01`)
pub const LOG_INDEX_DATE_FORMAT: &str = "%Y.%m.%d";

/// Ids of `entries` whose age has reached `ttl`, lazily and in input order
pub fn expired_ids<'a>(
    ttl: TtlSpec,
    entries: &'a [RetainedArtifact],
    now: DateTime<Utc>,
) -> impl Iterator<Item = &'a str> + 'a {
    entries
        .iter()
        .filter(move |entry| ttl.is_expired(entry.created_at, now))
        .map(|entry| entry.id.as_str())
}

/// Ids of `entries` the janitor should purge
pub fn expired_entries<'a>(
    spec: &JanitorSpec,
    entries: &'a [RetainedArtifact],
    now: DateTime<Utc>,
) -> impl Iterator<Item = &'a str> + 'a {
    expired_ids(spec.ttl, entries, now)
}

/// Log store a janitor cleans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JanitorKind {
    Elasticsearch,
    InfluxDb,
}

impl JanitorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JanitorKind::Elasticsearch => "Elasticsearch",
            JanitorKind::InfluxDb => "InfluxDB",
        }
    }
}

impl fmt::Display for JanitorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JanitorKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Elasticsearch" => Ok(JanitorKind::Elasticsearch),
            "InfluxDB" => Ok(JanitorKind::InfluxDb),
            other => Err(ConfigError::UnknownJanitorKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElasticsearchSpec {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub endpoint: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub log_index_prefix: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub secret_name: String,
}

impl ElasticsearchSpec {
    pub fn index_prefix(&self) -> &str {
        if self.log_index_prefix.is_empty() {
            DEFAULT_LOG_INDEX_PREFIX
        } else {
            &self.log_index_prefix
        }
    }

    /// Creation date of a daily log index, `None` for foreign indices
    pub fn index_created_at(&self, index: &str) -> Option<DateTime<Utc>> {
        let date = index.strip_prefix(self.index_prefix())?;
        let date = NaiveDate::parse_from_str(date, LOG_INDEX_DATE_FORMAT).ok()?;
        Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
    }

    /// Turn index names into artifacts, skipping indices this janitor does not own
    pub fn log_indices<I, S>(&self, indices: I) -> Vec<RetainedArtifact>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        indices
            .into_iter()
            .filter_map(|index| {
                let index = index.as_ref();
                self.index_created_at(index)
                    .map(|created_at| RetainedArtifact::new(index, created_at))
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfluxDbSpec {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub endpoint: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub username: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub password: String,
}

/// Janitor entry as written in the cluster config
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JanitorConfig {
    pub kind: String,

    #[serde(default)]
    pub ttl: TtlSpec,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elasticsearch: Option<ElasticsearchSpec>,

    #[serde(default, rename = "influxdb", skip_serializing_if = "Option::is_none")]
    pub influx_db: Option<InfluxDbSpec>,
}

/// Connection block of a validated janitor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JanitorBackend {
    Elasticsearch(ElasticsearchSpec),
    InfluxDb(InfluxDbSpec),
}

/// A janitor whose kind and connection block agree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JanitorSpec {
    pub ttl: TtlSpec,
    pub backend: JanitorBackend,
}

impl JanitorSpec {
    pub fn elasticsearch(ttl: TtlSpec, spec: ElasticsearchSpec) -> Self {
        Self {
            ttl,
            backend: JanitorBackend::Elasticsearch(spec),
        }
    }

    pub fn influx_db(ttl: TtlSpec, spec: InfluxDbSpec) -> Self {
        Self {
            ttl,
            backend: JanitorBackend::InfluxDb(spec),
        }
    }

    pub fn kind(&self) -> JanitorKind {
        match self.backend {
            JanitorBackend::Elasticsearch(_) => JanitorKind::Elasticsearch,
            JanitorBackend::InfluxDb(_) => JanitorKind::InfluxDb,
        }
    }
}

impl TryFrom<JanitorConfig> for JanitorSpec {
    type Error = ConfigError;

    fn try_from(config: JanitorConfig) -> Result<Self, Self::Error> {
        let JanitorConfig {
            kind,
            ttl,
            elasticsearch,
            influx_db,
        } = config;

        let backend = match (kind.parse::<JanitorKind>()?, elasticsearch, influx_db) {
            (JanitorKind::Elasticsearch, Some(es), None) => JanitorBackend::Elasticsearch(es),
            (JanitorKind::InfluxDb, None, Some(influx)) => JanitorBackend::InfluxDb(influx),
            _ => return Err(ConfigError::JanitorBackendMismatch { kind }),
        };

        Ok(Self { ttl, backend })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 4, d, 0, 0, 0).unwrap()
    }

    fn es_janitor(days: u64) -> JanitorSpec {
        JanitorSpec::elasticsearch(
            TtlSpec::new(Duration::from_secs(days * 24 * 3600)),
            ElasticsearchSpec::default(),
        )
    }

    #[test]
    fn test_expired_entries_preserve_order() {
        let entries = vec![
            RetainedArtifact::new("c", day(1)),
            RetainedArtifact::new("a", day(9)),
            RetainedArtifact::new("b", day(2)),
        ];
        let now = day(10);

        let expired: Vec<&str> = expired_entries(&es_janitor(7), &entries, now).collect();
        assert_eq!(expired, vec!["c", "b"]);

        // restartable: a second pass over the same snapshot yields the same ids
        let again: Vec<&str> = expired_entries(&es_janitor(7), &entries, now).collect();
        assert_eq!(again, expired);
    }

    #[test]
    fn test_zero_ttl_expires_nothing() {
        let entries = vec![RetainedArtifact::new("old", day(1))];
        let janitor = JanitorSpec::influx_db(TtlSpec::immortal(), InfluxDbSpec::default());
        assert_eq!(expired_entries(&janitor, &entries, day(30)).count(), 0);
    }

    #[test]
    fn test_index_created_at() {
        let es = ElasticsearchSpec::default();
        assert_eq!(es.index_prefix(), "logstash-");
        assert_eq!(es.index_created_at("logstash-2023.04.05"), Some(day(5)));
        assert_eq!(es.index_created_at("logstash-2023-04-05"), None);
        assert_eq!(es.index_created_at("metrics-2023.04.05"), None);

        let custom = ElasticsearchSpec {
            log_index_prefix: "kube-".to_string(),
            ..Default::default()
        };
        assert_eq!(custom.index_created_at("kube-2023.04.02"), Some(day(2)));
        assert_eq!(custom.index_created_at("logstash-2023.04.02"), None);
    }

    #[test]
    fn test_log_indices_feed_retention() {
        let janitor = es_janitor(3);
        let JanitorBackend::Elasticsearch(es) = &janitor.backend else {
            panic!("expected elasticsearch backend");
        };

        let entries = es.log_indices([
            "logstash-2023.04.01",
            ".kibana",
            "logstash-2023.04.07",
            "logstash-2023.04.04",
        ]);
        assert_eq!(entries.len(), 3);

        let expired: Vec<&str> = expired_entries(&janitor, &entries, day(7)).collect();
        assert_eq!(expired, vec!["logstash-2023.04.01", "logstash-2023.04.04"]);
    }

    #[test]
    fn test_janitor_config_validation() {
        let config: JanitorConfig = serde_json::from_str(
            r#"{"kind":"Elasticsearch","ttl":"72h","elasticsearch":{"endpoint":"http://es:9200"}}"#,
        )
        .unwrap();
        let spec = JanitorSpec::try_from(config).unwrap();
        assert_eq!(spec.kind(), JanitorKind::Elasticsearch);
        assert_eq!(spec.ttl.duration, Duration::from_secs(72 * 3600));

        let config: JanitorConfig =
            serde_json::from_str(r#"{"kind":"InfluxDB","influxdb":{"endpoint":"http://influx"}}"#)
                .unwrap();
        let spec = JanitorSpec::try_from(config).unwrap();
        assert_eq!(spec.kind(), JanitorKind::InfluxDb);
        assert!(spec.ttl.is_immortal());
    }

    #[test]
    fn test_janitor_config_mismatch() {
        let missing = JanitorConfig {
            kind: "InfluxDB".to_string(),
            elasticsearch: Some(ElasticsearchSpec::default()),
            ..Default::default()
        };
        assert_eq!(
            JanitorSpec::try_from(missing),
            Err(ConfigError::JanitorBackendMismatch {
                kind: "InfluxDB".to_string()
            })
        );

        let both = JanitorConfig {
            kind: "Elasticsearch".to_string(),
            elasticsearch: Some(ElasticsearchSpec::default()),
            influx_db: Some(InfluxDbSpec::default()),
            ..Default::default()
        };
        assert!(JanitorSpec::try_from(both).is_err());

        let unknown = JanitorConfig {
            kind: "Loki".to_string(),
            ..Default::default()
        };
        assert_eq!(
            JanitorSpec::try_from(unknown),
            Err(ConfigError::UnknownJanitorKind("Loki".to_string()))
        );
    }
}
