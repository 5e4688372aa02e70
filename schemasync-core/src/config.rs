//! Configuration assembly.
//!
//! Options arrive from three layers, highest precedence first:
//!
//! ```text
//! command-line flag  >  INPUT_<NAME> environment variable  >  --config YAML file
//! ```
//!
//! The first two are merged by clap in the binary; this module merges the
//! result over the file layer ([`ConfigInput::merge`]) and validates it into a
//! [`SyncConfig`] ([`SyncConfig::resolve`]). Nothing here reads the process
//! environment.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize, Serializer};

use crate::clock::Clock;
use crate::error::ConfigError;
use crate::types::{BranchName, CommitIdentity, RepoSlug};

pub const DEFAULT_GRAPH_VARIANT: &str = "current";
pub const DEFAULT_REGISTRY_URL: &str = "https://graphql.api.apollographql.com/api/graphql";

// ---------------------------------------------------------------------------
// Raw input
// ---------------------------------------------------------------------------

/// Unvalidated options, every field optional.
///
/// Blank strings are treated as absent so that an empty `INPUT_*` variable
/// behaves like an unset one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigInput {
    pub endpoint: Option<String>,
    pub graph: Option<String>,
    pub key: Option<String>,
    pub graph_variant: Option<String>,
    pub registry_url: Option<String>,
    pub schema: Option<PathBuf>,
    /// JSON object of header name to value.
    pub headers: Option<String>,
    pub insecure: Option<bool>,
    pub branch: Option<String>,
    pub base_branch: Option<String>,
    pub commit_user_name: Option<String>,
    pub commit_user_email: Option<String>,
    pub commit_author: Option<String>,
    pub commit_message: Option<String>,
    pub pr_title: Option<String>,
    pub pr_body: Option<String>,
    pub remote: Option<String>,
    /// `owner/name`.
    pub repository: Option<String>,
    pub token: Option<String>,
}

impl ConfigInput {
    /// Load a YAML config file.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Field-wise merge: values in `self` win, gaps are filled from `fallback`.
    pub fn merge(self, fallback: ConfigInput) -> ConfigInput {
        let s = self.normalized();
        let f = fallback.normalized();
        ConfigInput {
            endpoint: s.endpoint.or(f.endpoint),
            graph: s.graph.or(f.graph),
            key: s.key.or(f.key),
            graph_variant: s.graph_variant.or(f.graph_variant),
            registry_url: s.registry_url.or(f.registry_url),
            schema: s.schema.or(f.schema),
            headers: s.headers.or(f.headers),
            insecure: s.insecure.or(f.insecure),
            branch: s.branch.or(f.branch),
            base_branch: s.base_branch.or(f.base_branch),
            commit_user_name: s.commit_user_name.or(f.commit_user_name),
            commit_user_email: s.commit_user_email.or(f.commit_user_email),
            commit_author: s.commit_author.or(f.commit_author),
            commit_message: s.commit_message.or(f.commit_message),
            pr_title: s.pr_title.or(f.pr_title),
            pr_body: s.pr_body.or(f.pr_body),
            remote: s.remote.or(f.remote),
            repository: s.repository.or(f.repository),
            token: s.token.or(f.token),
        }
    }

    fn normalized(self) -> ConfigInput {
        ConfigInput {
            endpoint: non_blank(self.endpoint),
            graph: non_blank(self.graph),
            key: non_blank(self.key),
            graph_variant: non_blank(self.graph_variant),
            registry_url: non_blank(self.registry_url),
            schema: self.schema.filter(|p| !p.as_os_str().is_empty()),
            headers: non_blank(self.headers),
            insecure: self.insecure,
            branch: non_blank(self.branch),
            base_branch: non_blank(self.base_branch),
            commit_user_name: non_blank(self.commit_user_name),
            commit_user_email: non_blank(self.commit_user_email),
            commit_author: non_blank(self.commit_author),
            commit_message: non_blank(self.commit_message),
            pr_title: non_blank(self.pr_title),
            pr_body: non_blank(self.pr_body),
            remote: non_blank(self.remote),
            repository: non_blank(self.repository),
            token: non_blank(self.token),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Fetch parameters
// ---------------------------------------------------------------------------

/// Where the schema is downloaded from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FetchSource {
    /// Introspect a live GraphQL endpoint.
    Endpoint { url: String },
    /// Download the active schema of a registry graph variant.
    Registry {
        /// Graph id. Derived from the key when absent.
        graph: Option<String>,
        #[serde(serialize_with = "redact")]
        key: String,
        variant: String,
        registry_url: String,
    },
}

/// Parameters handed to the schema fetcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchRequest {
    pub source: FetchSource,
    pub headers: BTreeMap<String, String>,
    /// Skip TLS certificate verification.
    pub insecure: bool,
}

/// Parse the `headers` option.
pub fn parse_headers(input: &str) -> Result<BTreeMap<String, String>, ConfigError> {
    let malformed = || ConfigError::MalformedHeaders {
        input: input.to_owned(),
    };
    let value: serde_json::Value = serde_json::from_str(input).map_err(|_| malformed())?;
    let serde_json::Value::Object(map) = value else {
        return Err(malformed());
    };
    map.into_iter()
        .map(|(name, value)| match value {
            serde_json::Value::String(s) => Ok((name, s)),
            _ => Err(malformed()),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Validated configuration
// ---------------------------------------------------------------------------

/// Fully resolved configuration for one reconciliation.
///
/// Serializes with secrets redacted, for `schemasync config`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncConfig {
    pub fetch: FetchRequest,
    /// Artifact path, relative to the working copy root.
    pub schema_path: PathBuf,
    pub branch: BranchName,
    /// Base branch override; the repository default branch when `None`.
    pub base_branch: Option<String>,
    pub identity: CommitIdentity,
    pub commit_message: String,
    pub pr_title: String,
    pub pr_body: String,
    pub remote: String,
    pub repository: RepoSlug,
    #[serde(serialize_with = "redact")]
    pub token: String,
}

impl SyncConfig {
    /// Validate `input`, filling defaults.
    ///
    /// The sync branch falls back to [`BranchName::from_timestamp`] of
    /// `clock.now()`. Required keys are checked in a fixed order and the first
    /// gap is reported.
    pub fn resolve(input: ConfigInput, clock: &dyn Clock) -> Result<Self, ConfigError> {
        let input = input.normalized();

        let schema_path = input
            .schema
            .ok_or(ConfigError::ConfigurationMissing { key: "schema" })?;
        let repository = RepoSlug::parse("repository", &required(input.repository, "repository")?)?;
        let token = required(input.token, "token")?;
        let remote = required(input.remote, "remote")?;
        let identity = CommitIdentity {
            user_name: required(input.commit_user_name, "commit_user_name")?,
            user_email: required(input.commit_user_email, "commit_user_email")?,
            author: required(input.commit_author, "commit_author")?,
        };
        let commit_message = required(input.commit_message, "commit_message")?;
        let pr_title = required(input.pr_title, "pr_title")?;
        let pr_body = required(input.pr_body, "pr_body")?;

        let headers = match input.headers.as_deref() {
            Some(raw) => parse_headers(raw)?,
            None => BTreeMap::new(),
        };

        let source = match (input.endpoint, input.key) {
            (Some(url), _) => FetchSource::Endpoint { url },
            (None, Some(key)) => FetchSource::Registry {
                graph: input.graph,
                key,
                variant: input
                    .graph_variant
                    .unwrap_or_else(|| DEFAULT_GRAPH_VARIANT.to_owned()),
                registry_url: input
                    .registry_url
                    .unwrap_or_else(|| DEFAULT_REGISTRY_URL.to_owned()),
            },
            (None, None) => return Err(ConfigError::ConfigurationMissing { key: "endpoint" }),
        };

        let branch = input
            .branch
            .map(BranchName::from)
            .unwrap_or_else(|| BranchName::from_timestamp(clock.now()));

        Ok(SyncConfig {
            fetch: FetchRequest {
                source,
                headers,
                insecure: input.insecure.unwrap_or(false),
            },
            schema_path,
            branch,
            base_branch: input.base_branch,
            identity,
            commit_message,
            pr_title,
            pr_body,
            remote,
            repository,
            token,
        })
    }
}

fn required(value: Option<String>, key: &'static str) -> Result<String, ConfigError> {
    value.ok_or(ConfigError::ConfigurationMissing { key })
}

fn redact<S: Serializer>(_value: &String, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str("***")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::clock::FixedClock;

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2024, 11, 2, 14, 30, 12).unwrap())
    }

    fn complete() -> ConfigInput {
        ConfigInput {
            endpoint: Some("https://api.example.com/graphql".into()),
            schema: Some(PathBuf::from("schema.graphqls")),
            commit_user_name: Some("schema-bot".into()),
            commit_user_email: Some("bot@example.com".into()),
            commit_author: Some("schema-bot <bot@example.com>".into()),
            commit_message: Some("update schema".into()),
            pr_title: Some("Update schema".into()),
            pr_body: Some("Automated update".into()),
            remote: Some("origin".into()),
            repository: Some("acme/api".into()),
            token: Some("ghp_secret".into()),
            ..ConfigInput::default()
        }
    }

    #[test]
    fn resolve_complete_input() {
        let cfg = SyncConfig::resolve(complete(), &clock()).unwrap();
        assert_eq!(cfg.branch.as_str(), "update-schema-11-02_14-30");
        assert_eq!(cfg.base_branch, None);
        assert_eq!(cfg.repository.owner, "acme");
        assert!(!cfg.fetch.insecure);
        assert!(cfg.fetch.headers.is_empty());
        assert_eq!(
            cfg.fetch.source,
            FetchSource::Endpoint {
                url: "https://api.example.com/graphql".into()
            }
        );
    }

    #[test]
    fn explicit_branch_wins_over_clock() {
        let mut input = complete();
        input.branch = Some("schema-sync".into());
        let cfg = SyncConfig::resolve(input, &clock()).unwrap();
        assert_eq!(cfg.branch.as_str(), "schema-sync");
    }

    #[test]
    fn blank_values_count_as_missing() {
        let mut input = complete();
        input.pr_title = Some("   ".into());
        let err = SyncConfig::resolve(input, &clock()).unwrap_err();
        assert!(matches!(err, ConfigError::ConfigurationMissing { key: "pr_title" }));
    }

    #[test]
    fn missing_fetch_source_reports_endpoint() {
        let mut input = complete();
        input.endpoint = None;
        let err = SyncConfig::resolve(input, &clock()).unwrap_err();
        assert!(matches!(err, ConfigError::ConfigurationMissing { key: "endpoint" }));
    }

    #[test]
    fn registry_source_fills_defaults() {
        let mut input = complete();
        input.endpoint = None;
        input.key = Some("service:my-graph:abc".into());
        let cfg = SyncConfig::resolve(input, &clock()).unwrap();
        assert_eq!(
            cfg.fetch.source,
            FetchSource::Registry {
                graph: None,
                key: "service:my-graph:abc".into(),
                variant: DEFAULT_GRAPH_VARIANT.into(),
                registry_url: DEFAULT_REGISTRY_URL.into(),
            }
        );
    }

    #[test]
    fn headers_parse_from_json_object() {
        let headers = parse_headers(r#"{"Authorization": "Bearer x", "X-Env": "ci"}"#).unwrap();
        assert_eq!(headers.get("Authorization").map(String::as_str), Some("Bearer x"));
        assert_eq!(headers.len(), 2);
    }

    #[test]
    fn headers_reject_non_objects_and_non_strings() {
        for bad in [r#"["a"]"#, r#"{"a": 1}"#, "not json", r#""str""#] {
            let err = parse_headers(bad).unwrap_err();
            assert!(matches!(err, ConfigError::MalformedHeaders { .. }), "{bad}");
        }
    }

    #[test]
    fn merge_prefers_self_and_skips_blanks() {
        let primary = ConfigInput {
            remote: Some("".into()),
            pr_title: Some("from flags".into()),
            ..ConfigInput::default()
        };
        let file = ConfigInput {
            remote: Some("upstream".into()),
            pr_title: Some("from file".into()),
            insecure: Some(true),
            ..ConfigInput::default()
        };
        let merged = primary.merge(file);
        assert_eq!(merged.remote.as_deref(), Some("upstream"));
        assert_eq!(merged.pr_title.as_deref(), Some("from flags"));
        assert_eq!(merged.insecure, Some(true));
    }

    #[test]
    fn serialized_config_redacts_secrets() {
        let mut input = complete();
        input.endpoint = None;
        input.key = Some("service:g:secret-key".into());
        let cfg = SyncConfig::resolve(input, &clock()).unwrap();
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(!json.contains("ghp_secret"));
        assert!(!json.contains("secret-key"));
        assert!(json.contains("***"));
    }
}
