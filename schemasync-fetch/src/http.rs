//! [`Fetcher`] over HTTP: endpoint introspection or registry download.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use schemasync_core::{FetchRequest, FetchSource};

use crate::error::FetchError;
use crate::introspection::{IntrospectionData, INTROSPECTION_QUERY};
use crate::output::{wants_json, write_atomic};
use crate::sdl::introspect_sdl;
use crate::tls;
use crate::Fetcher;

const USER_AGENT: &str = concat!("schemasync/", env!("CARGO_PKG_VERSION"));
const CLIENT_NAME: &str = "schemasync";

const REGISTRY_SCHEMA_QUERY: &str = r#"
query DownloadSchema($graphID: ID!, $variant: String!) {
  service(id: $graphID) {
    variant(name: $variant) {
      __typename
      ... on GraphVariant {
        activeSchemaPublish {
          schema {
            document
          }
        }
      }
    }
  }
}
"#;

/// Downloads schemas with a blocking HTTP client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    timeout: Duration,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
        }
    }
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn agent(&self, insecure: bool) -> Result<ureq::Agent, FetchError> {
        let mut builder = ureq::AgentBuilder::new().timeout(self.timeout);
        if insecure {
            tracing::warn!("TLS certificate verification is disabled");
            builder = builder.tls_config(tls::insecure_client_config()?);
        }
        Ok(builder.build())
    }

    /// POST a GraphQL document and return the `data` member.
    fn post_graphql<V: Serialize>(
        &self,
        agent: &ureq::Agent,
        url: &str,
        headers: &[(&str, &str)],
        body: &GraphQlBody<'_, V>,
    ) -> Result<Value, FetchError> {
        let mut request = agent
            .post(url)
            .set("User-Agent", USER_AGENT)
            .set("Accept", "application/json");
        for (name, value) in headers {
            request = request.set(name, value);
        }

        let body = match request.send_json(body) {
            Ok(resp) => resp.into_string().map_err(|e| FetchError::Transport {
                url: url.to_owned(),
                message: format!("failed to read response body: {e}"),
            })?,
            Err(ureq::Error::Status(status, resp)) => {
                return Err(FetchError::Status {
                    url: url.to_owned(),
                    status,
                    body: resp.into_string().unwrap_or_default(),
                })
            }
            Err(ureq::Error::Transport(transport)) => {
                return Err(FetchError::Transport {
                    url: url.to_owned(),
                    message: transport.to_string(),
                })
            }
        };

        let envelope: Envelope = serde_json::from_str(&body).map_err(|e| FetchError::Decode {
            url: url.to_owned(),
            message: e.to_string(),
        })?;
        if !envelope.errors.is_empty() {
            return Err(FetchError::GraphQl {
                url: url.to_owned(),
                messages: envelope.errors.into_iter().map(|e| e.message).collect(),
            });
        }
        match envelope.data {
            Some(data) if !data.is_null() => Ok(data),
            _ => Err(FetchError::Decode {
                url: url.to_owned(),
                message: "response has no data".to_owned(),
            }),
        }
    }

    fn download_introspection(
        &self,
        agent: &ureq::Agent,
        url: &str,
        request: &FetchRequest,
        output: &Path,
    ) -> Result<(), FetchError> {
        tracing::info!("introspecting {url}");
        let headers: Vec<(&str, &str)> = request
            .headers
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let data = self.post_graphql(
            agent,
            url,
            &headers,
            &GraphQlBody {
                query: INTROSPECTION_QUERY,
                operation_name: Some("IntrospectionQuery"),
                variables: serde_json::Map::new(),
            },
        )?;

        let content = if wants_json(output) {
            json_document(url, &data)?
        } else {
            let parsed: IntrospectionData =
                serde_json::from_value(data).map_err(|e| FetchError::Decode {
                    url: url.to_owned(),
                    message: e.to_string(),
                })?;
            parsed.schema.to_sdl()
        };
        write_atomic(output, content.as_bytes())
    }

    fn download_registry(
        &self,
        agent: &ureq::Agent,
        source: RegistrySource<'_>,
        output: &Path,
    ) -> Result<(), FetchError> {
        let graph = match source.graph {
            Some(graph) => graph.to_owned(),
            None => graph_from_key(source.key).ok_or(FetchError::MissingGraph)?,
        };
        tracing::info!(
            "downloading schema for {graph}@{} from {}",
            source.variant,
            source.registry_url
        );

        let data = self.post_graphql(
            agent,
            source.registry_url,
            &[("x-api-key", source.key), ("apollographql-client-name", CLIENT_NAME)],
            &GraphQlBody {
                query: REGISTRY_SCHEMA_QUERY,
                operation_name: Some("DownloadSchema"),
                variables: RegistryVariables {
                    graph_id: &graph,
                    variant: source.variant,
                },
            },
        )?;

        let document = serde_json::from_value::<RegistryData>(data)
            .ok()
            .and_then(RegistryData::document)
            .ok_or_else(|| FetchError::MissingSchema {
                graph: graph.clone(),
                variant: source.variant.to_owned(),
            })?;

        if wants_json(output) {
            let converted = introspect_sdl(source.registry_url, &document)?;
            let content = json_document(source.registry_url, &converted)?;
            return write_atomic(output, content.as_bytes());
        }
        write_atomic(output, document.as_bytes())
    }
}

/// `{"data": …}` pretty-printed and newline-terminated.
fn json_document<T: Serialize>(url: &str, data: &T) -> Result<String, FetchError> {
    let mut json =
        serde_json::to_string_pretty(&DataEnvelope { data }).map_err(|e| FetchError::Decode {
            url: url.to_owned(),
            message: e.to_string(),
        })?;
    json.push('\n');
    Ok(json)
}

impl Fetcher for HttpFetcher {
    fn download(&self, request: &FetchRequest, output: &Path) -> Result<(), FetchError> {
        let agent = self.agent(request.insecure)?;
        match &request.source {
            FetchSource::Endpoint { url } => {
                self.download_introspection(&agent, url, request, output)
            }
            FetchSource::Registry {
                graph,
                key,
                variant,
                registry_url,
            } => self.download_registry(
                &agent,
                RegistrySource {
                    graph: graph.as_deref(),
                    key,
                    variant,
                    registry_url,
                },
                output,
            ),
        }
    }
}

/// `service:<graph>:<secret>` keys carry their graph id.
pub fn graph_from_key(key: &str) -> Option<String> {
    let mut parts = key.splitn(3, ':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("service"), Some(graph), Some(_)) if !graph.is_empty() => Some(graph.to_owned()),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

struct RegistrySource<'a> {
    graph: Option<&'a str>,
    key: &'a str,
    variant: &'a str,
    registry_url: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GraphQlBody<'a, V: Serialize> {
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    operation_name: Option<&'a str>,
    variables: V,
}

#[derive(Debug, Serialize)]
struct RegistryVariables<'a> {
    #[serde(rename = "graphID")]
    graph_id: &'a str,
    variant: &'a str,
}

#[derive(Serialize)]
struct DataEnvelope<'a, T> {
    data: &'a T,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<EnvelopeError>,
}

#[derive(Debug, Deserialize)]
struct EnvelopeError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct RegistryData {
    service: Option<RegistryService>,
}

#[derive(Debug, Deserialize)]
struct RegistryService {
    variant: Option<RegistryVariant>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegistryVariant {
    active_schema_publish: Option<RegistryPublish>,
}

#[derive(Debug, Deserialize)]
struct RegistryPublish {
    schema: RegistrySchema,
}

#[derive(Debug, Deserialize)]
struct RegistrySchema {
    document: String,
}

impl RegistryData {
    fn document(self) -> Option<String> {
        Some(self.service?.variant?.active_schema_publish?.schema.document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_id_comes_from_service_keys() {
        assert_eq!(graph_from_key("service:my-graph:abc123"), Some("my-graph".into()));
        assert_eq!(graph_from_key("service:g:a:b"), Some("g".into()));
        assert_eq!(graph_from_key("user:xyz:abc"), None);
        assert_eq!(graph_from_key("service::abc"), None);
        assert_eq!(graph_from_key("plain"), None);
    }

    #[test]
    fn registry_document_requires_every_level() {
        let full: RegistryData = serde_json::from_str(
            r#"{"service":{"variant":{"__typename":"GraphVariant","activeSchemaPublish":{"schema":{"document":"type Query { a: Int }"}}}}}"#,
        )
        .unwrap();
        assert_eq!(full.document().as_deref(), Some("type Query { a: Int }"));

        let unpublished: RegistryData =
            serde_json::from_str(r#"{"service":{"variant":{"activeSchemaPublish":null}}}"#).unwrap();
        assert_eq!(unpublished.document(), None);

        let unknown: RegistryData = serde_json::from_str(r#"{"service":null}"#).unwrap();
        assert_eq!(unknown.document(), None);
    }

    #[test]
    fn body_serializes_operation_name() {
        let body = GraphQlBody {
            query: "{ a }",
            operation_name: Some("A"),
            variables: RegistryVariables {
                graph_id: "g",
                variant: "current",
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["operationName"], "A");
        assert_eq!(json["variables"]["graphID"], "g");
    }
}
