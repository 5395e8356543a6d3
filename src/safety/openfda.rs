use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::label::{DrugLabel, LabelSource};
use super::types::{LabelError, SafetyError};

/// Public openFDA endpoint.
pub const OPENFDA_BASE_URL: &str = "https://api.fda.gov";

/// openFDA drug-label client.
pub struct OpenFdaClient {
    base_url: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl OpenFdaClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, SafetyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| SafetyError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs,
        })
    }

    /// Public endpoint with a 10-second timeout.
    pub fn default_public() -> Result<Self, SafetyError> {
        Self::new(OPENFDA_BASE_URL, 10)
    }

    fn map_send_error(&self, e: reqwest::Error) -> LabelError {
        if e.is_connect() {
            LabelError::Connection(self.base_url.clone())
        } else if e.is_timeout() {
            LabelError::Timeout(self.timeout_secs)
        } else {
            LabelError::HttpClient(e.to_string())
        }
    }
}

/// Response body from /drug/label.json
#[derive(Deserialize)]
struct LabelSearchResponse {
    #[serde(default)]
    results: Vec<LabelRecord>,
}

/// openFDA stores every section as an array of paragraphs.
#[derive(Deserialize, Default)]
struct LabelRecord {
    #[serde(default)]
    description: Vec<String>,
    #[serde(default)]
    indications_and_usage: Vec<String>,
    #[serde(default)]
    dosage_and_administration: Vec<String>,
    #[serde(default)]
    warnings: Vec<String>,
    #[serde(default)]
    warnings_and_cautions: Vec<String>,
    #[serde(default)]
    adverse_reactions: Vec<String>,
    #[serde(default)]
    drug_interactions: Vec<String>,
}

fn first(section: Vec<String>) -> Option<String> {
    section.into_iter().next().filter(|s| !s.is_empty())
}

impl From<LabelRecord> for DrugLabel {
    fn from(record: LabelRecord) -> Self {
        Self {
            description: first(record.description).unwrap_or_default(),
            indications_and_usage: first(record.indications_and_usage).unwrap_or_default(),
            dosage_and_administration: first(record.dosage_and_administration)
                .unwrap_or_default(),
            warnings: first(record.warnings)
                .or_else(|| first(record.warnings_and_cautions))
                .unwrap_or_default(),
            adverse_reactions: first(record.adverse_reactions).unwrap_or_default(),
            drug_interactions: first(record.drug_interactions).unwrap_or_default(),
        }
    }
}

#[async_trait]
impl LabelSource for OpenFdaClient {
    async fn fetch_label(&self, generic_name: &str) -> Result<Option<DrugLabel>, LabelError> {
        let url = format!("{}/drug/label.json", self.base_url);
        let search = format!("openfda.generic_name:\"{}\"", generic_name.trim());

        let response = self
            .client
            .get(&url)
            .query(&[("search", search.as_str()), ("limit", "1")])
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        // openFDA answers 404 when the search has no matches.
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LabelError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: LabelSearchResponse = response
            .json()
            .await
            .map_err(|e| LabelError::ResponseParsing(e.to_string()))?;

        Ok(parsed.results.into_iter().next().map(DrugLabel::from))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;

    use super::*;

    async fn fake_label(Query(params): Query<HashMap<String, String>>) -> (StatusCode, String) {
        let search = params.get("search").cloned().unwrap_or_default();
        assert_eq!(params.get("limit").map(String::as_str), Some("1"));

        if search == "openfda.generic_name:\"warfarin\"" {
            let body = serde_json::json!({
                "meta": {},
                "results": [{
                    "description": ["Warfarin sodium tablets."],
                    "warnings_and_cautions": ["Bleeding risk."],
                    "adverse_reactions": ["Bleeding (12%)"],
                    "drug_interactions": ["Aspirin and NSAIDs increase bleeding risk."]
                }]
            });
            (StatusCode::OK, body.to_string())
        } else if search.contains("\"emptyresults\"") {
            (StatusCode::OK, r#"{"results": []}"#.into())
        } else if search.contains("\"garbled\"") {
            (StatusCode::OK, "<html>not json</html>".into())
        } else if search.contains("\"overloaded\"") {
            (StatusCode::SERVICE_UNAVAILABLE, "try later".into())
        } else {
            (
                StatusCode::NOT_FOUND,
                r#"{"error": {"code": "NOT_FOUND", "message": "No matches found!"}}"#.into(),
            )
        }
    }

    async fn spawn_fake_openfda() -> String {
        let app = Router::new().route("/drug/label.json", get(fake_label));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[test]
    fn client_trims_trailing_slash() {
        let client = OpenFdaClient::new("https://api.fda.gov/", 5).unwrap();
        assert_eq!(client.base_url, "https://api.fda.gov");
        assert_eq!(client.timeout_secs, 5);
    }

    #[test]
    fn default_public_uses_openfda() {
        let client = OpenFdaClient::default_public().unwrap();
        assert_eq!(client.base_url, OPENFDA_BASE_URL);
    }

    #[tokio::test]
    async fn fetches_and_maps_label_sections() {
        let base = spawn_fake_openfda().await;
        let client = OpenFdaClient::new(&base, 5).unwrap();

        let label = client.fetch_label("warfarin").await.unwrap().unwrap();
        assert_eq!(label.description, "Warfarin sodium tablets.");
        assert_eq!(label.warnings, "Bleeding risk.");
        assert_eq!(label.adverse_reactions, "Bleeding (12%)");
        assert!(label.drug_interactions.contains("Aspirin"));
        assert!(label.indications_and_usage.is_empty());
    }

    #[tokio::test]
    async fn not_found_is_none() {
        let base = spawn_fake_openfda().await;
        let client = OpenFdaClient::new(&base, 5).unwrap();
        assert!(client.fetch_label("unobtainium").await.unwrap().is_none());
        assert!(client.fetch_label("emptyresults").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn server_error_is_status() {
        let base = spawn_fake_openfda().await;
        let client = OpenFdaClient::new(&base, 5).unwrap();
        match client.fetch_label("overloaded").await {
            Err(LabelError::Status { status, body }) => {
                assert_eq!(status, 503);
                assert_eq!(body, "try later");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_body_is_parse_error() {
        let base = spawn_fake_openfda().await;
        let client = OpenFdaClient::new(&base, 5).unwrap();
        assert!(matches!(
            client.fetch_label("garbled").await,
            Err(LabelError::ResponseParsing(_))
        ));
    }

    #[tokio::test]
    async fn refused_connection_is_connection_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = OpenFdaClient::new(&format!("http://{addr}"), 5).unwrap();
        assert!(matches!(
            client.fetch_label("warfarin").await,
            Err(LabelError::Connection(_))
        ));
    }
}
