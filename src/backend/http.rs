//! HTTP client for the Constellations scene API

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use super::SceneBackend;
use crate::config::NavigatorConfig;
use crate::error::{NavError, Result};
use crate::scene::{Scene, SceneId, TimelineResponse};

const HOME_TIMELINE: &str = "GET /scenes/home-timeline";
const HANDLE_TIMELINE: &str = "GET /handle/:handle/timeline";
const NEARBY_TIMELINE: &str = "GET /scene/:id/nearby-global";
const GET_SCENE: &str = "GET /scene/:id";

pub struct HttpSceneBackend {
    client: Client,
    base: Url,
}

impl HttpSceneBackend {
    pub fn new(config: &NavigatorConfig) -> Result<Self> {
        let base = Url::parse(&config.api_url)
            .map_err(|e| NavError::Config(format!("invalid api_url {:?}: {e}", config.api_url)))?;
        if base.cannot_be_a_base() {
            return Err(NavError::Config(format!(
                "api_url {:?} cannot be used as a base URL",
                config.api_url
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .default_headers(headers)
            .build()?;

        Ok(Self { client, base })
    }

    /// Build an endpoint URL from path segments; segments are percent-encoded.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// GET and decode. `Ok(None)` on 404.
    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        url: Url,
        query: &[(&str, u32)],
    ) -> Result<Option<T>> {
        tracing::debug!(%url, endpoint, "backend request");

        let response = self.client.get(url).query(query).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(NavError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        decode_body(endpoint, &body).map(Some)
    }

    async fn get_timeline(&self, endpoint: &str, url: Url, query: &[(&str, u32)]) -> Result<Vec<Scene>> {
        match self.get::<TimelineResponse>(endpoint, url, query).await? {
            Some(timeline) => Ok(timeline.results),
            None => Err(NavError::Status {
                endpoint: endpoint.to_string(),
                status: StatusCode::NOT_FOUND.as_u16(),
            }),
        }
    }
}

/// Decode an API body, honouring the `{"error": true, "message": ...}`
/// envelope the backend uses for failures.
pub(crate) fn decode_body<T: DeserializeOwned>(endpoint: &str, body: &str) -> Result<T> {
    let value: Value = serde_json::from_str(body).map_err(|e| NavError::schema(endpoint, e))?;

    if value.get("error").and_then(Value::as_bool) == Some(true) {
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("no details provided")
            .to_string();
        return Err(NavError::Api {
            endpoint: endpoint.to_string(),
            message,
        });
    }

    serde_json::from_value(value).map_err(|e| NavError::schema(endpoint, e))
}

#[async_trait]
impl SceneBackend for HttpSceneBackend {
    async fn home_timeline(&self, page: u32) -> Result<Vec<Scene>> {
        let url = self.url(&["scenes", "home-timeline"]);
        self.get_timeline(HOME_TIMELINE, url, &[("page", page)]).await
    }

    async fn handle_timeline(&self, handle: &str, page: u32) -> Result<Vec<Scene>> {
        let url = self.url(&["handle", handle, "timeline"]);
        self.get_timeline(HANDLE_TIMELINE, url, &[("page", page)]).await
    }

    async fn nearby_timeline(&self, base: &SceneId, size: u32) -> Result<Vec<Scene>> {
        let url = self.url(&["scene", base.as_str(), "nearby-global"]);
        self.get_timeline(NEARBY_TIMELINE, url, &[("size", size)]).await
    }

    async fn scene(&self, id: &SceneId) -> Result<Option<Scene>> {
        let url = self.url(&["scene", id.as_str()]);
        self.get(GET_SCENE, url, &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_for(api_url: &str) -> HttpSceneBackend {
        let config = NavigatorConfig {
            api_url: api_url.to_string(),
            ..NavigatorConfig::default()
        };
        HttpSceneBackend::new(&config).unwrap()
    }

    #[test]
    fn urls_join_under_base_path() {
        let backend = client_for("https://api.example.org");
        assert_eq!(
            backend.url(&["scenes", "home-timeline"]).as_str(),
            "https://api.example.org/scenes/home-timeline"
        );

        let backend = client_for("https://example.org/api/");
        assert_eq!(
            backend.url(&["scene", "abc"]).as_str(),
            "https://example.org/api/scene/abc"
        );
    }

    #[test]
    fn handle_segment_is_percent_encoded() {
        let backend = client_for("https://api.example.org");
        assert_eq!(
            backend.url(&["handle", "a b/c", "timeline"]).as_str(),
            "https://api.example.org/handle/a%20b%2Fc/timeline"
        );
    }

    #[test]
    fn invalid_base_url_is_config_error() {
        let config = NavigatorConfig {
            api_url: "not a url".to_string(),
            ..NavigatorConfig::default()
        };
        assert!(matches!(
            HttpSceneBackend::new(&config),
            Err(NavError::Config(_))
        ));
    }

    #[test]
    fn error_envelope_becomes_api_error() {
        let err = decode_body::<TimelineResponse>(
            HOME_TIMELINE,
            r#"{"error": true, "message": "database unavailable"}"#,
        )
        .unwrap_err();
        match err {
            NavError::Api { message, .. } => assert_eq!(message, "database unavailable"),
            other => panic!("unexpected error: {other}"),
        }

        let err = decode_body::<TimelineResponse>(HOME_TIMELINE, r#"{"error": true}"#).unwrap_err();
        assert!(err.to_string().contains("no details provided"));
        assert!(err.is_transient());
    }

    #[test]
    fn shape_mismatch_is_schema_error() {
        let err = decode_body::<TimelineResponse>(HOME_TIMELINE, r#"{"results": [{"id": 1}]}"#)
            .unwrap_err();
        assert!(matches!(err, NavError::Schema { .. }));
        assert!(!err.is_transient());
    }

    #[test]
    fn empty_timeline_decodes() {
        let timeline =
            decode_body::<TimelineResponse>(HOME_TIMELINE, r#"{"error": false, "results": []}"#)
                .unwrap();
        assert!(timeline.results.is_empty());
    }
}
