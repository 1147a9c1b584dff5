use super::{LookupError, NutritionResult, NutritionService};
use crate::models::{NutritionResponse, DEFAULT_NUTRITION_API_URL};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

const NUTRITION_PATH: &str = "/v1/nutrition";

/// Client for the CalorieNinjas `GET /v1/nutrition` endpoint.
pub struct CalorieNinjasClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl CalorieNinjasClient {
    /// Build a client whose requests give up after `timeout`.
    pub fn new(api_key: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::new_with_client(api_key, client))
    }

    pub fn new_with_client(api_key: String, client: Client) -> Self {
        Self {
            client,
            api_key,
            base_url: DEFAULT_NUTRITION_API_URL.to_string(),
        }
    }

    /// Point the client at another host, e.g. a local mock server.
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn describe_transport_error(e: &reqwest::Error) -> String {
        if e.is_timeout() {
            format!("request timed out: {}", e)
        } else if e.is_connect() {
            format!("could not connect: {}", e)
        } else {
            e.to_string()
        }
    }
}

#[async_trait]
impl NutritionService for CalorieNinjasClient {
    async fn lookup(&self, query: &str) -> NutritionResult {
        let url = format!("{}{}", self.base_url, NUTRITION_PATH);
        tracing::debug!("Sending nutrition lookup for '{}'", query);

        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .query(&[("query", query)])
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send request to nutrition API: {}", e);
                LookupError::Transport(Self::describe_transport_error(&e))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            tracing::error!("Failed to read nutrition API response: {}", e);
            LookupError::Transport(Self::describe_transport_error(&e))
        })?;

        if !status.is_success() {
            tracing::error!("Nutrition API error (status {}): {}", status, body);
            return Err(LookupError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: NutritionResponse = serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse nutrition response: {}\nBody: {}", e, body);
            LookupError::Decode {
                message: e.to_string(),
                body: body.clone(),
            }
        })?;

        tracing::debug!("Nutrition API returned {} item(s)", parsed.items.len());
        Ok(parsed.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NutritionItem;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_client(server: &MockServer, api_key: &str) -> CalorieNinjasClient {
        CalorieNinjasClient::new(api_key.to_string(), Duration::from_secs(5))
            .unwrap()
            .with_base_url(server.uri())
    }

    #[tokio::test]
    async fn test_lookup_parses_single_item() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/nutrition"))
            .and(query_param("query", "a banana"))
            .and(header("X-Api-Key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [{
                    "name": "banana",
                    "calories": 105,
                    "carbohydrates_total_g": 27,
                    "protein_g": 1.3,
                    "fat_total_g": 0.4
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server, "test-key");
        let items = client.lookup("a banana").await.unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "banana");
        assert_eq!(items[0].calories, 105.0);
    }

    #[tokio::test]
    async fn test_lookup_preserves_item_order() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/nutrition"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [
                    {"name": "toast", "calories": 80, "carbohydrates_total_g": 15, "protein_g": 3, "fat_total_g": 1},
                    {"name": "egg", "calories": 70, "carbohydrates_total_g": 0.4, "protein_g": 6, "fat_total_g": 5},
                    {"name": "bacon", "calories": 45, "carbohydrates_total_g": 0.1, "protein_g": 3, "fat_total_g": 3.5}
                ]
            })))
            .mount(&server)
            .await;

        let client = make_client(&server, "test-key");
        let names: Vec<String> = client
            .lookup("toast egg and bacon")
            .await
            .unwrap()
            .into_iter()
            .map(|item| item.name)
            .collect();

        assert_eq!(names, vec!["toast", "egg", "bacon"]);
    }

    #[tokio::test]
    async fn test_lookup_empty_items_is_success() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/nutrition"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": []
            })))
            .mount(&server)
            .await;

        let client = make_client(&server, "test-key");
        let items = client.lookup("a blurry photo").await.unwrap();
        assert_eq!(items, Vec::<NutritionItem>::new());
    }

    #[tokio::test]
    async fn test_lookup_unauthorized_returns_body_verbatim() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/nutrition"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let client = make_client(&server, "bad-key");
        let err = client.lookup("a banana").await.unwrap_err();

        assert_eq!(
            err,
            LookupError::Http {
                status: 401,
                body: "invalid api key".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_lookup_server_error_is_not_retried() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/nutrition"))
            .respond_with(ResponseTemplate::new(503).set_body_string("try later"))
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server, "test-key");
        let err = client.lookup("soup").await.unwrap_err();
        assert!(matches!(err, LookupError::Http { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_lookup_malformed_success_body_is_decode_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/nutrition"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = make_client(&server, "test-key");
        let err = client.lookup("soup").await.unwrap_err();

        assert!(matches!(err, LookupError::Decode { .. }));
        assert_eq!(err.body(), Some("<html>oops</html>"));
    }

    #[tokio::test]
    async fn test_lookup_url_encodes_query() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/nutrition"))
            .and(query_param("query", "mac & cheese, 2 cups"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server, "test-key");
        client.lookup("mac & cheese, 2 cups").await.unwrap();
    }

    #[tokio::test]
    async fn test_lookup_unreachable_host_is_transport_error() {
        // Grab a free port, then close it so nothing is listening there.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = CalorieNinjasClient::new("test-key".to_string(), Duration::from_secs(2))
            .unwrap()
            .with_base_url(format!("http://127.0.0.1:{}", port));
        let err = client.lookup("a banana").await.unwrap_err();

        assert!(matches!(err, LookupError::Transport(_)));
    }

    #[tokio::test]
    async fn test_lookup_times_out() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/nutrition"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "items": [] }))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let client = CalorieNinjasClient::new("test-key".to_string(), Duration::from_millis(200))
            .unwrap()
            .with_base_url(server.uri());
        let err = client.lookup("a banana").await.unwrap_err();

        assert!(matches!(err, LookupError::Transport(ref msg) if msg.contains("timed out")));
    }
}
