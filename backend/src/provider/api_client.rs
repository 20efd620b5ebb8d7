//! Gemini API client
//!
//! Direct HTTP client for the Gemini REST API: content generation,
//! long-running video operations and file downloads.

use crate::provider::gemini_types::{
    GenerateContentRequest, GenerateContentResponse, Operation, PredictLongRunningRequest,
};
use crate::studio::StudioError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error};

/// Header carrying the API key; keeps the credential out of URLs and errors
pub const API_KEY_HEADER: &str = "x-goog-api-key";

/// Shared Gemini client (reuses one connection pool)
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    /// Create a client for `base_url` authenticating with `api_key`
    pub fn new(http: reqwest::Client, api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Call `models/{model}:generateContent`
    ///
    /// # Errors
    /// * `StudioError::Provider` if the key is empty, the HTTP call fails, the
    ///   status is not 2xx, the body cannot be parsed, or the prompt was blocked
    pub async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, StudioError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);

        debug!(
            model = %model,
            parts = request.contents.iter().map(|c| c.parts.len()).sum::<usize>(),
            "Calling Gemini generateContent"
        );

        let parsed: GenerateContentResponse = self.post_json(&url, request).await?;

        if let Some(reason) = parsed
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_ref())
        {
            return Err(StudioError::Provider(format!(
                "Gemini API blocked the prompt: {}",
                reason
            )));
        }

        Ok(parsed)
    }

    /// Start a video job via `models/{model}:predictLongRunning`
    pub async fn submit_video(
        &self,
        model: &str,
        request: &PredictLongRunningRequest,
    ) -> Result<Operation, StudioError> {
        let url = format!("{}/models/{}:predictLongRunning", self.base_url, model);

        debug!(model = %model, "Submitting Gemini video job");

        let operation: Operation = self.post_json(&url, request).await?;
        if operation.name.is_empty() {
            return Err(StudioError::provider(
                "Gemini API returned an operation without a name",
            ));
        }
        Ok(operation)
    }

    /// Fetch the current state of an operation
    pub async fn get_operation(&self, name: &str) -> Result<Operation, StudioError> {
        self.ensure_key()?;
        let url = format!("{}/{}", self.base_url, name);

        let response = self
            .http
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|e| {
                StudioError::Provider(format!(
                    "Failed to send HTTP request to Gemini API: {}",
                    e.without_url()
                ))
            })?;
        Self::parse_response(response).await
    }

    /// Download a file produced by the API (e.g. a generated video)
    pub async fn download(&self, uri: &str) -> Result<Vec<u8>, StudioError> {
        self.ensure_key()?;
        debug!("Downloading generated file");

        let response = self
            .http
            .get(uri)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|e| {
                StudioError::Provider(format!(
                    "Failed to download generated file: {}",
                    e.without_url()
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(StudioError::Provider(format!(
                "Download failed with status {}",
                status.as_u16()
            )));
        }

        let bytes = response.bytes().await.map_err(|e| {
            StudioError::Provider(format!("Failed to read downloaded file: {}", e.without_url()))
        })?;

        if bytes.is_empty() {
            return Err(StudioError::provider("Downloaded file is empty"));
        }

        Ok(bytes.to_vec())
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T, StudioError> {
        self.ensure_key()?;

        let response = self
            .http
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                StudioError::Provider(format!(
                    "Failed to send HTTP request to Gemini API: {}",
                    e.without_url()
                ))
            })?;

        Self::parse_response(response).await
    }

    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, StudioError> {
        let status = response.status();
        if !status.is_success() {
            let status_code = status.as_u16();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error body".to_string());

            error!(
                status_code = status_code,
                error_body = %error_body,
                "Gemini API returned error status"
            );

            if status_code == 429 {
                return Err(StudioError::Provider(format!(
                    "Gemini API rate limit exceeded (HTTP {}): {}",
                    status_code, error_body
                )));
            }

            return Err(StudioError::Provider(format!(
                "Gemini API returned error status {}: {}",
                status_code, error_body
            )));
        }

        let response_body = response.text().await.map_err(|e| {
            StudioError::Provider(format!(
                "Failed to read response body from Gemini API: {}",
                e.without_url()
            ))
        })?;

        serde_json::from_str(&response_body).map_err(|e| {
            StudioError::Provider(format!(
                "Failed to parse JSON response from Gemini API: {} - Response body: {}",
                e, response_body
            ))
        })
    }

    fn ensure_key(&self) -> Result<(), StudioError> {
        if self.api_key.is_empty() {
            return Err(StudioError::provider("API key is empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::gemini_types::Part;
    use mockito::{Matcher, Server};
    use serial_test::serial;


    #[tokio::test]
    async fn test_empty_api_key() {
        let client = GeminiClient::new(reqwest::Client::new(), "", "http://127.0.0.1:9");
        let result = client
            .generate_content("m", &GenerateContentRequest::user(vec![Part::text("hi")]))
            .await;
        assert_eq!(result.unwrap_err(), StudioError::provider("API key is empty"));
    }

    #[tokio::test]
    #[serial]
    async fn test_generate_content_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-2.5-flash:generateContent")
            .match_header(API_KEY_HEADER, "test-key")
            .match_header("content-type", "application/json")
            .with_status(200)
            .with_body(
                r#"{
                    "candidates": [{
                        "content": {
                            "parts": [{"text": "This is a test response"}],
                            "role": "model"
                        }
                    }]
                }"#,
            )
            .create_async()
            .await;

        let client = GeminiClient::new(reqwest::Client::new(), "test-key", server.url());
        let response = client
            .generate_content(
                "gemini-2.5-flash",
                &GenerateContentRequest::user(vec![Part::text("test prompt")]),
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.text(), "This is a test response");
    }

    #[tokio::test]
    #[serial]
    async fn test_generate_content_blocked_prompt() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/models/m:generateContent")
            .match_header(API_KEY_HEADER, "test-key")
            .with_status(200)
            .with_body(r#"{"candidates": [], "promptFeedback": {"blockReason": "SAFETY"}}"#)
            .create_async()
            .await;

        let client = GeminiClient::new(reqwest::Client::new(), "test-key", server.url());
        let err = client
            .generate_content("m", &GenerateContentRequest::user(vec![Part::text("x")]))
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert!(err.to_string().contains("blocked the prompt: SAFETY"));
    }

    #[tokio::test]
    #[serial]
    async fn test_generate_content_rate_limit() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/models/m:generateContent")
            .match_header(API_KEY_HEADER, "test-key")
            .with_status(429)
            .with_body(r#"{"error": "Rate limit exceeded"}"#)
            .create_async()
            .await;

        let client = GeminiClient::new(reqwest::Client::new(), "test-key", server.url());
        let err = client
            .generate_content("m", &GenerateContentRequest::user(vec![Part::text("x")]))
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert!(err.to_string().contains("rate limit"));
    }

    #[tokio::test]
    #[serial]
    async fn test_generate_content_invalid_json() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/models/m:generateContent")
            .match_header(API_KEY_HEADER, "test-key")
            .with_status(200)
            .with_body("This is not JSON")
            .create_async()
            .await;

        let client = GeminiClient::new(reqwest::Client::new(), "test-key", server.url());
        let err = client
            .generate_content("m", &GenerateContentRequest::user(vec![Part::text("x")]))
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert!(err.to_string().contains("Failed to parse JSON"));
    }

    #[tokio::test]
    #[serial]
    async fn test_get_operation_and_download() {
        let mut server = Server::new_async().await;
        let op_mock = server
            .mock("GET", "/models/veo/operations/42")
            .match_header(API_KEY_HEADER, "test-key")
            .with_status(200)
            .with_body(r#"{"name": "models/veo/operations/42", "done": false}"#)
            .create_async()
            .await;
        let file_mock = server
            .mock("GET", "/files/v.mp4:download")
            .match_query(Matcher::UrlEncoded("alt".into(), "media".into()))
            .match_header(API_KEY_HEADER, "test-key")
            .with_status(200)
            .with_body(vec![0u8, 1, 2, 3])
            .create_async()
            .await;

        let client = GeminiClient::new(reqwest::Client::new(), "test-key", server.url());
        let op = client
            .get_operation("models/veo/operations/42")
            .await
            .unwrap();
        assert!(!op.done);

        let bytes = client
            .download(&format!("{}/files/v.mp4:download?alt=media", server.url()))
            .await
            .unwrap();
        assert_eq!(bytes, vec![0, 1, 2, 3]);

        op_mock.assert_async().await;
        file_mock.assert_async().await;
    }

    #[tokio::test]
    #[serial]
    async fn test_download_failure_status() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/files/missing")
            .match_header(API_KEY_HEADER, "test-key")
            .with_status(404)
            .create_async()
            .await;

        let client = GeminiClient::new(reqwest::Client::new(), "test-key", server.url());
        let err = client
            .download(&format!("{}/files/missing", server.url()))
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn test_connection_error_does_not_expose_key() {
        let client = GeminiClient::new(reqwest::Client::new(), "SECRETKEY123", "http://127.0.0.1:1");

        let err = client
            .generate_content("m", &GenerateContentRequest::user(vec![Part::text("x")]))
            .await
            .unwrap_err()
            .to_string();
        assert!(err.contains("Failed to send HTTP request"));
        assert!(!err.contains("SECRETKEY123"));

        let err = client
            .get_operation("models/veo/operations/1")
            .await
            .unwrap_err()
            .to_string();
        assert!(!err.contains("SECRETKEY123"));

        let err = client
            .download("http://127.0.0.1:1/files/v.mp4:download?alt=media")
            .await
            .unwrap_err()
            .to_string();
        assert!(err.contains("Failed to download"));
        assert!(!err.contains("SECRETKEY123"));
    }
}
