//! Bearer-token JSON client shared by the People and Calendar adapters.

use contact_dates_core::ServiceError;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    access_token: String,
}

impl ApiClient {
    pub fn new(access_token: impl Into<String>) -> Self {
        ApiClient {
            http: reqwest::Client::new(),
            access_token: access_token.into(),
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, ServiceError> {
        let request = self.request(Method::GET, url);
        decode(send(request).await?).await
    }

    pub async fn send_json<B, T>(&self, method: Method, url: Url, body: &B) -> Result<T, ServiceError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(method, url).json(body);
        decode(send(request).await?).await
    }

    /// DELETE `url`. A resource that is already gone counts as deleted.
    pub async fn delete(&self, url: Url) -> Result<(), ServiceError> {
        let response = self
            .request(Method::DELETE, url)
            .send()
            .await
            .map_err(transport_error)?;

        match response.status() {
            s if s.is_success() || s == StatusCode::GONE => Ok(()),
            s => Err(status_error(s, &response.text().await.unwrap_or_default())),
        }
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!(%method, %url, "Google API request");
        self.http.request(method, url).bearer_auth(&self.access_token)
    }
}

async fn send(request: RequestBuilder) -> Result<reqwest::Response, ServiceError> {
    let response = request.send().await.map_err(transport_error)?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, &body))
}

fn transport_error(e: reqwest::Error) -> ServiceError {
    ServiceError::Unavailable(format!("Request failed: {}", e))
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ServiceError> {
    response
        .json()
        .await
        .map_err(|e| ServiceError::Unavailable(format!("Failed to parse response: {}", e)))
}

/// Classify a non-success status.
pub(crate) fn status_error(status: StatusCode, body: &str) -> ServiceError {
    let message = format!("{} {}", status.as_u16(), error_message(body));

    match status {
        StatusCode::NOT_FOUND | StatusCode::GONE => ServiceError::NotFound(message),
        StatusCode::TOO_MANY_REQUESTS | StatusCode::REQUEST_TIMEOUT => ServiceError::Unavailable(message),
        s if s.is_server_error() => ServiceError::Unavailable(message),
        _ => ServiceError::Rejected(message),
    }
}

/// Google wraps errors as `{"error": {"message": ...}}`; fall back to the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}
