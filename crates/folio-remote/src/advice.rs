use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::RemoteError;
use crate::error::RemoteResult;

#[derive(Debug, Deserialize)]
struct AdviceEnvelope {
    slip: AdviceSlip,
}

#[derive(Debug, Deserialize)]
struct AdviceSlip {
    advice: String,
}

/// Client for the third-party "advice slip" service behind `motd`.
#[derive(Debug, Clone)]
pub struct AdviceClient {
    client: reqwest::Client,
    url: String,
}

impl AdviceClient {
    pub fn new(url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            url: url.into(),
        }
    }

    pub async fn fetch_advice(&self) -> RemoteResult<String> {
        let resp = self.client.get(&self.url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(RemoteError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }
        let envelope = resp
            .json::<AdviceEnvelope>()
            .await
            .map_err(|err| RemoteError::Decode(err.to_string()))?;
        debug!("fetched advice slip");
        Ok(envelope.slip.advice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::method;
    use wiremock::matchers::path;
    use wiremock::Mock;
    use wiremock::MockServer;
    use wiremock::ResponseTemplate;

    #[tokio::test]
    async fn extracts_slip_advice() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/advice"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                serde_json::json!({ "slip": { "id": 7, "advice": "Stay hydrated." } }).to_string(),
                "application/json",
            ))
            .mount(&server)
            .await;

        let client = AdviceClient::new(format!("{}/advice", server.uri()));
        assert_eq!(client.fetch_advice().await.expect("advice"), "Stay hydrated.");
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/advice"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = AdviceClient::new(format!("{}/advice", server.uri()));
        let err = client.fetch_advice().await.expect_err("status error");
        assert!(matches!(err, RemoteError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn unexpected_body_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/advice"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("{\"message\":\"nope\"}", "application/json"))
            .mount(&server)
            .await;

        let client = AdviceClient::new(format!("{}/advice", server.uri()));
        assert!(matches!(
            client.fetch_advice().await,
            Err(RemoteError::Decode(_))
        ));
    }
}
