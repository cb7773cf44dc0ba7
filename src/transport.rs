use std::time::Duration;

use reqwest::blocking::Client as HttpClient;

use crate::errors::GameJoltError;

/// Performs an HTTP GET and hands back the body text.
///
/// Implementations own any timeout or retry policy; the client reports a
/// failed request once and never retries.
pub trait Transport: Send + Sync {
    fn get(&self, url: &str) -> Result<String, GameJoltError>;
}

/// Default transport backed by a blocking `reqwest` client.
/// gzip and deflate replies are decompressed transparently.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: HttpClient,
}

impl HttpTransport {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, GameJoltError> {
        let http = HttpClient::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .gzip(true)
            .deflate(true)
            .build()
            .map_err(|err| GameJoltError::Transport {
                url: String::new(),
                reason: err.to_string(),
            })?;

        Ok(Self { http })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<String, GameJoltError> {
        let transport_err = |err: reqwest::Error| GameJoltError::Transport {
            url: url.to_string(),
            reason: err.to_string(),
        };

        let response = self.http.get(url).send().map_err(transport_err)?;

        if !response.status().is_success() {
            return Err(GameJoltError::HttpStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        response.text().map_err(transport_err)
    }
}
