//! Executes `HttpRequest` values over the network.
//!
//! `Transport` is the seam between the I/O-free `PoEditorClient` and the
//! wire. `UreqTransport` is the blocking implementation; tests can swap in
//! anything that maps a request to a response.

use std::time::Duration;

use crate::error::Result;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, RequestBody};

/// Upper bound on a response body, export downloads included.
const MAX_BODY_BYTES: u64 = 128 * 1024 * 1024;

pub trait Transport: Send + Sync {
    /// Perform one HTTP round trip. Non-2xx statuses are returned as
    /// responses, not errors; only transport failures are `Err`.
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

/// Blocking transport backed by a shared `ureq::Agent`.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        // Status interpretation belongs to the client, so 4xx/5xx come back
        // as data.
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let extra_headers = request
            .headers
            .iter()
            .filter(|(key, _)| !key.eq_ignore_ascii_case("content-type"));

        let mut response = match (request.method, &request.body) {
            (HttpMethod::Get, _) => {
                let mut builder = self.agent.get(&request.url);
                for (key, value) in extra_headers {
                    builder = builder.header(key.as_str(), value.as_str());
                }
                builder.call()?
            }
            (HttpMethod::Post, body) => {
                let mut builder = self.agent.post(&request.url);
                for (key, value) in extra_headers {
                    builder = builder.header(key.as_str(), value.as_str());
                }
                match body {
                    Some(RequestBody::Form(fields)) => {
                        builder.send_form(fields.iter().map(|(k, v)| (k.as_str(), v.as_str())))?
                    }
                    Some(RequestBody::Multipart(multipart)) => {
                        let encoded = multipart.encode();
                        builder.content_type(multipart.content_type()).send(&encoded[..])?
                    }
                    None => builder.send_empty()?,
                }
            }
        };

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .with_config()
            .limit(MAX_BODY_BYTES)
            .read_to_vec()?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;

    #[test]
    fn connection_refused_is_network_error() {
        let transport = UreqTransport::new(Duration::from_secs(2));
        let request = HttpRequest {
            method: HttpMethod::Get,
            url: "http://127.0.0.1:1/projects/list".to_string(),
            headers: Vec::new(),
            body: None,
        };
        let err = transport.execute(&request).unwrap_err();
        assert!(matches!(err, ApiError::Network(_)), "got {err:?}");
    }
}
