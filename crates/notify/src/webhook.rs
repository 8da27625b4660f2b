//! HTTP delivery callback.
//!
//! Posts each [`Delivery`] as `{"PhoneNumber": ..., "Message": ...}` JSON to
//! the configured notification-dispatch endpoint. Delivery is fire-and-forget
//! from the engine's point of view: errors are returned for logging, never
//! retried here.

use std::collections::HashMap;

use crate::traits::{Delivery, Notifier, NotifyError};

/// Delivers messages as JSON over HTTP to the dispatch service.
///
/// Environment variable references (`${VAR_NAME}`) in the URL and header
/// values are resolved at construction time.
#[derive(Debug)]
pub struct WebhookNotifier {
    /// Target URL (env vars already resolved).
    url: String,
    /// Custom headers to include on every request.
    headers: HashMap<String, String>,
    /// Shared HTTP client (connection pooling).
    client: reqwest::Client,
}

impl WebhookNotifier {
    /// Create a new webhook notifier.
    ///
    /// Missing env vars referenced from `url` or header values produce a
    /// [`NotifyError::Config`] error.
    pub fn new(url: String, headers: HashMap<String, String>) -> Result<Self, NotifyError> {
        let resolved_url = resolve_env_vars(&url)?;
        if !resolved_url.starts_with("http://") && !resolved_url.starts_with("https://") {
            return Err(NotifyError::Config(format!(
                "callback url must be http(s): {resolved_url}"
            )));
        }

        let mut resolved_headers = HashMap::with_capacity(headers.len());
        for (key, value) in &headers {
            resolved_headers.insert(key.clone(), resolve_env_vars(value)?);
        }

        Ok(Self {
            url: resolved_url,
            headers: resolved_headers,
            client: reqwest::Client::new(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, delivery: &Delivery) -> Result<(), NotifyError> {
        let mut request = self.client.post(&self.url).json(delivery);

        for (key, value) in &self.headers {
            request = request.header(key.as_str(), value.as_str());
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            tracing::warn!(
                url = %self.url,
                %status,
                body = %body_text,
                "delivery callback returned non-2xx status"
            );
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body: body_text,
            });
        }

        tracing::debug!(url = %self.url, status = %status, "delivery callback accepted message");

        Ok(())
    }

    fn channel_name(&self) -> &str {
        "webhook"
    }
}

/// Substitute `${VAR_NAME}` references with environment values.
fn resolve_env_vars(input: &str) -> Result<String, NotifyError> {
    let mut resolved = String::with_capacity(input.len());
    let mut rest = input;

    while let Some((before, after)) = rest.split_once("${") {
        resolved.push_str(before);
        let (name, tail) = after.split_once('}').ok_or_else(|| {
            NotifyError::Config(format!("unclosed env var reference in: {input}"))
        })?;
        let value = std::env::var(name)
            .map_err(|_| NotifyError::Config(format!("env var not found: {name}")))?;
        resolved.push_str(&value);
        rest = tail;
    }
    resolved.push_str(rest);

    Ok(resolved)
}
