//! Bark (iOS push).
//!
//! JSON POST to `{base}/{device_key}` with `title`, `body`, `group`.
//! Bark replies `{"code":200,"message":"success"}`.

use serde::Deserialize;
use serde_json::json;

use crate::{build_client, checked_body, transport_error, Notifier, NotifyError};

pub const BARK_BASE_URL: &str = "https://api.day.app";

const CHANNEL: &str = "bark";

#[derive(Clone)]
pub struct BarkNotifier {
    client: reqwest::Client,
    base_url: String,
    device_key: String,
    group: String,
}

impl BarkNotifier {
    pub fn new(device_key: String, group: String) -> Result<Self, NotifyError> {
        Self::new_with_base_url(BARK_BASE_URL.to_string(), device_key, group)
    }

    pub fn new_with_base_url(
        base_url: String,
        device_key: String,
        group: String,
    ) -> Result<Self, NotifyError> {
        if device_key.trim().is_empty() {
            return Err(NotifyError::ConfigurationMissing("bark device key".to_string()));
        }
        Ok(Self {
            client: build_client(CHANNEL)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            device_key: device_key.trim().to_string(),
            group,
        })
    }
}

impl std::fmt::Debug for BarkNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BarkNotifier")
            .field("base_url", &self.base_url)
            .field("device_key", &"<REDACTED>")
            .field("group", &self.group)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct BarkResponse {
    code: i64,
    #[serde(default)]
    message: String,
}

#[async_trait::async_trait]
impl Notifier for BarkNotifier {
    fn name(&self) -> &'static str {
        CHANNEL
    }

    async fn send_markdown(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        let payload = json!({
            "title": title,
            "body": body,
            "group": self.group,
        });
        let resp = self
            .client
            .post(format!("{}/{}", self.base_url, self.device_key))
            .json(&payload)
            .send()
            .await
            .map_err(|e| transport_error(CHANNEL, e))?;
        let text = checked_body(CHANNEL, resp).await?;

        let parsed: BarkResponse =
            serde_json::from_str(&text).map_err(|e| NotifyError::Rejected {
                channel: CHANNEL,
                message: format!("unreadable response: {e}"),
            })?;
        if parsed.code != 200 {
            return Err(NotifyError::Rejected {
                channel: CHANNEL,
                message: format!("code={} message={}", parsed.code, parsed.message),
            });
        }
        Ok(())
    }
}
