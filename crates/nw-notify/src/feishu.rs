//! Feishu custom-bot webhook.
//!
//! POST `{base}/open-apis/bot/v2/hook/{token}` with an interactive card whose
//! single element is a markdown block. Feishu answers HTTP 200 even for a
//! refused message; `code != 0` in the body means rejection.

use serde::Deserialize;
use serde_json::json;

use crate::{build_client, checked_body, transport_error, Notifier, NotifyError};

pub const FEISHU_BASE_URL: &str = "https://open.feishu.cn";

const CHANNEL: &str = "feishu";

#[derive(Clone)]
pub struct FeishuNotifier {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl FeishuNotifier {
    pub fn new(token: String) -> Result<Self, NotifyError> {
        Self::new_with_base_url(FEISHU_BASE_URL.to_string(), token)
    }

    pub fn new_with_base_url(base_url: String, token: String) -> Result<Self, NotifyError> {
        if token.trim().is_empty() {
            return Err(NotifyError::ConfigurationMissing(
                "feishu webhook token".to_string(),
            ));
        }
        Ok(Self {
            client: build_client(CHANNEL)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.trim().to_string(),
        })
    }
}

impl std::fmt::Debug for FeishuNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeishuNotifier")
            .field("base_url", &self.base_url)
            .field("token", &"<REDACTED>")
            .finish()
    }
}

/// Interactive card with a plain-text header and one markdown element.
pub(crate) fn card_payload(title: &str, body: &str) -> serde_json::Value {
    json!({
        "msg_type": "interactive",
        "card": {
            "config": { "wide_screen_mode": true },
            "header": {
                "title": { "tag": "plain_text", "content": title },
                "template": "red"
            },
            "elements": [
                { "tag": "markdown", "content": body }
            ]
        }
    })
}

#[derive(Debug, Deserialize)]
struct FeishuResponse {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default, rename = "StatusCode")]
    status_code: Option<i64>,
    #[serde(default)]
    msg: Option<String>,
}

#[async_trait::async_trait]
impl Notifier for FeishuNotifier {
    fn name(&self) -> &'static str {
        CHANNEL
    }

    async fn send_markdown(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        let url = format!("{}/open-apis/bot/v2/hook/{}", self.base_url, self.token);
        let resp = self
            .client
            .post(url)
            .json(&card_payload(title, body))
            .send()
            .await
            .map_err(|e| transport_error(CHANNEL, e))?;
        let text = checked_body(CHANNEL, resp).await?;

        let parsed: FeishuResponse =
            serde_json::from_str(&text).map_err(|e| NotifyError::Rejected {
                channel: CHANNEL,
                message: format!("unreadable response: {e}"),
            })?;
        let code = parsed.code.or(parsed.status_code).unwrap_or(0);
        if code != 0 {
            return Err(NotifyError::Rejected {
                channel: CHANNEL,
                message: format!("code={code} msg={}", parsed.msg.unwrap_or_default()),
            });
        }
        Ok(())
    }
}
