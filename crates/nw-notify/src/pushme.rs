//! PushMe (push.i-i.me).
//!
//! Form POST to `{base}/` with `push_key`, `title`, `content`, `type=markdown`.
//! The service replies with the literal body `success`; anything else is a
//! rejection. Titles are prefixed with `[#<category>!<icon>]` so the PushMe
//! client files the message under a category with an icon.

use crate::{build_client, checked_body, transport_error, Notifier, NotifyError};

pub const PUSHME_BASE_URL: &str = "https://push.i-i.me";

const CHANNEL: &str = "pushme";

#[derive(Clone)]
pub struct PushmeNotifier {
    client: reqwest::Client,
    base_url: String,
    push_key: String,
    category: String,
    icon: String,
}

impl PushmeNotifier {
    pub fn new(push_key: String, category: String, icon: String) -> Result<Self, NotifyError> {
        Self::new_with_base_url(PUSHME_BASE_URL.to_string(), push_key, category, icon)
    }

    pub fn new_with_base_url(
        base_url: String,
        push_key: String,
        category: String,
        icon: String,
    ) -> Result<Self, NotifyError> {
        if push_key.trim().is_empty() {
            return Err(NotifyError::ConfigurationMissing("pushme push key".to_string()));
        }
        Ok(Self {
            client: build_client(CHANNEL)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            push_key: push_key.trim().to_string(),
            category,
            icon,
        })
    }

    pub fn decorated_title(&self, title: &str) -> String {
        if self.category.is_empty() && self.icon.is_empty() {
            return title.to_string();
        }
        format!("[#{}!{}]{}", self.category, self.icon, title)
    }
}

impl std::fmt::Debug for PushmeNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushmeNotifier")
            .field("base_url", &self.base_url)
            .field("push_key", &"<REDACTED>")
            .field("category", &self.category)
            .finish()
    }
}

#[async_trait::async_trait]
impl Notifier for PushmeNotifier {
    fn name(&self) -> &'static str {
        CHANNEL
    }

    async fn send_markdown(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        let title = self.decorated_title(title);
        let form = [
            ("push_key", self.push_key.as_str()),
            ("title", title.as_str()),
            ("content", body),
            ("type", "markdown"),
        ];
        let resp = self
            .client
            .post(format!("{}/", self.base_url))
            .form(&form)
            .send()
            .await
            .map_err(|e| transport_error(CHANNEL, e))?;
        let text = checked_body(CHANNEL, resp).await?;

        if text.trim() != "success" {
            return Err(NotifyError::Rejected {
                channel: CHANNEL,
                message: text.trim().chars().take(200).collect(),
            });
        }
        Ok(())
    }
}
