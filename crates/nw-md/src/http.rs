use std::time::Duration;

use crate::FetchError;

/// Upstreams reject requests without a browser-looking User-Agent.
pub(crate) const BROWSER_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::Client, FetchError> {
    reqwest::Client::builder()
        .user_agent(BROWSER_UA)
        .timeout(timeout)
        .build()
        .map_err(|e| FetchError::NetworkUnavailable(format!("http client build failed: {e}")))
}

/// Read the body as (lossy) UTF-8 after rejecting non-2xx statuses.
///
/// Some upstreams answer in GBK; only ASCII fields are consumed, so lossy
/// decoding is sufficient.
pub(crate) async fn text_body(resp: reqwest::Response, what: &str) -> Result<String, FetchError> {
    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::NetworkUnavailable(format!(
            "{what} http error status={}",
            status.as_u16()
        )));
    }
    let bytes = resp.bytes().await?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub(crate) fn trim_base(base_url: &str) -> &str {
    base_url.trim_end_matches('/')
}

pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
