use geoprobe_core::api::ProviderError;

const BODY_PREVIEW_LIMIT: usize = 300;

pub(crate) fn preview_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }
    let mut out: String = trimmed.chars().take(BODY_PREVIEW_LIMIT).collect();
    if trimmed.chars().count() > BODY_PREVIEW_LIMIT {
        out.push_str("...");
    }
    out
}

pub(crate) fn client(timeout_ms: u64) -> anyhow::Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(std::time::Duration::from_millis(timeout_ms))
        .build()?)
}

pub(crate) fn from_reqwest(provider: &str, timeout_ms: u64, err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::timeout(provider, timeout_ms)
    } else {
        ProviderError::request(provider, err.to_string())
    }
}

/// Reads the body, mapping 429 to `RateLimit` and any other non-2xx status
/// to `Request` with an `HTTP {status}` message.
pub(crate) async fn read_success_body(
    provider: &str,
    timeout_ms: u64,
    resp: reqwest::Response,
) -> Result<String, ProviderError> {
    let status = resp.status();
    let retry_after_ms = resp
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(|secs| secs * 1000);
    let body = resp
        .text()
        .await
        .map_err(|e| from_reqwest(provider, timeout_ms, e))?;

    if status.as_u16() == 429 {
        return Err(ProviderError::RateLimit {
            provider: provider.to_string(),
            message: preview_body(&body),
            retry_after_ms,
        });
    }
    if !status.is_success() {
        return Err(ProviderError::request(
            provider,
            format!("HTTP {}: {}", status.as_u16(), preview_body(&body)),
        ));
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_truncates_long_bodies() {
        assert_eq!(preview_body("  "), "<empty body>");
        let long = "x".repeat(BODY_PREVIEW_LIMIT + 5);
        let p = preview_body(&long);
        assert!(p.ends_with("..."));
        assert_eq!(p.chars().count(), BODY_PREVIEW_LIMIT + 3);
    }
}
