//! Shared download helpers.

use tendero_core::{Error, Result};

/// Maximum length of the body sample attached to content-type errors.
const SAMPLE_LEN: usize = 200;

/// Fetch a URL, returning the body bytes and the declared content type.
///
/// Non-success statuses and transport failures surface as upstream errors;
/// bodies larger than `max_bytes` are rejected without being forwarded.
pub async fn fetch_bytes(
    http: &reqwest::Client,
    url: &str,
    max_bytes: usize,
) -> Result<(Vec<u8>, String)> {
    let response = http
        .get(url)
        .send()
        .await
        .map_err(|e| Error::upstream("fetch", format!("GET {} failed: {}", url, e)))?;

    let status = response.status();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();

    let bytes = response
        .bytes()
        .await
        .map_err(|e| Error::upstream("fetch", format!("reading body of {} failed: {}", url, e)))?;

    if !status.is_success() {
        return Err(Error::upstream(
            "fetch",
            format!("GET {} returned {}: {}", url, status, body_sample(&bytes)),
        ));
    }

    if bytes.len() > max_bytes {
        return Err(Error::PayloadTooLarge {
            size: bytes.len(),
            limit: max_bytes,
        });
    }

    tracing::debug!(url = %url, size = bytes.len(), content_type = %content_type, "Fetched media");

    Ok((bytes.to_vec(), content_type))
}

/// Short lossy-UTF-8 sample of a response body, for diagnostics.
pub fn body_sample(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .chars()
        .take(SAMPLE_LEN)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_sample_truncates() {
        let long = "x".repeat(1000);
        let sample = body_sample(long.as_bytes());
        assert_eq!(sample.len(), 200);
    }

    #[test]
    fn test_body_sample_handles_binary() {
        let sample = body_sample(&[0xff, 0xfe, 0x00, b'a']);
        assert!(sample.ends_with('a'));
    }
}
