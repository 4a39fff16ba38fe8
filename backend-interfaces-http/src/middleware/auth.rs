use std::io::Read;

use anyhow::Result;
use axum::http::HeaderMap;
use flate2::read::GzDecoder;

use backend_domain::{IngestEnvelope, RuntimeConfig};

pub fn authorize(config: &RuntimeConfig, headers: &HeaderMap) -> bool {
    token_matches(config.api_token.as_deref(), headers)
}

/// Without a configured token every request is allowed.
pub fn token_matches(expected: Option<&str>, headers: &HeaderMap) -> bool {
    match expected {
        Some(token) => extract_bearer(headers).map(|v| v == token).unwrap_or(false),
        None => true,
    }
}

/// Decodes a push-ingest body. The schema version is checked by the ingest
/// command, not here.
pub fn parse_envelope(headers: &HeaderMap, body: &[u8]) -> Result<IngestEnvelope> {
    let content = maybe_gunzip(headers, body)?;
    Ok(serde_json::from_str(&content)?)
}

fn maybe_gunzip(headers: &HeaderMap, body: &[u8]) -> Result<String> {
    if let Some(encoding) = headers.get("Content-Encoding") {
        if encoding.to_str().unwrap_or("").eq_ignore_ascii_case("gzip") {
            let mut decoder = GzDecoder::new(body);
            let mut out = String::new();
            decoder.read_to_string(&mut out)?;
            return Ok(out);
        }
    }
    Ok(String::from_utf8(body.to_vec())?)
}

fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get("Authorization")?.to_str().ok()?.trim();
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    const BODY: &str = r#"{"schema_version":"v1","events":[{"event_id":"usgs_us7000abcd","timestamp":"2024-05-03T10:00:00Z","latitude":38.41,"longitude":27.14,"magnitude":3.2,"depth_km":7.0,"location":"Aegean Sea","source":"USGS"}]}"#;

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            "Authorization",
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        headers
    }

    #[test]
    fn open_when_no_token_is_configured() {
        assert!(token_matches(None, &HeaderMap::new()));
    }

    #[test]
    fn requires_matching_bearer_token() {
        assert!(token_matches(Some("secret"), &bearer("secret")));
        assert!(!token_matches(Some("secret"), &bearer("other")));
        assert!(!token_matches(Some("secret"), &HeaderMap::new()));

        let mut basic = HeaderMap::new();
        basic.insert("Authorization", HeaderValue::from_static("Basic secret"));
        assert!(!token_matches(Some("secret"), &basic));
    }

    #[test]
    fn parses_plain_body() {
        let envelope = parse_envelope(&HeaderMap::new(), BODY.as_bytes()).unwrap();
        assert_eq!(envelope.schema_version, "v1");
        assert_eq!(envelope.events.len(), 1);
        assert_eq!(envelope.events[0].event_id, "usgs_us7000abcd");
    }

    #[test]
    fn parses_gzip_body() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(BODY.as_bytes()).unwrap();
        let compressed = encoder.finish().unwrap();

        let mut headers = HeaderMap::new();
        headers.insert("Content-Encoding", HeaderValue::from_static("gzip"));
        let envelope = parse_envelope(&headers, &compressed).unwrap();
        assert_eq!(envelope.events[0].magnitude, 3.2);
    }

    #[test]
    fn rejects_malformed_body() {
        assert!(parse_envelope(&HeaderMap::new(), b"{not json").is_err());
    }
}
