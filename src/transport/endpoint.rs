//! Camera endpoint URL derivation.
//!
//! The camera socket lives on the same host as the page that serves the UI:
//!
//! ```text
//! https://robots.example.com/app   →  wss://robots.example.com/api/ws/camera/{target}
//! http://localhost:5173/           →  ws://localhost:5173/api/ws/camera/{target}
//! ```

// ============================================================================
// Imports
// ============================================================================

use url::Url;

use crate::error::{Error, Result};
use crate::identifiers::TargetId;

// ============================================================================
// Constants
// ============================================================================

/// Path segments leading to the camera socket.
const CAMERA_PATH: [&str; 3] = ["api", "ws", "camera"];

// ============================================================================
// Functions
// ============================================================================

/// Builds the camera WebSocket URL for `target` from the page origin.
///
/// Uses `wss` when the origin is served over TLS (`https`/`wss`), else `ws`.
/// Host and port are taken from the origin; path, query and fragment are not.
///
/// # Errors
///
/// Returns [`Error::Config`] if the origin has no host.
pub fn camera_url(origin: &Url, target: &TargetId) -> Result<Url> {
    let Some(host) = origin.host_str() else {
        return Err(Error::config(format!("Page origin has no host: {origin}")));
    };

    let scheme = match origin.scheme() {
        "https" | "wss" => "wss",
        _ => "ws",
    };

    let mut url = match origin.port() {
        Some(port) => Url::parse(&format!("{scheme}://{host}:{port}/"))?,
        None => Url::parse(&format!("{scheme}://{host}/"))?,
    };

    url.path_segments_mut()
        .map_err(|()| Error::config(format!("Origin cannot be a base URL: {origin}")))?
        .clear()
        .extend(CAMERA_PATH)
        .push(target.as_str());

    Ok(url)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn target(value: &str) -> TargetId {
        TargetId::new(value).expect("valid target")
    }

    #[test]
    fn test_secure_origin_uses_wss() {
        let origin = Url::parse("https://robots.example.com/app/view?x=1#top").expect("url");
        let url = camera_url(&origin, &target("RBT-01")).expect("camera url");
        assert_eq!(url.as_str(), "wss://robots.example.com/api/ws/camera/RBT-01");
    }

    #[test]
    fn test_plain_origin_keeps_port() {
        let origin = Url::parse("http://localhost:5173/").expect("url");
        let url = camera_url(&origin, &target("SN123")).expect("camera url");
        assert_eq!(url.as_str(), "ws://localhost:5173/api/ws/camera/SN123");
    }

    #[test]
    fn test_target_is_percent_encoded() {
        let origin = Url::parse("http://10.0.0.2").expect("url");
        let url = camera_url(&origin, &target("a/b c")).expect("camera url");
        assert_eq!(url.as_str(), "ws://10.0.0.2/api/ws/camera/a%2Fb%20c");
    }

    #[test]
    fn test_ipv6_origin() {
        let origin = Url::parse("https://[::1]:8443").expect("url");
        let url = camera_url(&origin, &target("X")).expect("camera url");
        assert_eq!(url.as_str(), "wss://[::1]:8443/api/ws/camera/X");
    }

    #[test]
    fn test_origin_without_host_rejected() {
        let origin = Url::parse("data:text/plain,hello").expect("url");
        let result = camera_url(&origin, &target("X"));
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
