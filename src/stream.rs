use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tracing::{debug, warn};
use url::Url;

use crate::browser::PageDriver;
use crate::channels::Channel;

const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(20);

/// Client-side assignment that leaks the CDN base URL into the rendered
/// player markup.
static BASE_STREAM_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"this\.baseStreamUrl\s*=\s*['"](https?://.*?)['"]"#).unwrap()
});

/// Outcome of stream resolution for a single channel.
#[derive(Debug)]
pub struct ResolvedStream {
    pub channel: Channel,
    /// `None` when the player page did not yield a playable manifest.
    pub manifest_url: Option<String>,
}

/// Derives the playable manifest URL from a channel's player page.
///
/// Navigation and extraction failures are logged and mapped to `None`;
/// a single channel failing never ends the run.
pub async fn resolve_stream(driver: &PageDriver, player_url: &str) -> Option<String> {
    if let Err(e) = driver.navigate(player_url, NAVIGATION_TIMEOUT).await {
        warn!("Could not load player page {player_url}: {e:#}");
        return None;
    }

    let content = match driver.content().await {
        Ok(content) => content,
        Err(e) => {
            warn!("Could not read player page {player_url}: {e:#}");
            return None;
        }
    };

    let manifest = manifest_from_content(&content, player_url);
    if manifest.is_none() {
        debug!("No baseStreamUrl assignment or id parameter for {player_url}");
    }
    manifest
}

/// Builds the manifest address from the rendered player markup and the
/// player URL's `id` query parameter.
///
/// Pure. Returns `None` when either piece is missing, never a partial
/// URL.
pub fn manifest_from_content(content: &str, player_url: &str) -> Option<String> {
    let base_url = BASE_STREAM_URL.captures(content)?.get(1)?.as_str();
    let stream_id = stream_id(player_url)?;
    Some(format!("{base_url}{stream_id}/playlist.m3u8"))
}

fn stream_id(player_url: &str) -> Option<String> {
    let url = Url::parse(player_url).ok()?;
    url.query_pairs()
        .find(|(key, value)| key == "id" && !value.is_empty())
        .map(|(_, value)| value.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_is_base_plus_id_plus_suffix() {
        let content = r#"<script>this.baseStreamUrl = "https://cdn.example/stream/";</script>"#;
        let manifest = manifest_from_content(content, "https://mirror.example/p?id=42");
        assert_eq!(
            manifest.as_deref(),
            Some("https://cdn.example/stream/42/playlist.m3u8")
        );
    }

    #[test]
    fn single_quoted_assignment_matches_too() {
        let content = "this.baseStreamUrl = 'https://cdn.example/live/'";
        let manifest = manifest_from_content(content, "https://mirror.example/p?ch=3&id=7");
        assert_eq!(
            manifest.as_deref(),
            Some("https://cdn.example/live/7/playlist.m3u8")
        );
    }

    #[test]
    fn missing_assignment_yields_none() {
        let content = "<html><body>nothing here</body></html>";
        assert!(manifest_from_content(content, "https://mirror.example/p?id=42").is_none());
    }

    #[test]
    fn missing_id_parameter_yields_none() {
        let content = r#"this.baseStreamUrl = "https://cdn.example/stream/""#;
        assert!(manifest_from_content(content, "https://mirror.example/p?channel=42").is_none());
        assert!(manifest_from_content(content, "https://mirror.example/p").is_none());
    }

    #[test]
    fn empty_id_counts_as_missing() {
        let content = r#"this.baseStreamUrl = "https://cdn.example/stream/""#;
        assert!(manifest_from_content(content, "https://mirror.example/p?id=").is_none());
    }

    #[test]
    fn non_http_assignment_is_ignored() {
        let content = r#"this.baseStreamUrl = "ftp://cdn.example/stream/""#;
        assert!(manifest_from_content(content, "https://mirror.example/p?id=42").is_none());
    }

    #[test]
    fn repeated_extraction_is_deterministic() {
        let content = r#"this.baseStreamUrl = "https://cdn.example/stream/""#;
        let url = "https://mirror.example/p?id=42";
        assert_eq!(
            manifest_from_content(content, url),
            manifest_from_content(content, url)
        );
    }
}
