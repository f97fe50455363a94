use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info, warn};
use url::Url;

use crate::browser::PageDriver;

/// Elements exposing a player page through their `data-url` attribute.
const CHANNEL_LINK_SELECTOR: &str = "a[data-url]";
/// Nested element holding the channel's display name.
const CHANNEL_NAME_SELECTOR: &str = "div.name";

const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(25);

/// Group assigned when no keyword matches.
pub const DEFAULT_GROUP: &str = "Maç Yayınları";

/// Ordered keyword table for group classification. The first group with a
/// keyword occurring in the lowercased channel name wins; matching is a
/// plain substring test, so a keyword can fire inside a longer unrelated
/// name.
const GROUP_KEYWORDS: &[(&str, &[&str])] = &[
    ("BeinSports", &["bein sports", "beın sports"]),
    ("S Sports", &["s sport"]),
    ("Tivibu", &["tivibu spor"]),
    ("Ulusal Kanallar", &["a spor", "trt spor", "trt 1"]),
    ("Diğer Spor", &["smart spor", "nba tv", "eurosport"]),
    (
        "Belgesel",
        &["national geographic", "nat geo", "discovery", "dmax", "bbc earth", "history"],
    ),
    ("Film & Dizi", &["bein series", "bein movies", "movie smart"]),
];

/// A channel as listed on the mirror's home page.
#[derive(Debug, Clone)]
pub struct Channel {
    pub name: String,
    /// Absolute address of the channel's player page.
    pub player_url: String,
    pub group: String,
    /// Scheme + authority of the player page, used for playlist headers.
    pub origin: String,
}

/// A channel anchor as found in the DOM, before validation.
#[derive(Debug, Default)]
struct RawEntry {
    name: Option<String>,
    player_url: Option<String>,
}

/// Collects every channel advertised on the mirror's home page.
///
/// Returns an empty list (never an error) when the page fails to load or
/// exposes no channel anchors; the caller treats that as a terminal
/// condition for the run.
pub async fn list_channels(driver: &PageDriver, base_domain: &str) -> Vec<Channel> {
    info!("Collecting channel links from {base_domain}");
    match collect_entries(driver, base_domain).await {
        Ok(entries) => {
            let channels = build_channels(entries, base_domain);
            info!("Found {} channel links", channels.len());
            channels
        }
        Err(e) => {
            warn!("Could not collect channel links from {base_domain}: {e:#}");
            Vec::new()
        }
    }
}

async fn collect_entries(driver: &PageDriver, base_domain: &str) -> Result<Vec<RawEntry>> {
    driver.navigate(base_domain, NAVIGATION_TIMEOUT).await?;

    let mut entries = Vec::new();
    for anchor in driver.find_all(CHANNEL_LINK_SELECTOR).await? {
        let player_url = anchor.attribute("data-url").await.ok().flatten();
        let name = match anchor.find_element(CHANNEL_NAME_SELECTOR).await {
            Ok(el) => {
                let text = el.inner_text().await.ok().flatten().unwrap_or_default();
                Some(text.trim().to_owned())
            }
            Err(_) => None,
        };
        entries.push(RawEntry { name, player_url });
    }
    Ok(entries)
}

/// Validates raw anchors into channels. Entries missing their name element
/// or `data-url` attribute are dropped silently, as are entries whose
/// player URL does not parse; neither counts as a failure.
fn build_channels(entries: Vec<RawEntry>, base_domain: &str) -> Vec<Channel> {
    let mut channels = Vec::with_capacity(entries.len());
    for entry in entries {
        let (Some(name), Some(player_url)) = (entry.name, entry.player_url) else {
            continue;
        };

        let player_url = if player_url.starts_with('/') {
            format!("{}{player_url}", base_domain.trim_end_matches('/'))
        } else {
            player_url
        };

        let Some(origin) = player_origin(&player_url) else {
            debug!("Skipping {name}: unparsable player URL {player_url}");
            continue;
        };

        let group = channel_group(&name).to_owned();
        channels.push(Channel {
            name,
            player_url,
            group,
            origin,
        });
    }
    channels
}

fn player_origin(player_url: &str) -> Option<String> {
    let url = Url::parse(player_url).ok()?;
    let host = url.host_str()?;
    match url.port() {
        Some(port) => Some(format!("{}://{host}:{port}", url.scheme())),
        None => Some(format!("{}://{host}", url.scheme())),
    }
}

/// Classifies a channel name into a playlist group, first declared match
/// wins.
pub fn channel_group(channel_name: &str) -> &'static str {
    let lowered = channel_name.to_lowercase();
    for (group, keywords) in GROUP_KEYWORDS {
        if keywords.iter().any(|keyword| lowered.contains(keyword)) {
            return group;
        }
    }
    DEFAULT_GROUP
}
