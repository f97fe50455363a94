use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::browser::PageDriver;

/// Stable discovery address. The mirror domain it points at changes
/// frequently; this one does not.
pub const PORTAL_DOMAIN: &str = "https://www.selcuksportshd.is/";

/// Anchor on the portal page that carries the current mirror address.
const ENTRY_LINK_SELECTOR: &str = r#"a.site-button:has(img[alt="Site Giriş"])"#;

const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(20);
const ENTRY_LINK_TIMEOUT: Duration = Duration::from_secs(10);

/// Discovers the currently active mirror domain through the portal page.
///
/// Every failure mode here (timeout, missing anchor, missing `href`) is
/// logged and mapped to `None`; the caller decides whether that ends the
/// run.
pub async fn resolve_domain(driver: &PageDriver, portal_url: &str) -> Option<String> {
    info!("Discovering the active mirror domain through {portal_url}");
    match try_resolve(driver, portal_url).await {
        Ok(domain) => Some(domain),
        Err(e) => {
            warn!("Mirror domain discovery failed: {e:#}");
            None
        }
    }
}

async fn try_resolve(driver: &PageDriver, portal_url: &str) -> Result<String> {
    driver.navigate(portal_url, NAVIGATION_TIMEOUT).await?;
    let anchor = driver
        .wait_for_element(ENTRY_LINK_SELECTOR, ENTRY_LINK_TIMEOUT)
        .await?;
    let href = anchor
        .attribute("href")
        .await?
        .context("entry link has no href attribute")?;
    Ok(normalize_domain(&href))
}

/// Drops a single trailing slash so paths can be appended directly.
fn normalize_domain(href: &str) -> String {
    href.strip_suffix('/').unwrap_or(href).to_owned()
}
