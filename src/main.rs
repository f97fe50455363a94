#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::cargo)]
#![warn(clippy::perf)]
#![warn(clippy::complexity)]
#![warn(clippy::style)]
#![allow(clippy::multiple_crate_versions)]

use std::path::PathBuf;

use anyhow::{Context, Result, bail, ensure};
use clap::Parser;
use tracing::{info, warn};

use browser::PageDriver;
use channels::list_channels;
use playlist::render_playlist;
use portal::{PORTAL_DOMAIN, resolve_domain};
use stream::{ResolvedStream, resolve_stream};

pub mod browser;
pub mod channels;
pub mod playlist;
pub mod portal;
pub mod stream;

/// Default User-Agent, used for scraping and advertised in the playlist
/// header.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/140.0.0.0 Safari/537.36";

/// Discovers the current SelcukSports mirror, scrapes its channels and writes an M3U8 playlist
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Portal address used to discover the active mirror domain
    #[arg(long, default_value = PORTAL_DOMAIN)]
    portal: String,

    /// Path of the playlist file to write
    #[arg(short, long, default_value = "selcuksports_kanallar.m3u8")]
    out: PathBuf,

    /// User-Agent used for scraping and written into the playlist header
    #[arg(long, default_value = USER_AGENT)]
    user_agent: String,

    /// Run the browser with a visible window instead of headless
    #[arg(long, default_value_t = false)]
    headful: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let driver = PageDriver::launch(&args.user_agent, args.headful).await?;
    let outcome = run(&driver, &args).await;
    if let Err(e) = driver.close().await {
        warn!("Browser did not shut down cleanly: {e:#}");
    }

    outcome
}

async fn run(driver: &PageDriver, args: &Args) -> Result<()> {
    let Some(domain) = resolve_domain(driver, &args.portal).await else {
        bail!(
            "could not discover the active mirror domain through {}",
            args.portal
        );
    };
    info!("Active mirror domain: {domain}");

    let channels = list_channels(driver, &domain).await;
    ensure!(!channels.is_empty(), "no channel links found on {domain}");

    let total = channels.len();
    let mut resolved = Vec::with_capacity(total);
    for (index, channel) in channels.into_iter().enumerate() {
        info!(
            "[{}/{total}] Resolving {} ({})",
            index + 1,
            channel.name,
            channel.group
        );
        let manifest_url = resolve_stream(driver, &channel.player_url).await;
        if manifest_url.is_none() {
            warn!("No stream found for {}", channel.name);
        }
        resolved.push(ResolvedStream {
            channel,
            manifest_url,
        });
    }

    let succeeded = resolved.iter().filter(|r| r.manifest_url.is_some()).count();
    info!("Resolved {succeeded} streams, {} failed", total - succeeded);

    let Some(contents) = render_playlist(&args.user_agent, &resolved) else {
        bail!("no channel produced a playable stream; playlist not written");
    };
    tokio::fs::write(&args.out, contents)
        .await
        .with_context(|| format!("Writing playlist to {}", args.out.display()))?;
    info!("Saved {succeeded} channels to {}", args.out.display());

    Ok(())
}
