use crate::stream::ResolvedStream;

/// Renders the playlist text, or `None` when no channel resolved — a run
/// with nothing playable produces no file at all.
///
/// Channels that failed to resolve are dropped; the rest keep their
/// source order. Every channel comes off the same mirror, so the global
/// header takes its referer and origin from the first resolved channel.
pub fn render_playlist(user_agent: &str, streams: &[ResolvedStream]) -> Option<String> {
    let resolved: Vec<_> = streams
        .iter()
        .filter_map(|s| s.manifest_url.as_deref().map(|m| (&s.channel, m)))
        .collect();
    let (first, _) = resolved.first()?;

    let origin = first.origin.as_str();
    let mut lines = vec![
        "#EXTM3U".to_owned(),
        format!("#EXT-X-USER-AGENT:{user_agent}"),
        format!("#EXT-X-REFERER:{origin}/"),
        format!("#EXT-X-ORIGIN:{origin}"),
    ];

    for (channel, manifest_url) in resolved {
        lines.push(format!(
            "#EXTINF:-1 tvg-name=\"{}\" group-title=\"{}\",{}",
            channel.name, channel.group, channel.name
        ));
        lines.push(manifest_url.to_owned());
    }

    let mut out = lines.join("\n");
    out.push('\n');
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::Channel;

    fn resolved(name: &str, group: &str, manifest: Option<&str>) -> ResolvedStream {
        ResolvedStream {
            channel: Channel {
                name: name.to_owned(),
                player_url: "https://mirror.example/p?id=1".to_owned(),
                group: group.to_owned(),
                origin: "https://mirror.example".to_owned(),
            },
            manifest_url: manifest.map(str::to_owned),
        }
    }

    #[test]
    fn nothing_resolved_means_no_playlist() {
        assert!(render_playlist("UA", &[]).is_none());
        assert!(render_playlist("UA", &[resolved("beIN Sports 1", "BeinSports", None)]).is_none());
    }

    #[test]
    fn header_carries_user_agent_and_first_channel_origin() {
        let streams = [resolved(
            "beIN Sports 1",
            "BeinSports",
            Some("https://cdn.example/stream/42/playlist.m3u8"),
        )];
        let out = render_playlist("TestAgent/1.0", &streams).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "#EXTM3U");
        assert_eq!(lines[1], "#EXT-X-USER-AGENT:TestAgent/1.0");
        assert_eq!(lines[2], "#EXT-X-REFERER:https://mirror.example/");
        assert_eq!(lines[3], "#EXT-X-ORIGIN:https://mirror.example");
    }

    #[test]
    fn failed_channels_are_dropped_and_source_order_is_kept() {
        let streams = [
            resolved(
                "beIN Sports 1",
                "BeinSports",
                Some("https://cdn.example/stream/1/playlist.m3u8"),
            ),
            resolved("Broken Channel", "Maç Yayınları", None),
            resolved(
                "TRT Spor",
                "Ulusal Kanallar",
                Some("https://cdn.example/stream/2/playlist.m3u8"),
            ),
        ];
        let out = render_playlist("UA", &streams).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 8);
        assert_eq!(
            lines[4],
            "#EXTINF:-1 tvg-name=\"beIN Sports 1\" group-title=\"BeinSports\",beIN Sports 1"
        );
        assert_eq!(lines[5], "https://cdn.example/stream/1/playlist.m3u8");
        assert_eq!(
            lines[6],
            "#EXTINF:-1 tvg-name=\"TRT Spor\" group-title=\"Ulusal Kanallar\",TRT Spor"
        );
        assert_eq!(lines[7], "https://cdn.example/stream/2/playlist.m3u8");
        assert!(!out.contains("Broken Channel"));
    }

    #[test]
    fn rendering_ends_with_a_newline() {
        let streams = [resolved(
            "beIN Sports 1",
            "BeinSports",
            Some("https://cdn.example/stream/1/playlist.m3u8"),
        )];
        assert!(render_playlist("UA", &streams).unwrap().ends_with('\n'));
    }
}
