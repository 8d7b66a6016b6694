//! RSS 2.0 podcast feed with iTunes extensions.
//!
//! The feed is written with `quick-xml`'s event writer. Items are emitted
//! in the order given, which callers keep newest first.

use crate::config::PodcastConfig;
use crate::models::EpisodeRecord;
use chrono::{DateTime, Utc};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::error::Error;
use std::io::Write;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};
use url::Url;

const ITUNES_NS: &str = "http://www.itunes.com/dtds/podcast-1.0.dtd";

/// Public URL of `file_name` under `base_url`.
///
/// The file name is percent-encoded and `base_url` is treated as a
/// directory even without a trailing slash.
pub fn enclosure_url(base_url: &str, file_name: &str) -> Result<String, url::ParseError> {
    let mut base = base_url.to_string();
    if !base.ends_with('/') {
        base.push('/');
    }
    let url = Url::parse(&base)?.join(&urlencoding::encode(file_name))?;
    Ok(url.to_string())
}

/// Build the episode record for a finished audio file.
pub async fn episode_for(
    config: &PodcastConfig,
    title: &str,
    link: &str,
    audio_path: &Path,
    pub_date: DateTime<Utc>,
) -> Result<EpisodeRecord, Box<dyn Error>> {
    let audio_file = audio_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or("audio path has no usable file name")?
        .to_string();
    let length_bytes = fs::metadata(audio_path).await?.len();
    let audio_url = enclosure_url(&config.base_url, &audio_file)?;

    Ok(EpisodeRecord {
        title: title.to_string(),
        description: format!("Audio version of: {title}"),
        link: link.to_string(),
        audio_file,
        guid: audio_url.clone(),
        audio_url,
        length_bytes,
        pub_date,
    })
}

fn text_element<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> Result<(), Box<dyn Error>> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Render the feed document.
pub fn render_feed(
    config: &PodcastConfig,
    episodes: &[EpisodeRecord],
    build_date: DateTime<Utc>,
) -> Result<String, Box<dyn Error>> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(
        BytesStart::new("rss").with_attributes([("version", "2.0"), ("xmlns:itunes", ITUNES_NS)]),
    ))?;
    writer.write_event(Event::Start(BytesStart::new("channel")))?;

    text_element(&mut writer, "title", &config.title)?;
    text_element(&mut writer, "link", &config.website_url)?;
    text_element(&mut writer, "description", &config.description)?;
    text_element(&mut writer, "language", &config.language)?;
    text_element(&mut writer, "lastBuildDate", &build_date.to_rfc2822())?;
    text_element(&mut writer, "itunes:author", &config.author)?;
    text_element(&mut writer, "itunes:summary", &config.description)?;
    text_element(
        &mut writer,
        "itunes:explicit",
        if config.explicit { "true" } else { "false" },
    )?;
    if let Some(image) = &config.image_url {
        writer.write_event(Event::Empty(
            BytesStart::new("itunes:image").with_attributes([("href", image.as_str())]),
        ))?;
    }

    for episode in episodes {
        writer.write_event(Event::Start(BytesStart::new("item")))?;
        text_element(&mut writer, "title", &episode.title)?;
        text_element(&mut writer, "link", &episode.link)?;
        text_element(&mut writer, "description", &episode.description)?;
        text_element(&mut writer, "pubDate", &episode.pub_date.to_rfc2822())?;
        text_element(&mut writer, "guid", &episode.guid)?;
        let length = episode.length_bytes.to_string();
        writer.write_event(Event::Empty(BytesStart::new("enclosure").with_attributes([
            ("url", episode.audio_url.as_str()),
            ("length", length.as_str()),
            ("type", "audio/mpeg"),
        ])))?;
        writer.write_event(Event::End(BytesEnd::new("item")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("channel")))?;
    writer.write_event(Event::End(BytesEnd::new("rss")))?;
    Ok(String::from_utf8(writer.into_inner())?)
}

/// Render and write the feed to `path`.
#[instrument(level = "info", skip(config, episodes), fields(path = %path.display(), episodes = episodes.len()))]
pub async fn write_feed(
    config: &PodcastConfig,
    episodes: &[EpisodeRecord],
    path: &Path,
) -> Result<(), Box<dyn Error>> {
    let xml = render_feed(config, episodes, Utc::now())?;
    fs::write(path, xml).await?;
    info!("Wrote podcast feed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outputs::json::tests::episode;
    use chrono::TimeZone;

    fn config() -> PodcastConfig {
        PodcastConfig {
            title: "Essays & Notes".to_string(),
            image_url: Some("https://pg.example/cover.png".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_enclosure_url_encodes_file_name() {
        assert_eq!(
            enclosure_url("https://pg.example/pod", "how to.mp3").unwrap(),
            "https://pg.example/pod/how%20to.mp3"
        );
        assert_eq!(
            enclosure_url("https://pg.example/pod/", "greatwork.mp3").unwrap(),
            "https://pg.example/pod/greatwork.mp3"
        );
        assert!(enclosure_url("not a url", "x.mp3").is_err());
    }

    #[test]
    fn test_render_feed_structure() {
        let build = Utc.with_ymd_and_hms(2024, 5, 7, 8, 0, 0).unwrap();
        let xml = render_feed(&config(), &[episode("greatwork", 6)], build).unwrap();

        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(r#"<rss version="2.0" xmlns:itunes="http://www.itunes.com/dtds/podcast-1.0.dtd">"#));
        assert!(xml.contains("<title>Essays &amp; Notes</title>"));
        assert!(xml.contains(&format!("<lastBuildDate>{}</lastBuildDate>", build.to_rfc2822())));
        assert!(xml.contains("<itunes:explicit>false</itunes:explicit>"));
        assert!(xml.contains(r#"<itunes:image href="https://pg.example/cover.png"/>"#));
        let published = Utc.with_ymd_and_hms(2024, 5, 6, 12, 0, 0).unwrap();
        assert!(xml.contains(&format!("<pubDate>{}</pubDate>", published.to_rfc2822())));
        assert!(xml.contains(
            r#"<enclosure url="https://pg.example/pod/greatwork.mp3" length="2048" type="audio/mpeg"/>"#
        ));
        assert!(xml.trim_end().ends_with("</rss>"));
    }

    #[test]
    fn test_render_feed_keeps_item_order() {
        let build = Utc.with_ymd_and_hms(2024, 5, 7, 8, 0, 0).unwrap();
        let xml = render_feed(
            &config(),
            &[episode("greatwork", 6), episode("cities", 2)],
            build,
        )
        .unwrap();
        let newer = xml.find("greatwork.mp3").unwrap();
        let older = xml.find("cities.mp3").unwrap();
        assert!(newer < older);
        assert_eq!(xml.matches("<item>").count(), 2);
    }

    #[tokio::test]
    async fn test_episode_for_reads_file_size() {
        let dir = tempfile::tempdir().unwrap();
        let audio = dir.path().join("how_to_do_great_work.mp3");
        std::fs::write(&audio, vec![0u8; 1234]).unwrap();
        let config = PodcastConfig {
            base_url: "https://pg.example/pod/".to_string(),
            ..Default::default()
        };
        let date = Utc.with_ymd_and_hms(2024, 5, 6, 12, 0, 0).unwrap();

        let record = episode_for(
            &config,
            "How to Do Great Work",
            "https://paulgraham.com/greatwork.html",
            &audio,
            date,
        )
        .await
        .unwrap();

        assert_eq!(record.length_bytes, 1234);
        assert_eq!(record.audio_file, "how_to_do_great_work.mp3");
        assert_eq!(record.audio_url, "https://pg.example/pod/how_to_do_great_work.mp3");
        assert_eq!(record.guid, record.audio_url);
        assert_eq!(record.description, "Audio version of: How to Do Great Work");
    }
}
