use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::core::model::file_registry::IngestChunk;
use crate::core::plugin::{IngestPlugin, PluginKind};
use crate::err;
use crate::error::KbError;
use crate::map_err;

const TIMEDTEXT_LIST_URL: &str = "https://www.youtube.com/api/timedtext";
const DEFAULT_CHUNK_DURATION: f64 = 60.0;

#[derive(Debug, Deserialize)]
struct YoutubeParams {
    video_url: Option<String>,
    #[serde(default)]
    video_urls: Vec<String>,
    language: Option<String>,
    #[serde(default = "default_chunk_duration")]
    chunk_duration: f64,
    /// Outbound HTTP proxy used for the timedtext fetches.
    proxy_url: Option<String>,
}

fn default_chunk_duration() -> f64 {
    DEFAULT_CHUNK_DURATION
}

/// Fetches YouTube video captions (preferring the requested language, then
/// English, then any available track), groups consecutive captions into
/// `chunk_duration`-second chunks (§4.4). Videos without captions are
/// skipped silently; a request producing zero chunks overall fails.
///
/// `kind = RemoteIngest` since its primary input is a URL, not an upload,
/// but it still declares `txt` as a supported file type: a caller may
/// upload a `.txt` file with one YouTube URL per line instead of passing
/// `video_url`/`video_urls`, exactly as the original's
/// `youtube_transcript_ingest.py` does (`supported_file_types = {"txt"}`).
/// That makes it reachable through the file-ingest entry point as well as
/// `IngestBase`.
pub struct YoutubeTranscriptIngest;

#[async_trait]
impl IngestPlugin for YoutubeTranscriptIngest {
    fn name(&self) -> &'static str {
        "youtube_transcript_ingest"
    }

    fn kind(&self) -> PluginKind {
        PluginKind::RemoteIngest
    }

    fn description(&self) -> &'static str {
        "Fetches YouTube video captions and groups them into fixed-duration chunks."
    }

    fn supported_file_types(&self) -> &'static [&'static str] {
        &["txt"]
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "video_url": { "type": "string" },
                "video_urls": { "type": "array", "items": { "type": "string" } },
                "language": { "type": "string" },
                "chunk_duration": { "type": "number", "default": 60 },
                "proxy_url": { "type": "string" }
            },
            "required": []
        })
    }

    async fn ingest(
        &self,
        file_path: Option<&str>,
        params: &Value,
    ) -> Result<Vec<IngestChunk>, KbError> {
        let params: YoutubeParams = map_err!(serde_json::from_value(params.clone()));

        let mut urls = params.video_urls.clone();
        if let Some(url) = &params.video_url {
            urls.push(url.clone());
        }
        if urls.is_empty() {
            if let Some(path) = file_path {
                urls.extend(extract_urls_from_file(path).await?);
            }
        }
        if urls.is_empty() {
            return err!(
                BadInput,
                "youtube_transcript_ingest requires video_url, video_urls, or an uploaded text file containing one YouTube URL per line"
            );
        }

        let mut client = reqwest::Client::builder();
        if let Some(proxy) = &params.proxy_url {
            client = client.proxy(map_err!(reqwest::Proxy::all(proxy)));
        }
        let client = map_err!(client.build());

        let mut chunks = vec![];

        for url in &urls {
            let Some(video_id) = extract_video_id(url) else {
                warn!("could not extract video id from '{url}'");
                continue;
            };

            match ingest_video(&client, &video_id, url, params.language.as_deref(), params.chunk_duration).await {
                Ok(video_chunks) if video_chunks.is_empty() => {
                    info!("video '{video_id}' has no captions, skipping");
                }
                Ok(mut video_chunks) => chunks.append(&mut video_chunks),
                Err(e) => warn!("failed fetching captions for '{video_id}': {e}"),
            }
        }

        if chunks.is_empty() {
            return err!(BadInput, "no captions found for any of the {} requested video(s)", urls.len());
        }

        Ok(chunks)
    }
}

/// Reads a `.txt` upload for one YouTube URL per line, per §4.4's alternate
/// input for this plugin. Lines that don't look like a YouTube URL are
/// skipped, matching the original's `_extract_urls_from_file`; an unreadable
/// file yields no URLs rather than failing the job outright, since the
/// empty-URL check right after this call produces the user-facing error.
async fn extract_urls_from_file(path: &str) -> Result<Vec<String>, KbError> {
    let contents = match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) => {
            warn!("failed reading '{path}' for youtube url list: {e}");
            return Ok(vec![]);
        }
    };

    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && (line.contains("youtu.be/") || line.contains("youtube.com")))
        .map(String::from)
        .collect())
}

async fn ingest_video(
    client: &reqwest::Client,
    video_id: &str,
    source_url: &str,
    requested_language: Option<&str>,
    chunk_duration: f64,
) -> Result<Vec<IngestChunk>, KbError> {
    let available = list_caption_languages(client, video_id).await?;
    if available.is_empty() {
        return Ok(vec![]);
    }

    let language = requested_language
        .filter(|l| available.iter().any(|a| a == l))
        .map(String::from)
        .or_else(|| available.iter().find(|a| a.as_str() == "en").cloned())
        .unwrap_or_else(|| available[0].clone());

    let captions = fetch_captions(client, video_id, &language).await?;
    if captions.is_empty() {
        return Ok(vec![]);
    }

    let groups = group_by_duration(&captions, chunk_duration);
    let chunk_count = groups.len();

    Ok(groups
        .into_iter()
        .enumerate()
        .map(|(i, group)| {
            let text = group
                .iter()
                .map(|c| c.text.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            let start_time = group.first().map(|c| c.start).unwrap_or(0.0);
            let end_time = group.last().map(|c| c.start + c.dur).unwrap_or(start_time);

            let mut metadata = serde_json::Map::new();
            metadata.insert("video_id".to_string(), json!(video_id));
            metadata.insert("language".to_string(), json!(language));
            metadata.insert("start_time".to_string(), json!(start_time));
            metadata.insert("end_time".to_string(), json!(end_time));
            metadata.insert("start_timestamp".to_string(), json!(format_timestamp(start_time)));
            metadata.insert("end_timestamp".to_string(), json!(format_timestamp(end_time)));
            metadata.insert("source_url".to_string(), json!(source_url));
            metadata.insert("chunk_index".to_string(), json!(i));
            metadata.insert("chunk_count".to_string(), json!(chunk_count));

            IngestChunk { text, metadata }
        })
        .collect())
}

struct Caption {
    start: f64,
    dur: f64,
    text: String,
}

fn group_by_duration(captions: &[Caption], chunk_duration: f64) -> Vec<Vec<&Caption>> {
    let mut groups = vec![];
    let mut current: Vec<&Caption> = vec![];
    let mut group_start = 0.0;

    for caption in captions {
        if current.is_empty() {
            group_start = caption.start;
        }
        current.push(caption);

        let elapsed = caption.start + caption.dur - group_start;
        if elapsed >= chunk_duration {
            groups.push(std::mem::take(&mut current));
        }
    }

    if !current.is_empty() {
        groups.push(current);
    }

    groups
}

fn format_timestamp(seconds: f64) -> String {
    let total = seconds.round() as u64;
    let h = total / 3600;
    let m = (total % 3600) / 60;
    let s = total % 60;
    if h > 0 {
        format!("{h:02}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

fn extract_video_id(url: &str) -> Option<String> {
    static V_PARAM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[?&]v=([a-zA-Z0-9_-]{6,})").unwrap());
    static SHORT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"youtu\.be/([a-zA-Z0-9_-]{6,})").unwrap());

    if let Some(caps) = V_PARAM.captures(url) {
        return Some(caps[1].to_string());
    }
    if let Some(caps) = SHORT.captures(url) {
        return Some(caps[1].to_string());
    }
    None
}

async fn list_caption_languages(client: &reqwest::Client, video_id: &str) -> Result<Vec<String>, KbError> {
    static LANG_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"lang_code="([^"]+)""#).unwrap());

    let response = map_err!(client
        .get(TIMEDTEXT_LIST_URL)
        .query(&[("type", "list"), ("v", video_id)])
        .send()
        .await);

    if !response.status().is_success() {
        return Ok(vec![]);
    }

    let body = map_err!(response.text().await);
    Ok(LANG_CODE
        .captures_iter(&body)
        .map(|c| c[1].to_string())
        .collect())
}

async fn fetch_captions(client: &reqwest::Client, video_id: &str, language: &str) -> Result<Vec<Caption>, KbError> {
    static TEXT_TAG: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r#"<text start="([0-9.]+)" dur="([0-9.]+)"[^>]*>(.*?)</text>"#).unwrap()
    });

    let response = map_err!(client
        .get(TIMEDTEXT_LIST_URL)
        .query(&[("lang", language), ("v", video_id)])
        .send()
        .await);

    if !response.status().is_success() {
        return Ok(vec![]);
    }

    let body = map_err!(response.text().await);

    Ok(TEXT_TAG
        .captures_iter(&body)
        .filter_map(|c| {
            let start: f64 = c[1].parse().ok()?;
            let dur: f64 = c[2].parse().ok()?;
            Some(Caption {
                start,
                dur,
                text: decode_entities(&c[3]),
            })
        })
        .collect())
}

fn decode_entities(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_video_id_from_watch_url() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn extracts_video_id_from_short_url() {
        assert_eq!(
            extract_video_id("https://youtu.be/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn groups_captions_by_duration() {
        let captions = vec![
            Caption { start: 0.0, dur: 10.0, text: "a".into() },
            Caption { start: 10.0, dur: 10.0, text: "b".into() },
            Caption { start: 20.0, dur: 10.0, text: "c".into() },
            Caption { start: 30.0, dur: 10.0, text: "d".into() },
        ];
        let groups = group_by_duration(&captions, 30.0);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].len(), 3);
        assert_eq!(groups[1].len(), 1);
    }

    #[test]
    fn decodes_common_entities() {
        assert_eq!(decode_entities("Tom &amp; Jerry&#39;s"), "Tom & Jerry's");
    }

    #[tokio::test]
    async fn extracts_urls_from_uploaded_text_file() {
        let dir = std::env::temp_dir().join(format!("youtube_ingest_test_{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("urls.txt");
        tokio::fs::write(
            &path,
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ\n\nnot a url\nhttps://youtu.be/abc123defgh\n",
        )
        .await
        .unwrap();

        let urls = extract_urls_from_file(path.to_str().unwrap()).await.unwrap();
        assert_eq!(
            urls,
            vec![
                "https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string(),
                "https://youtu.be/abc123defgh".to_string(),
            ]
        );

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn missing_file_yields_no_urls_rather_than_erroring() {
        let urls = extract_urls_from_file("/nonexistent/path/urls.txt").await.unwrap();
        assert!(urls.is_empty());
    }
}
