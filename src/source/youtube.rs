//! YouTube metadata and caption clients.

use super::{CaptionFragment, MetadataService, TranscriptService, VideoMetadata};
use crate::error::{Result, SentinelError};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

/// Client for the `videos` endpoint of the YouTube Data API.
pub struct YoutubeDataApi {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl YoutubeDataApi {
    pub fn new(http: reqwest::Client, endpoint: &str, api_key: &str) -> Self {
        Self {
            http,
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    title: String,
    #[serde(default)]
    description: String,
}

#[async_trait]
impl MetadataService for YoutubeDataApi {
    #[instrument(skip(self))]
    async fn video_metadata(&self, video_id: &str) -> Result<VideoMetadata> {
        let url = Url::parse_with_params(
            &self.endpoint,
            &[
                ("key", self.api_key.as_str()),
                ("id", video_id),
                ("part", "snippet"),
            ],
        )?;

        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SentinelError::Fetch(format!(
                "Metadata request for {} failed with status {}: {}",
                video_id,
                status,
                body.trim()
            )));
        }

        let listing: VideoListResponse = response.json().await.map_err(|e| {
            SentinelError::Fetch(format!("Malformed metadata response for {}: {}", video_id, e))
        })?;

        let item = listing
            .items
            .into_iter()
            .next()
            .ok_or_else(|| SentinelError::VideoNotFound(video_id.to_string()))?;

        Ok(VideoMetadata {
            title: item.snippet.title,
            description: item.snippet.description,
        })
    }
}

/// Client for YouTube's timed-text caption endpoint (JSON3 format).
pub struct TimedTextTranscripts {
    http: reqwest::Client,
    endpoint: String,
}

impl TimedTextTranscripts {
    pub fn new(http: reqwest::Client, endpoint: &str) -> Self {
        Self {
            http,
            endpoint: endpoint.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CaptionDocument {
    #[serde(default)]
    events: Vec<CaptionEvent>,
}

#[derive(Debug, Deserialize)]
struct CaptionEvent {
    #[serde(rename = "tStartMs")]
    start_ms: Option<u64>,
    #[serde(default)]
    segs: Vec<CaptionSegment>,
}

#[derive(Debug, Deserialize)]
struct CaptionSegment {
    #[serde(default)]
    utf8: String,
}

/// Flatten a JSON3 caption document into fragments, dropping blank ones.
fn parse_caption_document(body: &str) -> Result<Vec<CaptionFragment>> {
    let document: CaptionDocument = serde_json::from_str(body)?;

    Ok(document
        .events
        .into_iter()
        .filter_map(|event| {
            let text: String = event.segs.iter().map(|s| s.utf8.as_str()).collect();
            let text = text.replace('\n', " ").trim().to_string();
            (!text.is_empty()).then_some(CaptionFragment {
                text,
                start_ms: event.start_ms,
            })
        })
        .collect())
}

impl TimedTextTranscripts {
    /// Fetch one caption track. `kind` selects auto-generated (`asr`) captions.
    async fn fetch_track(
        &self,
        video_id: &str,
        language: &str,
        kind: Option<&str>,
    ) -> Result<Vec<CaptionFragment>> {
        let mut params = vec![("v", video_id), ("lang", language), ("fmt", "json3")];
        if let Some(kind) = kind {
            params.push(("kind", kind));
        }
        let url = Url::parse_with_params(&self.endpoint, &params)?;

        let response = self.http.get(url).send().await?.error_for_status()?;
        let body = response.text().await?;

        if body.trim().is_empty() {
            return Err(SentinelError::TranscriptUnavailable(format!(
                "No {} captions for {}",
                language, video_id
            )));
        }

        let fragments = parse_caption_document(&body)?;
        if fragments.is_empty() {
            return Err(SentinelError::TranscriptUnavailable(format!(
                "Empty {} captions for {}",
                language, video_id
            )));
        }

        Ok(fragments)
    }
}

#[async_trait]
impl TranscriptService for TimedTextTranscripts {
    /// Manual captions first, then the auto-generated track.
    #[instrument(skip(self))]
    async fn transcript(&self, video_id: &str, language: &str) -> Result<Vec<CaptionFragment>> {
        let fragments = match self.fetch_track(video_id, language, None).await {
            Err(SentinelError::TranscriptUnavailable(reason)) => {
                debug!("{}, trying auto-generated captions", reason);
                self.fetch_track(video_id, language, Some("asr")).await?
            }
            other => other?,
        };

        debug!("Fetched {} caption fragments", fragments.len());
        Ok(fragments)
    }
}
