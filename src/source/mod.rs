//! Content sources: YouTube videos and raw chart images.
//!
//! Upstream services sit behind small traits so the fetch logic can be
//! exercised without the network.

mod http;
mod youtube;

pub use http::HttpFetcher;
pub use youtube::{TimedTextTranscripts, YoutubeDataApi};

use crate::error::Result;
use async_trait::async_trait;
use regex::Regex;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, instrument};

/// Media type assumed for downloaded chart images.
pub const CHART_MEDIA_TYPE: &str = "image/jpeg";

/// Title and description of a video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoMetadata {
    pub title: String,
    pub description: String,
}

/// One caption fragment of a transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionFragment {
    pub text: String,
    pub start_ms: Option<u64>,
}

/// A video ready to be summarised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoReference {
    pub id: String,
    pub title: String,
    /// Transcript text when captions exist, otherwise the description.
    pub body: String,
    pub from_transcript: bool,
}

/// A chart image ready to be analysed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartRequest {
    pub url: String,
    pub data: Vec<u8>,
    pub media_type: String,
}

/// Video metadata lookup by id.
#[async_trait]
pub trait MetadataService: Send + Sync {
    async fn video_metadata(&self, video_id: &str) -> Result<VideoMetadata>;
}

/// Caption lookup by id and language.
#[async_trait]
pub trait TranscriptService: Send + Sync {
    async fn transcript(&self, video_id: &str, language: &str) -> Result<Vec<CaptionFragment>>;
}

/// Plain GET of arbitrary URLs.
#[async_trait]
pub trait RawFetcher: Send + Sync {
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>>;
}

fn video_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:v=|/)([0-9A-Za-z_-]{11})").expect("Invalid regex"))
}

/// Extract an 11-character video id following `v=` or `/`.
///
/// Returns None when the input has no such id; callers treat that as "not a video".
pub fn extract_video_id(input: &str) -> Option<String> {
    video_id_regex()
        .captures(input)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Retrieves video text and chart bytes through the upstream services.
#[derive(Clone)]
pub struct ContentFetcher {
    metadata: Arc<dyn MetadataService>,
    transcripts: Arc<dyn TranscriptService>,
    raw: Arc<dyn RawFetcher>,
    language: String,
}

impl ContentFetcher {
    pub fn new(
        metadata: Arc<dyn MetadataService>,
        transcripts: Arc<dyn TranscriptService>,
        raw: Arc<dyn RawFetcher>,
        language: &str,
    ) -> Self {
        Self {
            metadata,
            transcripts,
            raw,
            language: language.to_string(),
        }
    }

    /// Fetch title and body text for a video.
    ///
    /// Only a metadata failure is an error. Any transcript problem falls back
    /// to the description, and an empty description falls back to the title.
    #[instrument(skip(self))]
    pub async fn fetch_video(&self, video_id: &str) -> Result<VideoReference> {
        let metadata = self.metadata.video_metadata(video_id).await?;
        info!("Fetched metadata: {}", metadata.title);

        let (body, from_transcript) = match self.transcript_text(video_id).await {
            Some(text) => (text, true),
            None if !metadata.description.trim().is_empty() => (metadata.description, false),
            None => (metadata.title.clone(), false),
        };

        Ok(VideoReference {
            id: video_id.to_string(),
            title: metadata.title,
            body,
            from_transcript,
        })
    }

    /// Transcript joined into one string, or None if it cannot be used.
    async fn transcript_text(&self, video_id: &str) -> Option<String> {
        match self.transcripts.transcript(video_id, &self.language).await {
            Ok(fragments) => {
                let text = fragments
                    .iter()
                    .map(|f| f.text.trim())
                    .filter(|t| !t.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ");
                if text.is_empty() {
                    debug!("Transcript for {} is empty, using description", video_id);
                    None
                } else {
                    Some(text)
                }
            }
            Err(e) => {
                debug!("Transcript for {} unavailable ({}), using description", video_id, e);
                None
            }
        }
    }

    /// Download a chart image.
    #[instrument(skip(self))]
    pub async fn fetch_chart(&self, url: &str) -> Result<ChartRequest> {
        let data = self.raw.fetch_bytes(url).await?;
        info!("Downloaded {} bytes", data.len());

        Ok(ChartRequest {
            url: url.to_string(),
            data,
            media_type: CHART_MEDIA_TYPE.to_string(),
        })
    }
}
