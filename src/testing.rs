//! In-memory fakes shared by the unit tests.

use crate::error::{Result, SentinelError};
use crate::session::{ChatBackend, Completion, Turn, UsageRecord};
use crate::source::{CaptionFragment, MetadataService, RawFetcher, TranscriptService, VideoMetadata};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Chat backend that replays queued outcomes and records every history it receives.
#[derive(Default)]
pub struct ScriptedChat {
    outcomes: Mutex<VecDeque<std::result::Result<Completion, String>>>,
    calls: Mutex<Vec<Vec<Turn>>>,
}

impl ScriptedChat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, text: &str, input_tokens: u64, output_tokens: u64) {
        self.outcomes.lock().unwrap().push_back(Ok(Completion {
            text: text.to_string(),
            usage: UsageRecord {
                input_tokens,
                output_tokens,
            },
        }));
    }

    pub fn fail(&self, message: &str) {
        self.outcomes
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
    }

    pub fn calls(&self) -> Vec<Vec<Turn>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatBackend for ScriptedChat {
    async fn complete(&self, history: &[Turn]) -> Result<Completion> {
        self.calls.lock().unwrap().push(history.to_vec());
        match self.outcomes.lock().unwrap().pop_front() {
            Some(Ok(completion)) => Ok(completion),
            Some(Err(message)) => Err(SentinelError::Chat(message)),
            None => Err(SentinelError::Chat("no scripted reply".to_string())),
        }
    }
}

pub struct StubMetadata(Option<VideoMetadata>);

impl StubMetadata {
    pub fn ok(title: &str, description: &str) -> Self {
        Self(Some(VideoMetadata {
            title: title.to_string(),
            description: description.to_string(),
        }))
    }

    pub fn failing() -> Self {
        Self(None)
    }
}

#[async_trait]
impl MetadataService for StubMetadata {
    async fn video_metadata(&self, video_id: &str) -> Result<VideoMetadata> {
        self.0
            .clone()
            .ok_or_else(|| SentinelError::VideoNotFound(video_id.to_string()))
    }
}

pub struct StubTranscripts(Option<Vec<String>>);

impl StubTranscripts {
    pub fn ok(fragments: &[&str]) -> Self {
        Self(Some(fragments.iter().map(|s| s.to_string()).collect()))
    }

    pub fn failing() -> Self {
        Self(None)
    }
}

#[async_trait]
impl TranscriptService for StubTranscripts {
    async fn transcript(&self, video_id: &str, language: &str) -> Result<Vec<CaptionFragment>> {
        match &self.0 {
            Some(texts) => Ok(texts
                .iter()
                .map(|text| CaptionFragment {
                    text: text.clone(),
                    start_ms: None,
                })
                .collect()),
            None => Err(SentinelError::TranscriptUnavailable(format!(
                "{} has no {} captions",
                video_id, language
            ))),
        }
    }
}

pub struct StubRaw(Option<Vec<u8>>);

impl StubRaw {
    pub fn ok(bytes: &[u8]) -> Self {
        Self(Some(bytes.to_vec()))
    }

    pub fn failing() -> Self {
        Self(None)
    }
}

#[async_trait]
impl RawFetcher for StubRaw {
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        self.0
            .clone()
            .ok_or_else(|| SentinelError::Fetch(format!("GET {} returned status 404 Not Found", url)))
    }
}

/// Serve a router on an ephemeral local port and return its base URL.
pub async fn serve_router(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}
