//! Analysis orchestration for Sentinel.
//!
//! Routes a URL to the video-summary or chart-analysis flow, sends the prompt
//! through the caller's conversation, and prices the reply.

use crate::config::{Credentials, Prompts, Settings};
use crate::cost::Pricing;
use crate::error::{Result, SentinelError};
use crate::session::{ChatBackend, ConversationSession, InlineImage, OpenAiChat, UsageRecord, UserContent};
use crate::source::{
    extract_video_id, ContentFetcher, HttpFetcher, TimedTextTranscripts, YoutubeDataApi,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Which flow produced an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerKind {
    VideoSummary,
    ChartAnalysis,
    FollowUp,
}

/// A priced model reply.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub kind: AnswerKind,
    pub text: String,
    pub usage: UsageRecord,
    pub cost: f64,
    /// Cost with four decimals and the currency code.
    pub cost_display: String,
    /// Title of the summarised video, for video summaries.
    pub title: Option<String>,
}

/// Outcome of `analyze`. Failures are reported, never propagated.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisReport {
    Completed(Answer),
    Failed(String),
}

impl AnalysisReport {
    pub fn is_completed(&self) -> bool {
        matches!(self, AnalysisReport::Completed(_))
    }
}

/// The main orchestrator for Sentinel.
pub struct Orchestrator {
    fetcher: ContentFetcher,
    backend: Arc<dyn ChatBackend>,
    prompts: Prompts,
    pricing: Pricing,
    max_content_chars: usize,
}

impl Orchestrator {
    /// Create an orchestrator talking to the real upstream services.
    pub fn new(settings: &Settings, credentials: &Credentials) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.chat.timeout_seconds))
            .build()?;

        let fetcher = ContentFetcher::new(
            Arc::new(YoutubeDataApi::new(
                http.clone(),
                &settings.youtube.metadata_url,
                &credentials.youtube_key,
            )),
            Arc::new(TimedTextTranscripts::new(
                http.clone(),
                &settings.youtube.transcript_url,
            )),
            Arc::new(HttpFetcher::new(http)),
            &settings.youtube.transcript_language,
        );

        let backend = Arc::new(OpenAiChat::new(&settings.chat, credentials)?);
        info!("Using chat model {}", settings.chat.model);

        Ok(Self::with_components(
            fetcher,
            backend,
            prompts,
            Pricing::from(&settings.pricing),
            settings.youtube.max_content_chars,
        ))
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        fetcher: ContentFetcher,
        backend: Arc<dyn ChatBackend>,
        prompts: Prompts,
        pricing: Pricing,
        max_content_chars: usize,
    ) -> Self {
        Self {
            fetcher,
            backend,
            prompts,
            pricing,
            max_content_chars,
        }
    }

    /// Start an empty conversation bound to this orchestrator's chat backend.
    pub fn start_session(&self) -> ConversationSession {
        ConversationSession::new(self.backend.clone())
    }

    /// Analyze a YouTube URL or chart image URL.
    ///
    /// Any failure becomes a single `Failed` message; the session history is
    /// untouched in that case.
    #[instrument(skip(self, session))]
    pub async fn analyze(&self, session: &mut ConversationSession, url: &str) -> AnalysisReport {
        match self.try_analyze(session, url).await {
            Ok(answer) => AnalysisReport::Completed(answer),
            Err(e) => {
                debug!("Analysis failed: {}", e);
                AnalysisReport::Failed(format!("An error occurred: {}", e))
            }
        }
    }

    async fn try_analyze(&self, session: &mut ConversationSession, url: &str) -> Result<Answer> {
        let url = url.trim();
        if url.is_empty() {
            return Err(SentinelError::InvalidInput(
                "Paste a YouTube URL or chart image URL".to_string(),
            ));
        }

        match extract_video_id(url) {
            Some(video_id) => {
                info!("Summarising video {}", video_id);
                let video = self.fetcher.fetch_video(&video_id).await?;
                let content: String = video.body.chars().take(self.max_content_chars).collect();
                let prompt = self.prompts.video_summary(&video.title, &content);

                let completion = session.send(UserContent::Text(prompt)).await?;
                let mut answer =
                    self.price(AnswerKind::VideoSummary, completion.text, completion.usage);
                answer.title = Some(video.title);
                Ok(answer)
            }
            None => {
                info!("No video id found, treating input as a chart image");
                let chart = self.fetcher.fetch_chart(url).await?;
                let content = UserContent::TextWithImage {
                    text: self.prompts.chart_analysis(),
                    image: InlineImage {
                        data: chart.data,
                        media_type: chart.media_type,
                    },
                };

                let completion = session.send(content).await?;
                Ok(self.price(AnswerKind::ChartAnalysis, completion.text, completion.usage))
            }
        }
    }

    /// Ask a follow-up question in an active conversation.
    ///
    /// Errors are returned to the caller as they are.
    #[instrument(skip(self, session, question))]
    pub async fn ask(&self, session: &mut ConversationSession, question: &str) -> Result<Answer> {
        if !session.is_active() {
            return Err(SentinelError::SessionInactive);
        }

        let completion = session.send(UserContent::Text(question.to_string())).await?;
        Ok(self.price(AnswerKind::FollowUp, completion.text, completion.usage))
    }

    fn price(&self, kind: AnswerKind, text: String, usage: UsageRecord) -> Answer {
        let cost = self.pricing.estimate(&usage);
        Answer {
            kind,
            text,
            usage,
            cost,
            cost_display: self.pricing.format(cost),
            title: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Turn;
    use crate::testing::{ScriptedChat, StubMetadata, StubRaw, StubTranscripts};

    fn orchestrator(
        chat: Arc<ScriptedChat>,
        metadata: StubMetadata,
        transcripts: StubTranscripts,
        raw: StubRaw,
    ) -> Orchestrator {
        let fetcher =
            ContentFetcher::new(Arc::new(metadata), Arc::new(transcripts), Arc::new(raw), "ja");
        Orchestrator::with_components(fetcher, chat, Prompts::default(), Pricing::default(), 6000)
    }

    fn first_user_text(call: &[Turn]) -> String {
        match &call[0] {
            Turn::User { content, .. } => content.text().to_string(),
            other => panic!("expected user turn, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_video_summary_with_description_fallback() {
        let chat = Arc::new(ScriptedChat::new());
        chat.reply("R", 100, 50);
        let orch = orchestrator(
            chat.clone(),
            StubMetadata::ok("T", "D"),
            StubTranscripts::failing(),
            StubRaw::failing(),
        );
        let mut session = orch.start_session();

        let report = orch
            .analyze(&mut session, "https://youtube.com/watch?v=abc12345678")
            .await;

        let answer = match report {
            AnalysisReport::Completed(answer) => answer,
            AnalysisReport::Failed(msg) => panic!("analysis failed: {}", msg),
        };
        assert_eq!(answer.kind, AnswerKind::VideoSummary);
        assert_eq!(answer.text, "R");
        assert_eq!(answer.title.as_deref(), Some("T"));
        let expected = (100.0 / 1e6) * 0.10 * 150.0 + (50.0 / 1e6) * 0.40 * 150.0;
        assert!((answer.cost - expected).abs() < 1e-12);
        assert_eq!(answer.cost_display, "0.0045 JPY");

        let calls = chat.calls();
        assert_eq!(calls.len(), 1);
        let prompt = first_user_text(&calls[0]);
        assert!(prompt.contains("タイトル: T"));
        assert!(prompt.contains("内容: D"));
        assert_eq!(session.history().len(), 2);
    }

    #[tokio::test]
    async fn test_video_body_is_truncated_by_characters() {
        let chat = Arc::new(ScriptedChat::new());
        chat.reply("ok", 1, 1);
        let long = "ア".repeat(7000);
        let orch = orchestrator(
            chat.clone(),
            StubMetadata::ok("T", "D"),
            StubTranscripts::ok(&[long.as_str()]),
            StubRaw::failing(),
        );
        let mut session = orch.start_session();

        assert!(orch
            .analyze(&mut session, "https://youtu.be/abc12345678")
            .await
            .is_completed());

        let prompt = first_user_text(&chat.calls()[0]);
        assert_eq!(prompt.matches('ア').count(), 6000);
    }

    #[tokio::test]
    async fn test_chart_analysis_sends_image() {
        let chat = Arc::new(ScriptedChat::new());
        chat.reply("chart looks bullish", 300, 20);
        let orch = orchestrator(
            chat.clone(),
            StubMetadata::failing(),
            StubTranscripts::failing(),
            StubRaw::ok(&[0xff, 0xd8, 0xff]),
        );
        let mut session = orch.start_session();

        let report = orch
            .analyze(&mut session, "https://example.com/chart.jpg")
            .await;

        match report {
            AnalysisReport::Completed(answer) => {
                assert_eq!(answer.kind, AnswerKind::ChartAnalysis);
                assert_eq!(answer.text, "chart looks bullish");
                assert!(answer.title.is_none());
                assert_eq!(answer.usage.input_tokens, 300);
                assert_eq!(answer.usage.output_tokens, 20);
                let expected = (300.0 / 1e6) * 0.10 * 150.0 + (20.0 / 1e6) * 0.40 * 150.0;
                assert!((answer.cost - expected).abs() < 1e-12);
                assert_eq!(answer.cost_display, "0.0057 JPY");
            }
            AnalysisReport::Failed(msg) => panic!("analysis failed: {}", msg),
        }

        let calls = chat.calls();
        match &calls[0][0] {
            Turn::User { content, .. } => {
                assert_eq!(content.text(), Prompts::default().chart_analysis());
                let image = content.image().expect("image attached");
                assert_eq!(image.data, vec![0xff, 0xd8, 0xff]);
                assert_eq!(image.media_type, "image/jpeg");
            }
            other => panic!("expected user turn, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_metadata_failure_reports_generic_message() {
        let chat = Arc::new(ScriptedChat::new());
        let orch = orchestrator(
            chat.clone(),
            StubMetadata::failing(),
            StubTranscripts::ok(&["ignored"]),
            StubRaw::failing(),
        );
        let mut session = orch.start_session();

        let report = orch
            .analyze(&mut session, "https://youtube.com/watch?v=abc12345678")
            .await;

        match report {
            AnalysisReport::Failed(msg) => {
                assert!(msg.starts_with("An error occurred:"));
                assert!(msg.contains("abc12345678"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert!(chat.calls().is_empty());
        assert!(!session.is_active());
        assert!(matches!(
            orch.ask(&mut session, "anything").await,
            Err(SentinelError::SessionInactive)
        ));
    }

    #[tokio::test]
    async fn test_chat_failure_during_analysis_keeps_history() {
        let chat = Arc::new(ScriptedChat::new());
        chat.fail("quota exceeded");
        let orch = orchestrator(
            chat,
            StubMetadata::failing(),
            StubTranscripts::failing(),
            StubRaw::ok(b"img"),
        );
        let mut session = orch.start_session();

        let report = orch
            .analyze(&mut session, "https://example.com/chart.jpg")
            .await;

        assert!(matches!(report, AnalysisReport::Failed(ref m) if m.contains("quota exceeded")));
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn test_empty_url_is_reported() {
        let chat = Arc::new(ScriptedChat::new());
        let orch = orchestrator(
            chat.clone(),
            StubMetadata::failing(),
            StubTranscripts::failing(),
            StubRaw::failing(),
        );
        let mut session = orch.start_session();

        assert!(!orch.analyze(&mut session, "   ").await.is_completed());
        assert!(chat.calls().is_empty());
    }

    #[tokio::test]
    async fn test_follow_up_receives_full_history() {
        let chat = Arc::new(ScriptedChat::new());
        chat.reply("R", 100, 50);
        chat.reply("stop at 29.5", 400, 30);
        let orch = orchestrator(
            chat.clone(),
            StubMetadata::ok("T", "D"),
            StubTranscripts::failing(),
            StubRaw::failing(),
        );
        let mut session = orch.start_session();

        assert!(orch
            .analyze(&mut session, "https://youtube.com/watch?v=abc12345678")
            .await
            .is_completed());

        let answer = orch.ask(&mut session, "follow-up").await.unwrap();
        assert_eq!(answer.kind, AnswerKind::FollowUp);
        assert_eq!(answer.text, "stop at 29.5");
        assert_eq!(
            answer.cost,
            Pricing::default().estimate(&UsageRecord {
                input_tokens: 400,
                output_tokens: 30
            })
        );

        let calls = chat.calls();
        assert_eq!(calls[1].len(), 3);
        assert!(matches!(&calls[1][2], Turn::User { content, .. } if content.text() == "follow-up"));
        assert_eq!(session.history().len(), 4);
    }

    #[tokio::test]
    async fn test_follow_up_failure_propagates() {
        let chat = Arc::new(ScriptedChat::new());
        chat.reply("R", 1, 1);
        chat.fail("network down");
        let orch = orchestrator(
            chat,
            StubMetadata::ok("T", "D"),
            StubTranscripts::failing(),
            StubRaw::failing(),
        );
        let mut session = orch.start_session();
        orch.analyze(&mut session, "https://youtube.com/watch?v=abc12345678")
            .await;

        let err = orch.ask(&mut session, "again?").await.unwrap_err();
        assert!(matches!(err, SentinelError::Chat(ref m) if m == "network down"));
        assert_eq!(session.history().len(), 2);
    }
}
