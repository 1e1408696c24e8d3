//! Recommendation pipeline.
//!
//! Coordinates one request from comprehension samples to recommendations:
//! transcribe the video, cut an excerpt around every confusing moment, turn
//! each excerpt into a search query and look up videos for it.
//!
//! Segments run concurrently but results keep the order of the confusion
//! timestamps. Errors that only concern one segment drop that segment when
//! `pipeline.isolate_segment_failures` is set; anything else aborts the request.

use crate::audio_source::extract_video_id;
use crate::config::{PipelineSettings, Settings};
use crate::error::{PersonaLearnError, Result};
use crate::query::QueryDeriver;
use crate::recommend::{Resource, ResourceRecommender};
use crate::segmenter::{segments_from, TranscriptExcerpt};
use crate::transcription::{CachedTranscriber, TranscriptionProvider};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Comprehension scores below this mark a confusing moment.
pub const CONFUSION_THRESHOLD: f64 = -0.5;

/// A comprehension sample reported by the client.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComprehensionPoint {
    /// Seconds into the video.
    pub timestamp: f64,
    pub comprehension: f64,
}

/// Resources suggested for one confusing moment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub transcript_segment: String,
    pub query: String,
    pub resources: Vec<Resource>,
}

/// Where a request currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Init,
    Transcribing,
    Segmenting,
    Deriving,
    Recommending,
    Assembled,
    Completed,
    Failed,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Init => "init",
            PipelineStage::Transcribing => "transcribing",
            PipelineStage::Segmenting => "segmenting",
            PipelineStage::Deriving => "deriving",
            PipelineStage::Recommending => "recommending",
            PipelineStage::Assembled => "assembled",
            PipelineStage::Completed => "completed",
            PipelineStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Timestamps of the samples scoring strictly below `threshold`, in input order.
pub fn extract_confusion_timestamps(points: &[ComprehensionPoint], threshold: f64) -> Vec<f64> {
    points
        .iter()
        .filter(|p| p.comprehension < threshold)
        .map(|p| p.timestamp)
        .collect()
}

/// Run `fut`, failing with [`PersonaLearnError::Timeout`] once `limit` elapses.
async fn with_timeout<T>(
    operation: &str,
    limit: Duration,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| PersonaLearnError::Timeout {
            operation: operation.to_string(),
            seconds: limit.as_secs_f64(),
        })?
}

/// The recommendation pipeline.
pub struct RecommendationPipeline {
    transcriber: Arc<dyn TranscriptionProvider>,
    deriver: QueryDeriver,
    recommender: ResourceRecommender,
    settings: PipelineSettings,
    call_timeout: Duration,
    transcription_timeout: Duration,
}

impl RecommendationPipeline {
    /// Create the production pipeline from settings.
    pub fn new(settings: &Settings) -> Result<Self> {
        let transcriber = Arc::new(CachedTranscriber::from_settings(settings)?);
        let deriver = QueryDeriver::from_settings(settings)?;
        let recommender = ResourceRecommender::from_settings(settings)?;

        Ok(Self::with_components(settings, transcriber, deriver, recommender))
    }

    /// Create a pipeline with custom components.
    pub fn with_components(
        settings: &Settings,
        transcriber: Arc<dyn TranscriptionProvider>,
        deriver: QueryDeriver,
        recommender: ResourceRecommender,
    ) -> Self {
        Self {
            transcriber,
            deriver,
            recommender,
            call_timeout: Duration::from_secs(settings.pipeline.call_timeout_seconds),
            transcription_timeout: Duration::from_secs(settings.transcription.timeout_seconds),
            settings: settings.pipeline.clone(),
        }
    }

    /// Override the budget for each query derivation and search call.
    pub fn with_call_timeout(mut self, limit: Duration) -> Self {
        self.call_timeout = limit;
        self
    }

    /// Override the transcription budget.
    pub fn with_transcription_timeout(mut self, limit: Duration) -> Self {
        self.transcription_timeout = limit;
        self
    }

    /// Recommendations for every confusing moment of a video, in timestamp order.
    #[instrument(skip(self, points), fields(points = points.len()))]
    pub async fn recommend(
        &self,
        video: &str,
        points: &[ComprehensionPoint],
    ) -> Result<Vec<Recommendation>> {
        debug!(stage = %PipelineStage::Init);
        let video_id = extract_video_id(video).ok_or_else(|| {
            PersonaLearnError::InvalidInput(format!("Invalid YouTube video ID or URL: {}", video))
        })?;

        let timestamps = extract_confusion_timestamps(points, self.settings.confusion_threshold);
        if timestamps.is_empty() {
            info!(stage = %PipelineStage::Completed, "No confusing moments for {}", video_id);
            return Ok(Vec::new());
        }
        info!("{} confusing moment(s) in {}", timestamps.len(), video_id);

        info!(stage = %PipelineStage::Transcribing);
        let store = with_timeout(
            "transcription",
            self.transcription_timeout,
            self.transcriber.transcribe(&video_id),
        )
        .await
        .map_err(|e| {
            warn!(stage = %PipelineStage::Failed, "Transcription of {} failed: {}", video_id, e);
            PersonaLearnError::TranscriptionFatal(e.to_string())
        })?;

        info!(stage = %PipelineStage::Segmenting, phrases = store.len());
        let exclude = self
            .settings
            .exclude_source_video
            .then_some(video_id.as_str());

        let outcomes = stream::iter(segments_from(&store, timestamps, self.settings.buffer_seconds))
            .map(|excerpt| self.process_segment(store.title(), excerpt, exclude))
            .buffered(self.settings.max_concurrent_segments.max(1));
        let mut outcomes = std::pin::pin!(outcomes);

        let mut recommendations = Vec::new();
        while let Some(outcome) = outcomes.next().await {
            match outcome {
                Ok(recommendation) => recommendations.push(recommendation),
                Err(e) if self.settings.isolate_segment_failures && e.is_segment_fatal() => {
                    warn!("Skipping segment: {}", e);
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            stage = %PipelineStage::Completed,
            "Produced {} recommendation(s) for {}",
            recommendations.len(),
            video_id
        );
        Ok(recommendations)
    }

    async fn process_segment(
        &self,
        title: &str,
        excerpt: Result<TranscriptExcerpt>,
        exclude: Option<&str>,
    ) -> Result<Recommendation> {
        let excerpt = excerpt?;

        debug!(stage = %PipelineStage::Deriving, timestamp = excerpt.timestamp);
        let query = with_timeout(
            "query derivation",
            self.call_timeout,
            self.deriver.derive_query(title, &excerpt.text),
        )
        .await?;

        debug!(stage = %PipelineStage::Recommending, query = %query);
        let resources = with_timeout(
            "resource search",
            self.call_timeout,
            self.recommender
                .recommend(&query, self.settings.max_resources, exclude),
        )
        .await?;

        debug!(
            stage = %PipelineStage::Assembled,
            timestamp = excerpt.timestamp,
            resources = resources.len()
        );
        Ok(Recommendation {
            transcript_segment: excerpt.text,
            query,
            resources,
        })
    }
}
