//! PersonaLearn - supplementary videos for confusing lecture moments
//!
//! Given a lecture video and the learner's comprehension samples, PersonaLearn
//! transcribes the lecture, cuts the transcript around every moment where
//! comprehension dropped, turns each excerpt into a search query and suggests
//! YouTube videos that cover the same idea.
//!
//! # Architecture
//!
//! - `transcription` - Timed phrases, the [`transcription::PhraseStore`] range
//!   lookup, SRT files and the Whisper-backed transcription cache
//! - `segmenter` - Transcript excerpts around confusion timestamps
//! - `query` - Search query derivation with a text generation model
//! - `recommend` - Video search and statistics (YouTube Data API)
//! - `pipeline` - Request orchestration
//! - `audio_source` / `audio` - yt-dlp metadata, audio download and splitting
//! - `config` - Settings and prompt templates
//!
//! # Example
//!
//! ```rust,no_run
//! use personalearn::config::Settings;
//! use personalearn::pipeline::{ComprehensionPoint, RecommendationPipeline};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let pipeline = RecommendationPipeline::new(&settings)?;
//!
//!     let points = vec![ComprehensionPoint { timestamp: 754.0, comprehension: -0.9 }];
//!     for recommendation in pipeline.recommend("dQw4w9WgXcQ", &points).await? {
//!         println!("{} -> {} videos", recommendation.query, recommendation.resources.len());
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod audio;
pub mod audio_source;
pub mod cli;
pub mod config;
pub mod error;
pub mod openai;
pub mod pipeline;
pub mod query;
pub mod recommend;
pub mod segmenter;
pub mod transcription;

pub use error::{PersonaLearnError, Result};
