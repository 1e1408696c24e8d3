//! Configuration module for PersonaLearn.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, QueryPrompts};
pub use settings::{
    CandidatePolicy, GeneralSettings, PipelineSettings, QuerySettings, SamplingSettings,
    ServerSettings, Settings, TranscriptionSettings, YoutubeSettings,
};
