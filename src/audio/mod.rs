//! Audio download and processing.

mod downloader;

pub use downloader::{download_audio, split_audio};
