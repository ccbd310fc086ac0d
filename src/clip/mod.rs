//! The clipping workflow.
//!
//! A run fetches subtitles with yt-dlp, converts every available track into a
//! styled ASS file, downloads the full video, trims it to the requested window
//! with the chosen track burned in, and removes the temporary download.

mod config;
mod pipeline;
mod report;
mod request;
mod steps;
mod workspace;

pub use config::ClipperConfig;
pub use pipeline::Pipeline;
pub use report::{FailurePolicy, PipelineReport};
pub use request::{ClipRequest, ClipTime};
pub use workspace::Workspace;
