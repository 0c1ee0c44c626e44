//! The async embedding pipeline: chunking, the worker pool, and the reaper
//! (spec §4.3).

pub mod reaper;
pub mod text;
pub mod worker;

pub use reaper::{Reaper, ReaperConfig};
pub use worker::{PipelineConfig, WorkerPool};
