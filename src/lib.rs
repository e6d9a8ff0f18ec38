//! queuestat - concurrency analysis of CI background-task queues
//!
//! This library reads exported task pages, normalizes finished tasks into
//! execution intervals and sweeps them to find peak concurrency, the
//! distribution of concurrency levels and the windows during which the
//! queue stayed at or above a threshold.

pub mod analysis;
pub mod cli;
pub mod concurrency;
pub mod config;
pub mod csv_output;
pub mod error;
pub mod filter;
pub mod json_output;
pub mod loader;
pub mod normalize;
pub mod summary;
pub mod task_record;
pub mod text_output;
