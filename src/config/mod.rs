//! Configuration types and loading.
//!
//! Every stage receives an explicit [`CaselockConfig`] instead of reading
//! process-wide environment state; the defaults reproduce the pipeline's
//! design values (10-unit polls, 600-unit capture budget, 120-unit stop
//! ceiling).

mod settings;

pub use settings::{
    CaptureConfig, CaselockConfig, ContainmentConfig, PipelineConfig, RemoteConfig,
};
