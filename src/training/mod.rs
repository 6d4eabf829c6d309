/// Remote training API integration
///
/// `params` maps model node settings to form fields; `client` performs the
/// HTTP calls.

pub mod client;
pub mod params;

pub use client::{DownloadedModel, TrainingClient};
pub use params::{algorithm_fields, training_fields, FormField};
