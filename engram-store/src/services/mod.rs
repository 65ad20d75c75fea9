pub mod dataset_version;
pub mod scorecard;
pub mod scoring;
