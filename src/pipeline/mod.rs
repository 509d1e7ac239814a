// Pipelines — the end-to-end review analysis and the cached static dataset.

pub mod analysis;
pub mod dataset;
