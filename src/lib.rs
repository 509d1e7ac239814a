// Review Intel: topic discovery for customer review corpora
//
// This is the library root. Each module corresponds to a stage or a
// collaborator of the review analysis pipeline.

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod table;
pub mod text;
pub mod topics;
