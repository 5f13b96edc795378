/// The GitHub issues dataset
pub mod issues;

pub use issues::{Issue, IssueDataset};
