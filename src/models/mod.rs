/// Maximum entropy classifier
pub mod maximum_entropy;
