/// Issue items
pub mod item;

/// Sparse feature vectors
pub mod vector;

/// In-memory tabular data
pub mod frame;

/// Label vocabularies
pub mod labels;

/// Text featurization
pub mod featurizer;

/// Declared pipeline stages
pub mod estimator;

/// Fitted pipeline stages
pub mod transformer;

/// The standard pipeline declaration
pub mod builder;

/// Training
pub mod training;

/// Evaluation metrics
pub mod evaluation;

/// Inference
pub mod inference;

/// Saving and loading fitted pipelines
pub mod persistence;

pub use estimator::{Estimator, EstimatorChain};
pub use evaluation::{evaluate, MulticlassMetrics};
pub use featurizer::{FeaturizerConfig, TextFeaturizer};
pub use frame::{Column, ColumnKind, Frame, Row, Schema, SchemaColumn};
pub use inference::{Prediction, PredictionEngine};
pub use item::Item;
pub use labels::LabelVocabulary;
pub use training::train;
pub use transformer::{FittedPipeline, Transformer};
pub use vector::{Norm, SparseVector};

/// Column names used by the standard pipeline
pub mod columns {
    /// Issue title text
    pub const TITLE: &str = "Title";

    /// Issue description text
    pub const DESCRIPTION: &str = "Description";

    /// Issue area label text
    pub const AREA: &str = "Area";

    /// Area label keys
    pub const LABEL: &str = "Label";

    /// Featurized title
    pub const TITLE_FEATURIZED: &str = "TitleFeaturized";

    /// Featurized description
    pub const DESCRIPTION_FEATURIZED: &str = "DescriptionFeaturized";

    /// Joined feature vector
    pub const FEATURES: &str = "Features";

    /// Per-class probabilities
    pub const SCORE: &str = "Score";

    /// Predicted label key, decoded to text at the end of the pipeline
    pub const PREDICTED_LABEL: &str = "PredictedLabel";
}
