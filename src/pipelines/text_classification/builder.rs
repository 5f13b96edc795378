//! The standard issue classification pipeline

use crate::models::maximum_entropy::ClassifierConfig;

use super::{columns, Estimator, EstimatorChain, FeaturizerConfig};

/// Declare the featurization stages: encode `Area` as `Label`, featurize `Title` and
/// `Description`, join them into `Features`, then checkpoint
pub fn feature_pipeline(featurizer: &FeaturizerConfig) -> EstimatorChain {
    EstimatorChain::new()
        .append(Estimator::LabelEncode {
            input: columns::AREA.to_string(),
            output: columns::LABEL.to_string(),
        })
        .append(Estimator::Featurize {
            input: columns::TITLE.to_string(),
            output: columns::TITLE_FEATURIZED.to_string(),
            config: featurizer.clone(),
        })
        .append(Estimator::Featurize {
            input: columns::DESCRIPTION.to_string(),
            output: columns::DESCRIPTION_FEATURIZED.to_string(),
            config: featurizer.clone(),
        })
        .append(Estimator::Concatenate {
            inputs: vec![
                columns::TITLE_FEATURIZED.to_string(),
                columns::DESCRIPTION_FEATURIZED.to_string(),
            ],
            output: columns::FEATURES.to_string(),
        })
        .append_cache_checkpoint()
}

/// Extend a feature pipeline with the classifier and the predicted label decoding
pub fn training_pipeline(features: EstimatorChain, classifier: &ClassifierConfig) -> EstimatorChain {
    features
        .append(Estimator::Classify {
            label: columns::LABEL.to_string(),
            features: columns::FEATURES.to_string(),
            config: classifier.clone(),
        })
        .append(Estimator::DecodeLabel {
            column: columns::PREDICTED_LABEL.to_string(),
        })
}
