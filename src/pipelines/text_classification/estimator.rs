use std::collections::BTreeSet;

use log::debug;

use crate::{
    error::{Error, Result},
    models::maximum_entropy::{self, ClassifierConfig},
};

use super::{
    columns, FeaturizerConfig, FittedPipeline, Frame, LabelVocabulary, SparseVector,
    TextFeaturizer, Transformer,
};

/// A declared, not yet fitted, pipeline stage
#[derive(Clone, Debug)]
pub enum Estimator {
    /// Map a text label column to integer keys
    LabelEncode {
        /// Text column holding the labels
        input: String,
        /// Key column to produce
        output: String,
    },

    /// Turn a text column into sparse n-gram count vectors
    Featurize {
        /// Text column to featurize
        input: String,
        /// Vector column to produce
        output: String,
        /// Featurization settings
        config: FeaturizerConfig,
    },

    /// Join vector columns end to end
    Concatenate {
        /// Vector columns, in order
        inputs: Vec<String>,
        /// Vector column to produce
        output: String,
    },

    /// Materialize the frame and drop columns no later stage reads
    Cache,

    /// Fit a maximum entropy classifier, producing `Score` and `PredictedLabel`
    Classify {
        /// Key column with the true labels
        label: String,
        /// Vector column with the features
        features: String,
        /// Training settings
        config: ClassifierConfig,
    },

    /// Map a key column back to the label text, in place
    DecodeLabel {
        /// Key column to decode
        column: String,
    },
}

impl Estimator {
    /// Columns this stage reads
    pub fn inputs(&self) -> Vec<&str> {
        match self {
            Estimator::LabelEncode { input, .. } => vec![input.as_str()],
            Estimator::Featurize { input, .. } => vec![input.as_str()],
            Estimator::Concatenate { inputs, .. } => inputs.iter().map(String::as_str).collect(),
            Estimator::Cache => Vec::new(),
            Estimator::Classify {
                label, features, ..
            } => vec![label.as_str(), features.as_str()],
            Estimator::DecodeLabel { column } => vec![column.as_str()],
        }
    }

    /// Learn this stage's state from a frame
    pub fn fit(&self, frame: &Frame) -> Result<Transformer> {
        match self {
            Estimator::LabelEncode { input, output } => {
                let vocabulary = LabelVocabulary::fit(frame.text(input)?);

                debug!("Label vocabulary for {:?}: {:?}", input, vocabulary.labels());

                Ok(Transformer::LabelEncode {
                    input: input.clone(),
                    output: output.clone(),
                    vocabulary,
                })
            }

            Estimator::Featurize {
                input,
                output,
                config,
            } => Ok(Transformer::Featurize {
                input: input.clone(),
                output: output.clone(),
                featurizer: TextFeaturizer::fit(config, frame.text(input)?)?,
            }),

            Estimator::Concatenate { inputs, output } => {
                for input in inputs {
                    frame.vectors(input)?;
                }

                Ok(Transformer::Concatenate {
                    inputs: inputs.clone(),
                    output: output.clone(),
                })
            }

            Estimator::Cache => Ok(Transformer::Cache),

            Estimator::Classify {
                label,
                features,
                config,
            } => {
                let (keys, labels) = frame.keys(label)?;
                let vectors = frame.vectors(features)?;

                let vocabulary = LabelVocabulary::from_labels(labels.as_ref().clone());
                let targets: Vec<u32> = keys.iter().flatten().copied().collect();

                let weights = if targets.len() == keys.len() {
                    maximum_entropy::fit(vectors, &targets, vocabulary.len(), config)?
                } else {
                    // Rows with a missing label do not take part in training
                    debug!(
                        "Skipping {} training rows without a label",
                        keys.len() - targets.len()
                    );

                    let rows: Vec<SparseVector> = keys
                        .iter()
                        .zip(vectors)
                        .filter(|(key, _)| key.is_some())
                        .map(|(_, vector)| vector.clone())
                        .collect();

                    maximum_entropy::fit(&rows, &targets, vocabulary.len(), config)?
                };

                Ok(Transformer::Classify {
                    features: features.clone(),
                    score: columns::SCORE.to_string(),
                    predicted: columns::PREDICTED_LABEL.to_string(),
                    vocabulary,
                    weights,
                })
            }

            Estimator::DecodeLabel { column } => {
                let (_, labels) = frame.keys(column)?;

                Ok(Transformer::DecodeLabel {
                    column: column.clone(),
                    vocabulary: LabelVocabulary::from_labels(labels.as_ref().clone()),
                })
            }
        }
    }
}

/// An ordered sequence of declared stages
#[derive(Clone, Debug, Default)]
pub struct EstimatorChain {
    stages: Vec<Estimator>,
}

impl EstimatorChain {
    /// An empty chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a stage to the end of the chain
    pub fn append(mut self, stage: Estimator) -> Self {
        self.stages.push(stage);
        self
    }

    /// Add a caching checkpoint to the end of the chain
    pub fn append_cache_checkpoint(self) -> Self {
        self.append(Estimator::Cache)
    }

    /// The declared stages
    pub fn stages(&self) -> &[Estimator] {
        &self.stages
    }

    /// Fit every stage in order, each on the output of the stages fitted before it
    pub fn fit(&self, data: Frame) -> Result<FittedPipeline> {
        if self.stages.is_empty() {
            return Err(Error::Training("the pipeline has no stages".to_string()));
        }

        let mut frame = data;
        let mut fitted = Vec::with_capacity(self.stages.len());

        for (index, stage) in self.stages.iter().enumerate() {
            let transformer = stage.fit(&frame)?;
            let later = &self.stages[index + 1..];

            if later.is_empty() {
                fitted.push(transformer);
                break;
            }

            frame = transformer.apply(frame)?;

            if let Estimator::Cache = stage {
                let needed: BTreeSet<&str> = later.iter().flat_map(Estimator::inputs).collect();
                frame.retain(|name| needed.contains(name));

                debug!(
                    "Cached {} rows with columns {:?}",
                    frame.rows(),
                    frame.column_names().collect::<Vec<_>>()
                );
            }

            fitted.push(transformer);
        }

        Ok(FittedPipeline::new(fitted))
    }
}

impl From<Vec<Estimator>> for EstimatorChain {
    fn from(stages: Vec<Estimator>) -> Self {
        Self { stages }
    }
}
