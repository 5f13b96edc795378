use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    models::maximum_entropy::Weights,
    utils::classes::argmax,
};

use super::{Column, Frame, LabelVocabulary, SparseVector, TextFeaturizer};

/// A fitted pipeline stage. Immutable once fitted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Transformer {
    /// Map label text to keys. Skipped when the label column is absent.
    LabelEncode {
        /// Text column holding the labels
        input: String,
        /// Key column to produce
        output: String,
        /// Labels observed at fit time
        vocabulary: LabelVocabulary,
    },

    /// Featurize a text column
    Featurize {
        /// Text column to featurize
        input: String,
        /// Vector column to produce
        output: String,
        /// The fitted featurizer
        featurizer: TextFeaturizer,
    },

    /// Join vector columns end to end
    Concatenate {
        /// Vector columns, in order
        inputs: Vec<String>,
        /// Vector column to produce
        output: String,
    },

    /// Caching checkpoint; a no-op once fitted
    Cache,

    /// Score every row with the fitted classifier
    Classify {
        /// Vector column with the features
        features: String,
        /// Score column to produce
        score: String,
        /// Predicted key column to produce
        predicted: String,
        /// Labels the classifier outputs index into
        vocabulary: LabelVocabulary,
        /// Learned parameters
        weights: Weights,
    },

    /// Map keys back to label text, in place
    DecodeLabel {
        /// Key column to decode
        column: String,
        /// Labels the keys index into
        vocabulary: LabelVocabulary,
    },
}

impl Transformer {
    /// Apply this stage to a frame
    pub fn apply(&self, mut frame: Frame) -> Result<Frame> {
        match self {
            Transformer::LabelEncode {
                input,
                output,
                vocabulary,
            } => {
                if !frame.contains(input) {
                    return Ok(frame);
                }

                let keys = vocabulary.encode(frame.text(input)?);
                frame.insert(
                    output,
                    Column::Key {
                        keys,
                        vocabulary: vocabulary.shared(),
                    },
                )?;
            }

            Transformer::Featurize {
                input,
                output,
                featurizer,
            } => {
                let vectors = frame
                    .text(input)?
                    .iter()
                    .map(|text| featurizer.transform(text))
                    .collect::<Result<Vec<_>>>()?;

                frame.insert(output, Column::Vector(vectors))?;
            }

            Transformer::Concatenate { inputs, output } => {
                let parts = inputs
                    .iter()
                    .map(|input| frame.vectors(input))
                    .collect::<Result<Vec<_>>>()?;

                let joined = (0..frame.rows())
                    .map(|row| SparseVector::concat(parts.iter().map(|part| &part[row])))
                    .collect();

                frame.insert(output, Column::Vector(joined))?;
            }

            Transformer::Cache => {}

            Transformer::Classify {
                features,
                score,
                predicted,
                vocabulary,
                weights,
            } => {
                let scores: Vec<Vec<f32>> = frame
                    .vectors(features)?
                    .iter()
                    .map(|vector| weights.scores(vector))
                    .collect();

                let keys = scores
                    .iter()
                    .map(|row| argmax(row).map(|key| key as u32))
                    .collect();

                frame.insert(score, Column::Scores(scores))?;
                frame.insert(
                    predicted,
                    Column::Key {
                        keys,
                        vocabulary: vocabulary.shared(),
                    },
                )?;
            }

            Transformer::DecodeLabel { column, vocabulary } => {
                let (keys, _) = frame.keys(column)?;

                let labels = keys
                    .iter()
                    .map(|key| {
                        key.and_then(|key| vocabulary.label(key))
                            .unwrap_or_default()
                            .to_string()
                    })
                    .collect();

                frame.insert(column, Column::Text(labels))?;
            }
        }

        Ok(frame)
    }

    /// Columns this stage produces
    pub fn outputs(&self) -> Vec<&str> {
        match self {
            Transformer::LabelEncode { output, .. }
            | Transformer::Featurize { output, .. }
            | Transformer::Concatenate { output, .. } => vec![output.as_str()],
            Transformer::Cache => Vec::new(),
            Transformer::Classify {
                score, predicted, ..
            } => vec![score.as_str(), predicted.as_str()],
            Transformer::DecodeLabel { column, .. } => vec![column.as_str()],
        }
    }
}

/// The trained pipeline: every fitted stage, in order
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FittedPipeline {
    stages: Vec<Transformer>,
}

impl FittedPipeline {
    /// Wrap fitted stages
    pub fn new(stages: Vec<Transformer>) -> Self {
        Self { stages }
    }

    /// The fitted stages
    pub fn stages(&self) -> &[Transformer] {
        &self.stages
    }

    /// Run a frame through every stage
    pub fn transform(&self, frame: Frame) -> Result<Frame> {
        self.stages
            .iter()
            .try_fold(frame, |frame, stage| stage.apply(frame))
    }

    /// The label vocabulary of the classifier stage
    pub fn labels(&self) -> Result<&LabelVocabulary> {
        self.stages
            .iter()
            .find_map(|stage| match stage {
                Transformer::Classify { vocabulary, .. } => Some(vocabulary),
                _ => None,
            })
            .ok_or_else(|| Error::Training("the pipeline has no classifier stage".to_string()))
    }

    /// The text column the label encoder reads, if the pipeline has one
    pub fn label_column(&self) -> Option<&str> {
        self.stages.iter().find_map(|stage| match stage {
            Transformer::LabelEncode { input, .. } => Some(input.as_str()),
            _ => None,
        })
    }

    /// Check the learned state of every stage, as read back from an artifact
    pub fn validate(&self) -> Result<()> {
        for stage in &self.stages {
            if let Transformer::Classify {
                vocabulary,
                weights,
                ..
            } = stage
            {
                weights.validate()?;

                if vocabulary.len() != weights.n_classes {
                    return Err(Error::Record(format!(
                        "{} labels for {} classifier outputs",
                        vocabulary.len(),
                        weights.n_classes
                    )));
                }
            }
        }

        Ok(())
    }

    /// Text columns a record must provide: featurizer inputs no earlier stage produces
    pub fn required_columns(&self) -> Vec<String> {
        let mut produced: BTreeSet<&str> = BTreeSet::new();
        let mut required: Vec<String> = Vec::new();

        for stage in &self.stages {
            if let Transformer::Featurize { input, .. } = stage {
                if !produced.contains(input.as_str()) && !required.contains(input) {
                    required.push(input.clone());
                }
            }

            produced.extend(stage.outputs());
        }

        required
    }
}
