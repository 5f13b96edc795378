use std::fmt::{self, Display};

use log::debug;
use serde::Serialize;

use crate::error::{Error, Result};

use super::{columns, ColumnKind, FittedPipeline, Frame, Item, Row, Schema};

/// The outcome of classifying one record
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Prediction {
    /// The highest scoring area
    pub area: String,

    /// Every area with its probability, in vocabulary order
    pub scores: Vec<(String, f32)>,
}

impl Prediction {
    /// The probability of the predicted area
    pub fn confidence(&self) -> f32 {
        self.scores
            .iter()
            .find(|(label, _)| *label == self.area)
            .map(|(_, score)| *score)
            .unwrap_or_default()
    }

    /// The `k` most probable areas, best first
    pub fn top(&self, k: usize) -> Vec<(&str, f32)> {
        let mut ranked: Vec<(&str, f32)> = self
            .scores
            .iter()
            .map(|(label, score)| (label.as_str(), *score))
            .collect();

        // Stable sort keeps the lower key first on ties
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(k);
        ranked
    }
}

impl Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.area)
    }
}

/// Applies a fitted pipeline to single records
#[derive(Clone, Debug)]
pub struct PredictionEngine {
    model: FittedPipeline,
    required: Vec<String>,
}

impl PredictionEngine {
    /// Wrap a fitted pipeline
    pub fn new(model: FittedPipeline) -> Self {
        let required = model.required_columns();

        Self { model, required }
    }

    /// Wrap a fitted pipeline loaded with the schema it was trained on.
    ///
    /// Every text column of the schema except the label becomes required.
    pub fn with_schema(model: FittedPipeline, schema: &Schema) -> Self {
        let mut required = model.required_columns();
        let label = model.label_column();

        for column in &schema.0 {
            if column.kind == ColumnKind::Text
                && Some(column.name.as_str()) != label
                && !required.contains(&column.name)
            {
                required.push(column.name.clone());
            }
        }

        Self { model, required }
    }

    /// The wrapped pipeline
    pub fn model(&self) -> &FittedPipeline {
        &self.model
    }

    /// Text columns a record must provide
    pub fn required_columns(&self) -> &[String] {
        &self.required
    }

    /// Classify one record
    pub fn predict(&self, row: &Row) -> Result<Prediction> {
        if let Some(column) = self.required.iter().find(|name| !row.contains_key(*name)) {
            return Err(Error::SchemaMismatch {
                column: column.clone(),
            });
        }

        let frame = self.model.transform(Frame::from_row(row))?;

        let area = frame
            .text(columns::PREDICTED_LABEL)?
            .first()
            .cloned()
            .unwrap_or_default();

        let labels = self.model.labels()?.labels();
        let scores = frame
            .scores(columns::SCORE)?
            .first()
            .map(|row| labels.iter().cloned().zip(row.iter().copied()).collect())
            .unwrap_or_default();

        let prediction = Prediction { area, scores };

        debug!(
            "Predicted {:?} with probability {:.4}",
            prediction.area,
            prediction.confidence()
        );

        Ok(prediction)
    }

    /// Classify one issue
    pub fn predict_issue<I: Item>(&self, item: &I) -> Result<Prediction> {
        self.predict(&Row::from(item))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        models::maximum_entropy::Weights,
        pipelines::text_classification::{
            FeaturizerConfig, LabelVocabulary, SchemaColumn, TextFeaturizer, Transformer,
        },
    };

    fn model() -> Result<FittedPipeline> {
        let texts = vec!["crash".to_string(), "typo".to_string()];
        let config = FeaturizerConfig::new()
            .with_word_ngram_length(1)
            .with_char_ngram_length(0);
        let featurizer = TextFeaturizer::fit(&config, &texts)?;
        let vocabulary =
            LabelVocabulary::from_labels(vec!["area-bug".to_string(), "area-docs".to_string()]);

        // Vocabulary terms sort as "w:crash", "w:typo"
        let model = FittedPipeline::new(vec![
            Transformer::LabelEncode {
                input: columns::AREA.to_string(),
                output: columns::LABEL.to_string(),
                vocabulary: vocabulary.clone(),
            },
            Transformer::Featurize {
                input: columns::TITLE.to_string(),
                output: columns::FEATURES.to_string(),
                featurizer,
            },
            Transformer::Classify {
                features: columns::FEATURES.to_string(),
                score: columns::SCORE.to_string(),
                predicted: columns::PREDICTED_LABEL.to_string(),
                vocabulary: vocabulary.clone(),
                weights: Weights {
                    n_features: 2,
                    n_classes: 2,
                    weight: vec![3.0, 0.0, 0.0, 3.0],
                    bias: vec![0.0, 0.0],
                },
            },
            Transformer::DecodeLabel {
                column: columns::PREDICTED_LABEL.to_string(),
                vocabulary,
            },
        ]);

        Ok(model)
    }

    fn engine() -> Result<PredictionEngine> {
        Ok(PredictionEngine::new(model()?))
    }

    #[test]
    fn predicts_the_best_area() -> Result<()> {
        let engine = engine()?;
        let prediction = engine.predict(&Row::new().with(columns::TITLE, "Typo"))?;

        assert_eq!(prediction.area, "area-docs");
        assert_eq!(prediction.scores.len(), 2);
        assert!(prediction.confidence() > 0.9);
        assert_eq!(prediction.top(1)[0].0, "area-docs");

        let total: f32 = prediction.scores.iter().map(|(_, p)| p).sum();
        assert!((total - 1.0).abs() < 1e-5);

        Ok(())
    }

    #[test]
    fn missing_required_column_is_a_schema_mismatch() -> Result<()> {
        let engine = engine()?;

        assert_eq!(engine.required_columns(), &[columns::TITLE.to_string()]);
        assert!(matches!(
            engine.predict(&Row::new().with(columns::DESCRIPTION, "typo")),
            Err(Error::SchemaMismatch { column }) if column == columns::TITLE
        ));

        Ok(())
    }

    #[test]
    fn saved_schema_columns_are_required_except_the_label() -> Result<()> {
        let schema = Schema(vec![
            SchemaColumn::new(columns::TITLE, ColumnKind::Text),
            SchemaColumn::new(columns::DESCRIPTION, ColumnKind::Text),
            SchemaColumn::new(columns::AREA, ColumnKind::Text),
        ]);
        let engine = PredictionEngine::with_schema(model()?, &schema);

        assert_eq!(
            engine.required_columns(),
            &[columns::TITLE.to_string(), columns::DESCRIPTION.to_string()]
        );
        assert!(matches!(
            engine.predict(&Row::new().with(columns::TITLE, "typo")),
            Err(Error::SchemaMismatch { column }) if column == columns::DESCRIPTION
        ));

        let prediction = engine.predict(
            &Row::new()
                .with(columns::TITLE, "typo")
                .with(columns::DESCRIPTION, ""),
        )?;
        assert_eq!(prediction.area, "area-docs");

        Ok(())
    }
}
