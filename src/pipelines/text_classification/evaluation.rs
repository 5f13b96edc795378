use std::fmt::{self, Display};

use log::{info, warn};
use serde::Serialize;

use crate::{
    error::{Error, Result},
    utils::classes::argmax,
};

use super::{columns, FittedPipeline, Frame};

/// Probabilities are clamped to at least this before taking the log
pub const LOG_LOSS_EPSILON: f64 = 1e-15;

/// Counts of true class (rows) against predicted class (columns)
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConfusionMatrix {
    /// Class labels in key order
    pub labels: Vec<String>,

    /// `counts[truth][predicted]`
    pub counts: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    fn new(labels: Vec<String>) -> Self {
        let n_classes = labels.len();

        Self {
            labels,
            counts: vec![vec![0; n_classes]; n_classes],
        }
    }

    /// Number of rows of class `truth` predicted as `predicted`
    pub fn get(&self, truth: usize, predicted: usize) -> usize {
        self.counts[truth][predicted]
    }

    /// Fraction of rows predicted as `class` that truly are, if any were predicted
    pub fn precision(&self, class: usize) -> Option<f64> {
        let predicted: usize = self.counts.iter().map(|row| row[class]).sum();

        (predicted > 0).then(|| self.counts[class][class] as f64 / predicted as f64)
    }

    /// Fraction of rows of `class` predicted correctly, if the class occurs
    pub fn recall(&self, class: usize) -> Option<f64> {
        let total: usize = self.counts[class].iter().sum();

        (total > 0).then(|| self.counts[class][class] as f64 / total as f64)
    }
}

impl Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .labels
            .iter()
            .map(String::len)
            .max()
            .unwrap_or(0)
            .max(8);

        write!(f, "{:>width$} |", "truth")?;
        for index in 0..self.labels.len() {
            write!(f, " {:>6}", index)?;
        }
        writeln!(f, " | recall")?;

        for (index, label) in self.labels.iter().enumerate() {
            write!(f, "{:>width$} |", format!("{index}. {label}"))?;
            for count in &self.counts[index] {
                write!(f, " {:>6}", count)?;
            }

            match self.recall(index) {
                Some(recall) => writeln!(f, " | {:.4}", recall)?,
                None => writeln!(f, " |      -")?,
            }
        }

        Ok(())
    }
}

/// Aggregate quality metrics of a multiclass classifier over a labeled dataset
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MulticlassMetrics {
    /// Fraction of rows predicted correctly
    pub micro_accuracy: f64,

    /// Mean per-class accuracy over the classes present in the data
    pub macro_accuracy: f64,

    /// Mean negative log probability of the true class
    pub log_loss: f64,

    /// Relative improvement of the log-loss over always predicting the class prior
    pub log_loss_reduction: f64,

    /// The `k` of the top-k accuracy
    pub top_k: usize,

    /// Fraction of rows whose true class is among the `k` best scores
    pub top_k_accuracy: f64,

    /// Log-loss of the rows of each class, in key order; 0 for absent classes
    pub per_class_log_loss: Vec<f64>,

    /// Truth against prediction counts
    pub confusion_matrix: ConfusionMatrix,

    /// Rows evaluated
    pub rows: usize,

    /// Rows skipped because their label was not seen during training
    pub skipped: usize,
}

impl Display for MulticlassMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "*".repeat(109);

        writeln!(f, "{rule}")?;
        writeln!(
            f,
            "*       Metrics for Multi-class Classification model - Test Data"
        )?;
        writeln!(f, "*{}", "-".repeat(108))?;
        writeln!(f, "*       MicroAccuracy:    {:.3}", self.micro_accuracy)?;
        writeln!(f, "*       MacroAccuracy:    {:.3}", self.macro_accuracy)?;
        writeln!(f, "*       LogLoss:          {:.3}", self.log_loss)?;
        writeln!(f, "*       LogLossReduction: {:.3}", self.log_loss_reduction)?;
        writeln!(
            f,
            "*       Top{}Accuracy:     {:.3}",
            self.top_k, self.top_k_accuracy
        )?;
        write!(f, "{rule}")
    }
}

/// Run a labeled frame through the model and score its predictions
pub fn evaluate(model: &FittedPipeline, data: Frame, top_k: usize) -> Result<MulticlassMetrics> {
    if !data.contains(columns::AREA) {
        return Err(Error::Evaluation(format!(
            "the test set has no {:?} column",
            columns::AREA
        )));
    }

    let frame = model.transform(data)?;

    let (truth, labels) = frame.keys(columns::LABEL)?;
    let scores = frame.scores(columns::SCORE)?;

    let metrics = compute(truth, scores, labels, top_k)?;

    info!(
        "Evaluated {} rows: micro-accuracy {:.4}, log-loss {:.4}",
        metrics.rows, metrics.micro_accuracy, metrics.log_loss
    );

    Ok(metrics)
}

/// Compute metrics from true keys and per-class scores.
///
/// Rows with a missing key are skipped; at least one row must remain.
pub fn compute(
    truth: &[Option<u32>],
    scores: &[Vec<f32>],
    labels: &[String],
    top_k: usize,
) -> Result<MulticlassMetrics> {
    let n_classes = labels.len();

    let mut confusion_matrix = ConfusionMatrix::new(labels.to_vec());
    let mut class_rows = vec![0usize; n_classes];
    let mut class_log_loss = vec![0.0f64; n_classes];

    let mut rows = 0;
    let mut skipped = 0;
    let mut correct = 0;
    let mut top_k_correct = 0;
    let mut log_loss = 0.0;

    for (key, row) in truth.iter().zip(scores) {
        let Some(key) = key else {
            skipped += 1;
            continue;
        };
        let key = *key as usize;

        if key >= n_classes || row.len() != n_classes {
            return Err(Error::Evaluation(format!(
                "label key {} does not fit {} scores over {} classes",
                key,
                row.len(),
                n_classes
            )));
        }

        let predicted = argmax(row).unwrap_or_default();
        confusion_matrix.counts[key][predicted] += 1;

        if predicted == key {
            correct += 1;
        }

        // Ties rank the lower key first, matching the argmax
        let truth_score = row[key];
        let rank = row
            .iter()
            .enumerate()
            .filter(|(class, score)| {
                **score > truth_score || (**score == truth_score && *class < key)
            })
            .count();

        if rank < top_k {
            top_k_correct += 1;
        }

        let p = (truth_score as f64).clamp(LOG_LOSS_EPSILON, 1.0);
        log_loss -= p.ln();
        class_log_loss[key] -= p.ln();
        class_rows[key] += 1;
        rows += 1;
    }

    if skipped > 0 {
        warn!(
            "Skipped {} rows whose label was not seen during training",
            skipped
        );
    }

    if rows == 0 {
        return Err(Error::Evaluation(
            "there are no labeled rows to evaluate".to_string(),
        ));
    }

    let present: Vec<usize> = (0..n_classes).filter(|c| class_rows[*c] > 0).collect();

    let macro_accuracy = present
        .iter()
        .map(|c| confusion_matrix.counts[*c][*c] as f64 / class_rows[*c] as f64)
        .sum::<f64>()
        / present.len() as f64;

    let log_loss = log_loss / rows as f64;

    let prior: f64 = present
        .iter()
        .map(|c| {
            let p = class_rows[*c] as f64 / rows as f64;
            -p * p.ln()
        })
        .sum();

    let log_loss_reduction = if prior > 0.0 {
        (prior - log_loss) / prior
    } else {
        0.0
    };

    let per_class_log_loss = class_log_loss
        .iter()
        .zip(&class_rows)
        .map(|(sum, count)| {
            if *count > 0 {
                sum / *count as f64
            } else {
                0.0
            }
        })
        .collect();

    Ok(MulticlassMetrics {
        micro_accuracy: correct as f64 / rows as f64,
        macro_accuracy,
        log_loss,
        log_loss_reduction,
        top_k,
        top_k_accuracy: top_k_correct as f64 / rows as f64,
        per_class_log_loss,
        confusion_matrix,
        rows,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    fn labels() -> Vec<String> {
        vec!["bug".to_string(), "docs".to_string()]
    }

    #[test]
    fn computes_accuracies_and_log_loss() -> Result<()> {
        let truth = vec![Some(0), Some(0), Some(1), None];
        let scores = vec![
            vec![0.9, 0.1],
            vec![0.4, 0.6],
            vec![0.2, 0.8],
            vec![0.5, 0.5],
        ];

        let metrics = compute(&truth, &scores, &labels(), 1)?;

        assert_eq!(metrics.rows, 3);
        assert_eq!(metrics.skipped, 1);
        assert!(close(metrics.micro_accuracy, 2.0 / 3.0));
        assert!(close(metrics.macro_accuracy, 0.75));
        assert!(close(metrics.top_k_accuracy, metrics.micro_accuracy));

        let expected = -((0.9f32 as f64).ln() + (0.4f32 as f64).ln() + (0.8f32 as f64).ln()) / 3.0;
        assert!(close(metrics.log_loss, expected));

        let prior = -(2.0 / 3.0 * (2.0f64 / 3.0).ln() + 1.0 / 3.0 * (1.0f64 / 3.0).ln());
        assert!(close(metrics.log_loss_reduction, (prior - expected) / prior));

        assert_eq!(metrics.confusion_matrix.counts, vec![vec![1, 1], vec![0, 1]]);
        assert_eq!(metrics.confusion_matrix.precision(0), Some(1.0));
        assert_eq!(metrics.confusion_matrix.recall(0), Some(0.5));

        Ok(())
    }

    #[test]
    fn top_k_counts_near_misses() -> Result<()> {
        let metrics = compute(&[Some(1)], &[vec![0.7, 0.3]], &labels(), 2)?;

        assert!(close(metrics.micro_accuracy, 0.0));
        assert!(close(metrics.top_k_accuracy, 1.0));

        Ok(())
    }

    #[test]
    fn certain_predictions_have_zero_log_loss() -> Result<()> {
        let metrics = compute(&[Some(0), Some(0)], &[vec![1.0], vec![1.0]], &labels()[..1], 1)?;

        assert!(close(metrics.log_loss, 0.0));
        assert!(close(metrics.log_loss_reduction, 0.0));
        assert!(close(metrics.macro_accuracy, 1.0));

        Ok(())
    }

    #[test]
    fn nothing_to_evaluate_is_an_error() {
        assert!(matches!(
            compute(&[None], &[vec![0.5, 0.5]], &labels(), 1),
            Err(Error::Evaluation(_))
        ));
        assert!(matches!(
            compute(&[], &[], &labels(), 1),
            Err(Error::Evaluation(_))
        ));
    }

    #[test]
    fn renders_the_metrics_block() -> Result<()> {
        let metrics = compute(&[Some(0)], &[vec![0.5, 0.5]], &labels(), 1)?;
        let block = metrics.to_string();

        assert!(block.contains("*       MicroAccuracy:    1.000"));
        assert!(block.contains("*       LogLoss:          0.693"));

        Ok(())
    }
}
