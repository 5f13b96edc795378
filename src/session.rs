//! The end to end experiment: load, build, train, evaluate, save, reload and predict

use std::path::{Path, PathBuf};

use burn::config::Config as _;
use lazy_static::lazy_static;
use log::info;

use crate::{
    datasets::{Issue, IssueDataset},
    error::Result,
    models::maximum_entropy::ClassifierConfig,
    pipelines::text_classification::{
        builder, evaluate, persistence, train, FeaturizerConfig, MulticlassMetrics, Prediction,
        PredictionEngine,
    },
};

lazy_static! {
    /// Issues classified with the reloaded model at the end of a run
    pub static ref SAMPLE_ISSUES: Vec<Issue> = vec![
        Issue::unlabeled(
            "Threads are failed",
            "When i am use Threads my variables null take strong and not fail to crash.",
        ),
        Issue::unlabeled(
            "Entity Framework crashes",
            "When connecting to the database, EF is crashing",
        ),
    ];
}

/// Experiment settings
#[derive(burn::config::Config, Debug)]
pub struct ExperimentConfig {
    /// Labeled training set
    #[config(default = "\"data/issues_train.tsv\".to_string()")]
    pub train_path: String,

    /// Labeled test set
    #[config(default = "\"data/issues_test.tsv\".to_string()")]
    pub test_path: String,

    /// Where to save the model; the recorder appends `.mpk`
    #[config(default = "\"models/model\".to_string()")]
    pub model_path: String,

    /// Text featurization settings
    #[config(default = "FeaturizerConfig::new()")]
    pub featurizer: FeaturizerConfig,

    /// Classifier training settings
    #[config(default = "ClassifierConfig::new()")]
    pub classifier: ClassifierConfig,

    /// The `k` of the reported top-k accuracy
    #[config(default = 5)]
    pub top_k: usize,

    /// Also write these settings to `config.json` beside the model
    #[config(default = false)]
    pub save_config: bool,
}

/// Everything a run produced
#[derive(Debug)]
pub struct Report {
    /// Metrics on the test set
    pub metrics: MulticlassMetrics,

    /// Where the model was saved
    pub model_path: PathBuf,

    /// Each sample issue with the reloaded model's prediction
    pub predictions: Vec<(Issue, Prediction)>,
}

/// Run the whole experiment once, top to bottom
pub fn run(config: &ExperimentConfig) -> Result<Report> {
    let training = IssueDataset::load_labeled(&config.train_path)?;
    let test = IssueDataset::load_labeled(&config.test_path)?;

    let data = training.to_frame();
    let schema = data.schema();

    let pipeline = builder::training_pipeline(
        builder::feature_pipeline(&config.featurizer),
        &config.classifier,
    );

    let model = train(&pipeline, data)?;
    let metrics = evaluate(&model, test.to_frame(), config.top_k)?;

    info!("Test metrics:\n{}", metrics);

    let model_path = persistence::save(&model, &schema, Path::new(&config.model_path))?;
    if config.save_config {
        save_config(config, &model_path)?;
    }

    // Predictions come from the reloaded artifact, not the in-memory model
    drop(model);
    let (model, schema) = persistence::load(&model_path)?;
    let engine = PredictionEngine::with_schema(model, &schema);

    let predictions = SAMPLE_ISSUES
        .iter()
        .map(|issue| Ok((issue.clone(), engine.predict_issue(issue)?)))
        .collect::<Result<Vec<_>>>()?;

    Ok(Report {
        metrics,
        model_path,
        predictions,
    })
}

/// Save the experiment settings next to the model
fn save_config(config: &ExperimentConfig, model_path: &Path) -> Result<()> {
    let path = model_path.with_file_name("config.json");

    config.save(&path)?;

    info!("Saved the experiment config to {}", path.display());

    Ok(())
}
