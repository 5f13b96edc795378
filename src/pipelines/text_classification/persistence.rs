use std::{
    fs,
    path::{Path, PathBuf},
};

use burn::{
    backend::{ndarray::NdArrayDevice, NdArray},
    record::{CompactRecorder, FileRecorder, PrecisionSettings, Record, Recorder},
    tensor::backend::Backend,
};
use log::info;
use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::{FittedPipeline, Schema};

/// What a saved model holds: the fitted pipeline and the input schema it was trained on
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Input columns the pipeline was fitted on
    pub schema: Schema,

    /// Every fitted stage
    pub pipeline: FittedPipeline,
}

impl<B: Backend> Record<B> for ModelArtifact {
    type Item<S: PrecisionSettings> = ModelArtifact;

    fn into_item<S: PrecisionSettings>(self) -> Self::Item<S> {
        self
    }

    fn from_item<S: PrecisionSettings>(item: Self::Item<S>, _device: &B::Device) -> Self {
        item
    }
}

/// Extension the compact recorder gives every artifact
pub fn artifact_extension() -> &'static str {
    <CompactRecorder as FileRecorder<NdArray>>::file_extension()
}

/// The file the recorder reads and writes for `path`.
///
/// The extension is appended, never substituted, so `run.1` and `run.2` stay distinct. A path
/// that already ends with the extension is kept as is.
pub fn artifact_path(path: &Path) -> PathBuf {
    let extension = artifact_extension();

    if path.extension().is_some_and(|ext| ext == extension) {
        return path.to_path_buf();
    }

    let mut file = path.as_os_str().to_os_string();
    file.push(".");
    file.push(extension);

    PathBuf::from(file)
}

/// Save a fitted pipeline with its input schema, returning the written path
pub fn save(model: &FittedPipeline, schema: &Schema, path: &Path) -> Result<PathBuf> {
    let target = artifact_path(path);

    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let artifact = ModelArtifact {
        schema: schema.clone(),
        pipeline: model.clone(),
    };

    <CompactRecorder as Recorder<NdArray>>::record(
        &CompactRecorder::new(),
        artifact,
        target.clone(),
    )?;

    info!("Saved the model to {}", target.display());

    Ok(target)
}

/// Load a fitted pipeline and its input schema
pub fn load(path: &Path) -> Result<(FittedPipeline, Schema)> {
    let target = artifact_path(path);

    let artifact: ModelArtifact = <CompactRecorder as Recorder<NdArray>>::load(
        &CompactRecorder::new(),
        target.clone(),
        &NdArrayDevice::Cpu,
    )?;

    artifact.pipeline.validate()?;

    info!("Loaded the model from {}", target.display());

    Ok((artifact.pipeline, artifact.schema))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::*;
    use crate::{
        error::Error,
        models::maximum_entropy::Weights,
        pipelines::text_classification::{ColumnKind, LabelVocabulary, SchemaColumn, Transformer},
    };

    fn model() -> FittedPipeline {
        FittedPipeline::new(vec![
            Transformer::Cache,
            Transformer::DecodeLabel {
                column: "PredictedLabel".to_string(),
                vocabulary: LabelVocabulary::from_labels(vec!["area-mvc".to_string()]),
            },
        ])
    }

    fn schema() -> Schema {
        Schema(vec![SchemaColumn::new("Title", ColumnKind::Text)])
    }

    #[test]
    fn artifact_path_appends_the_extension_once() {
        assert_eq!(artifact_extension(), "mpk");
        assert_eq!(
            artifact_path(Path::new("models/model")),
            PathBuf::from("models/model.mpk")
        );
        assert_eq!(
            artifact_path(Path::new("models/model.mpk")),
            PathBuf::from("models/model.mpk")
        );
        assert_eq!(
            artifact_path(Path::new("models/run.1")),
            PathBuf::from("models/run.1.mpk")
        );
    }

    #[test]
    fn dotted_paths_do_not_collide() -> Result<()> {
        let dir = tempdir()?;
        let second = FittedPipeline::new(vec![Transformer::DecodeLabel {
            column: "PredictedLabel".to_string(),
            vocabulary: LabelVocabulary::from_labels(vec!["area-infra".to_string()]),
        }]);

        let a = save(&model(), &schema(), &dir.path().join("run.1"))?;
        let b = save(&second, &schema(), &dir.path().join("run.2"))?;

        assert_ne!(a, b);
        assert!(a.exists() && b.exists());
        assert_eq!(load(&dir.path().join("run.1"))?.0, model());
        assert_eq!(load(&dir.path().join("run.2"))?.0, second);

        Ok(())
    }

    #[test]
    fn inconsistent_weights_are_a_record_error() -> Result<()> {
        let dir = tempdir()?;
        let broken = FittedPipeline::new(vec![Transformer::Classify {
            features: "Features".to_string(),
            score: "Score".to_string(),
            predicted: "PredictedLabel".to_string(),
            vocabulary: LabelVocabulary::from_labels(vec!["a".to_string(), "b".to_string()]),
            weights: Weights {
                n_features: 4,
                n_classes: 2,
                weight: vec![0.0; 2],
                bias: vec![0.0; 2],
            },
        }]);

        let path = save(&broken, &schema(), &dir.path().join("broken"))?;

        assert!(matches!(load(&path), Err(Error::Record(_))));

        Ok(())
    }

    #[test]
    fn save_then_load_round_trips() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join("model");

        let written = save(&model(), &schema(), &path)?;
        assert!(written.exists());
        assert_eq!(written, dir.path().join("nested").join("model.mpk"));

        let (loaded, loaded_schema) = load(&written)?;

        assert_eq!(loaded, model());
        assert_eq!(loaded_schema, schema());

        Ok(())
    }

    #[test]
    fn saving_twice_writes_identical_bytes() -> Result<()> {
        let dir = tempdir()?;

        let first = save(&model(), &schema(), &dir.path().join("first"))?;
        let second = save(&model(), &schema(), &dir.path().join("second"))?;

        assert_eq!(fs::read(first)?, fs::read(second)?);

        Ok(())
    }

    #[test]
    fn missing_artifact_is_a_record_error() -> Result<()> {
        let dir = tempdir()?;

        assert!(matches!(
            load(&dir.path().join("absent")),
            Err(Error::Record(_))
        ));

        Ok(())
    }
}
