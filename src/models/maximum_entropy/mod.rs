//! Multiclass maximum entropy (softmax regression) classifier trained with Burn

use burn::backend::{ndarray::NdArrayDevice, Autodiff, NdArray};

use crate::{error::Result, pipelines::text_classification::SparseVector};

/// Training settings
pub mod config;

/// Training batches
pub mod batcher;

/// The Burn module and its detached weights
pub mod model;

/// Training routine
pub mod training;

pub use batcher::Batcher;
pub use config::ClassifierConfig;
pub use model::{Model, Weights};
pub use training::train;

/// The backend classifier training runs on
pub type TrainingBackend = Autodiff<NdArray>;

/// Train on the CPU with the default backend
pub fn fit(
    features: &[SparseVector],
    targets: &[u32],
    n_classes: usize,
    config: &ClassifierConfig,
) -> Result<Weights> {
    train::<TrainingBackend>(&NdArrayDevice::Cpu, features, targets, n_classes, config)
}
