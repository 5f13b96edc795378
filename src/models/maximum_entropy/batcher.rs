use burn::{
    data::dataloader,
    tensor::{backend::Backend, Int, Tensor},
};
use derive_new::new;

use crate::{pipelines::text_classification::SparseVector, utils::tensors};

/// A training batch for the maximum entropy classifier
#[derive(Clone, Debug, new)]
pub struct Train<B: Backend> {
    /// Dense feature rows: [batch_size, n_features]
    pub features: Tensor<B, 2>,

    /// Class ids for the batch
    pub targets: Tensor<B, 1, Int>,
}

/// Struct for batching cached feature rows with their class keys
#[derive(Clone, Debug, new)]
pub struct Batcher<B: Backend> {
    /// Width of every dense row
    pub n_features: usize,

    /// Device on which to perform computation
    pub device: B::Device,
}

/// Implement Batcher trait for Batcher struct for training
impl<B: Backend> dataloader::batcher::Batcher<(SparseVector, u32), Train<B>> for Batcher<B> {
    /// Densifies sparse rows and collects their keys into a training batch
    fn batch(&self, items: Vec<(SparseVector, u32)>) -> Train<B> {
        let rows: Vec<&SparseVector> = items.iter().map(|(row, _)| row).collect();
        let keys: Vec<u32> = items.iter().map(|(_, key)| *key).collect();

        Train {
            features: tensors::densify::<B>(&rows, self.n_features, &self.device),
            targets: tensors::targets::<B>(&keys, &self.device),
        }
    }
}
