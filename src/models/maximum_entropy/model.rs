use burn::{
    module::Module,
    nn::{loss::CrossEntropyLossConfig, Initializer, Linear, LinearConfig},
    tensor::{backend::Backend, Int, Tensor},
    train::ClassificationOutput,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    pipelines::text_classification::SparseVector,
    utils::classes::softmax_in_place,
};

/// A linear softmax classifier over dense feature rows
#[derive(Module, Debug)]
pub struct Model<B: Backend> {
    /// Feature to class-logit projection
    pub output: Linear<B>,

    /// Total number of classes
    pub n_classes: usize,
}

impl<B: Backend> Model<B> {
    /// A zero-initialized classifier
    pub fn new(n_features: usize, n_classes: usize, device: &B::Device) -> Self {
        let output = LinearConfig::new(n_features, n_classes)
            .with_initializer(Initializer::Zeros)
            .init(device);

        Self { output, n_classes }
    }

    /// Defines forward pass for training
    pub fn forward(&self, features: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> ClassificationOutput<B> {
        let output = self.output.forward(features);

        let loss = CrossEntropyLossConfig::new()
            .init(&output.device())
            .forward(output.clone(), targets.clone());

        ClassificationOutput {
            loss,
            output,
            targets,
        }
    }

    /// Copy the learned parameters out of the backend
    pub fn weights(&self) -> Weights {
        let weight = self.output.weight.val();
        let [n_features, n_classes] = weight.dims();

        let bias = match &self.output.bias {
            Some(bias) => bias.val().into_data().convert::<f32>().value,
            None => vec![0.0; n_classes],
        };

        Weights {
            n_features,
            n_classes,
            weight: weight.into_data().convert::<f32>().value,
            bias,
        }
    }
}

/// Learned classifier parameters, detached from any backend
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    /// Input dimension
    pub n_features: usize,

    /// Output dimension
    pub n_classes: usize,

    /// Row-major `[n_features, n_classes]` matrix
    pub weight: Vec<f32>,

    /// One bias per class
    pub bias: Vec<f32>,
}

impl Weights {
    /// Check that the parameter buffers match the declared shape
    pub fn validate(&self) -> Result<()> {
        if self.weight.len() != self.n_features * self.n_classes {
            return Err(Error::Record(format!(
                "weight has {} values, expected {} x {}",
                self.weight.len(),
                self.n_features,
                self.n_classes
            )));
        }

        if self.bias.len() != self.n_classes {
            return Err(Error::Record(format!(
                "bias has {} values, expected {}",
                self.bias.len(),
                self.n_classes
            )));
        }

        Ok(())
    }

    /// Class logits for a sparse feature vector
    pub fn logits(&self, features: &SparseVector) -> Vec<f32> {
        let mut logits = self.bias.clone();

        for (index, value) in features.iter() {
            if index >= self.n_features {
                continue;
            }

            let row = &self.weight[index * self.n_classes..(index + 1) * self.n_classes];
            for (logit, w) in logits.iter_mut().zip(row) {
                *logit += value * w;
            }
        }

        logits
    }

    /// Class probabilities for a sparse feature vector
    pub fn scores(&self, features: &SparseVector) -> Vec<f32> {
        let mut scores = self.logits(features);
        softmax_in_place(&mut scores);

        scores
    }
}
