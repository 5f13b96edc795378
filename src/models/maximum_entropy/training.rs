use burn::{
    data::{dataloader::DataLoaderBuilder, dataset::InMemDataset},
    module::AutodiffModule,
    optim::{decay::WeightDecayConfig, AdamConfig, GradientsParams, Optimizer},
    tensor::{backend::AutodiffBackend, ElementConversion},
};
use log::{debug, info};

use crate::{
    error::{Error, Result},
    pipelines::text_classification::SparseVector,
};

use super::{Batcher, ClassifierConfig, Model, Weights};

/// Fit a maximum entropy classifier on cached feature rows.
///
/// `targets[i]` is the class key of `features[i]`. Rows are visited in a fresh seeded shuffle
/// every epoch, so the same inputs and config always produce the same weights.
pub fn train<B: AutodiffBackend>(
    device: &B::Device,
    features: &[SparseVector],
    targets: &[u32],
    n_classes: usize,
    config: &ClassifierConfig,
) -> Result<Weights> {
    if features.is_empty() {
        return Err(Error::Training("the training set has no rows".to_string()));
    }

    if features.len() != targets.len() {
        return Err(Error::Training(format!(
            "{} feature rows but {} labels",
            features.len(),
            targets.len()
        )));
    }

    if n_classes == 0 {
        return Err(Error::Training("no class labels were observed".to_string()));
    }

    let n_features = features[0].dim;
    if n_features == 0 {
        return Err(Error::Training(
            "featurization produced an empty vocabulary".to_string(),
        ));
    }

    if let Some(row) = features.iter().find(|row| row.dim != n_features) {
        return Err(Error::Training(format!(
            "feature rows disagree on dimension: {} and {}",
            n_features, row.dim
        )));
    }

    if let Some(key) = targets.iter().find(|key| **key as usize >= n_classes) {
        return Err(Error::Training(format!(
            "label key {} is outside the {} known classes",
            key, n_classes
        )));
    }

    info!(
        "Training maximum entropy classifier: {} rows, {} features, {} classes",
        features.len(),
        n_features,
        n_classes
    );

    let mut model: Model<B> = Model::new(n_features, n_classes, device);

    // Initialize optimizer
    let mut optimizer = AdamConfig::new()
        .with_epsilon(config.adam_epsilon)
        .with_weight_decay(config.l2_penalty.map(WeightDecayConfig::new))
        .init::<B, Model<B>>();

    let items: Vec<(SparseVector, u32)> = features
        .iter()
        .cloned()
        .zip(targets.iter().copied())
        .collect();

    // Rows are reshuffled every epoch from the seeded loader
    let dataloader = DataLoaderBuilder::new(Batcher::<B>::new(n_features, device.clone()))
        .batch_size(config.batch_size.max(1))
        .shuffle(config.seed)
        .build(InMemDataset::new(items));

    for epoch in 1..=config.num_epochs {
        let mut total_loss = 0.0;
        let mut batches = 0;

        for batch in dataloader.iter() {
            // Run forward pass, calculate gradients and step the optimizer
            let output = model.forward(batch.features, batch.targets);
            total_loss += output.loss.clone().into_scalar().elem::<f64>();
            batches += 1;

            let grads = output.loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);

            model = optimizer.step(config.learning_rate, model, grads);
        }

        debug!(
            "Epoch {}/{}: mean loss {:.5}",
            epoch,
            config.num_epochs,
            total_loss / batches as f64
        );
    }

    Ok(model.valid().weights())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{models::maximum_entropy::TrainingBackend, utils::classes::argmax};

    fn one_hot(dim: usize, index: u32) -> SparseVector {
        SparseVector::new(dim, vec![index], vec![1.0])
    }

    #[test]
    fn separable_rows_are_learned() -> Result<()> {
        let features = vec![one_hot(3, 0), one_hot(3, 1), one_hot(3, 2), one_hot(3, 0)];
        let targets = vec![0, 1, 2, 0];
        let config = ClassifierConfig::new().with_num_epochs(30).with_batch_size(2);

        let weights =
            train::<TrainingBackend>(&Default::default(), &features, &targets, 3, &config)?;

        for (row, target) in features.iter().zip(&targets) {
            assert_eq!(argmax(&weights.scores(row)), Some(*target as usize));
        }

        Ok(())
    }

    #[test]
    fn same_seed_same_weights() -> Result<()> {
        let features = vec![one_hot(2, 0), one_hot(2, 1), one_hot(2, 1)];
        let targets = vec![1, 0, 0];
        let config = ClassifierConfig::new().with_num_epochs(3).with_batch_size(1);

        let a = train::<TrainingBackend>(&Default::default(), &features, &targets, 2, &config)?;
        let b = train::<TrainingBackend>(&Default::default(), &features, &targets, 2, &config)?;

        assert_eq!(a, b);

        Ok(())
    }

    #[test]
    fn trains_with_an_l2_penalty() -> Result<()> {
        let features = vec![one_hot(2, 0), one_hot(2, 1)];
        let targets = vec![0, 1];
        let config = ClassifierConfig::new()
            .with_num_epochs(20)
            .with_l2_penalty(Some(1e-4));

        let weights =
            train::<TrainingBackend>(&Default::default(), &features, &targets, 2, &config)?;

        assert_eq!(weights.weight.len(), 4);
        assert!(weights.weight.iter().all(|v| v.is_finite()));

        for (row, target) in features.iter().zip(&targets) {
            assert_eq!(argmax(&weights.scores(row)), Some(*target as usize));
        }

        Ok(())
    }

    #[test]
    fn empty_training_set_fails() {
        let result = train::<TrainingBackend>(
            &Default::default(),
            &[],
            &[],
            1,
            &ClassifierConfig::new(),
        );

        assert!(matches!(result, Err(Error::Training(_))));
    }
}
