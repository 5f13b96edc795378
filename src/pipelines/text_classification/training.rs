use std::time::Instant;

use log::info;

use crate::error::{Error, Result};

use super::{EstimatorChain, FittedPipeline, Frame};

/// Fit a declared pipeline on the training frame.
///
/// Training only learns state: it performs no predictions and no I/O, so the same frame, chain
/// and seeds always give the same fitted pipeline.
pub fn train(pipeline: &EstimatorChain, data: Frame) -> Result<FittedPipeline> {
    if data.rows() == 0 {
        return Err(Error::Training("the training set has no rows".to_string()));
    }

    info!(
        "Fitting {} stages on {} rows",
        pipeline.stages().len(),
        data.rows()
    );

    let start = Instant::now();
    let model = pipeline.fit(data)?;

    info!("Training finished in {:.2?}", start.elapsed());

    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipelines::text_classification::{builder, FeaturizerConfig};

    #[test]
    fn empty_frame_is_rejected() {
        let chain = builder::feature_pipeline(&FeaturizerConfig::new());

        assert!(matches!(
            train(&chain, Frame::new(0)),
            Err(Error::Training(_))
        ));
    }
}
