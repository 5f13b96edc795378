use burn::LearningRate;

/// Maximum entropy classifier training settings
#[derive(burn::config::Config, Debug)]
pub struct ClassifierConfig {
    /// Number of passes over the training rows
    #[config(default = 10)]
    pub num_epochs: usize,

    /// Rows per optimization step
    #[config(default = 64)]
    pub batch_size: usize,

    /// Adam learning rate
    #[config(default = 5e-2)]
    pub learning_rate: LearningRate,

    /// Adam epsilon
    #[config(default = 1e-8)]
    pub adam_epsilon: f32,

    /// Seed for the per-epoch row shuffle
    #[config(default = 0)]
    pub seed: u64,

    /// L2 weight decay penalty
    pub l2_penalty: Option<f64>,
}
