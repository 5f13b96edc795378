//! Command line tool to train, evaluate and save the issue classifier

use anyhow::anyhow;
use burn::config::Config as _;
use issue_classifier::session::{self, ExperimentConfig};
use pico_args::Arguments;

const HELP: &str = "\
Usage: train [OPTIONS]

Options:
  -h, --help           Print help
  -c, --config         Load experiment settings from a JSON file
  --train              The labeled training set (defaults to 'data/issues_train.tsv')
  --test               The labeled test set (defaults to 'data/issues_test.tsv')
  -m, --model          Where to save the model (defaults to 'models/model')
  -n, --epochs         Number of epochs to train for
  -s, --seed           Seed for the training shuffle
  --metrics            Also write the test metrics to a JSON file
  --save-config        Also write the effective settings to 'config.json' beside the model
";

#[derive(Debug)]
struct Args {
    config: Option<String>,
    train: Option<String>,
    test: Option<String>,
    model: Option<String>,
    epochs: Option<usize>,
    seed: Option<u64>,
    metrics: Option<String>,
    save_config: bool,
}

impl Args {
    fn parse() -> anyhow::Result<Option<Self>> {
        let mut pargs = Arguments::from_env();

        // Help has a higher priority and should be handled separately.
        if pargs.contains(["-h", "--help"]) {
            return Ok(None);
        }

        let args = Args {
            config: pargs.opt_value_from_str(["-c", "--config"])?,
            train: pargs.opt_value_from_str("--train")?,
            test: pargs.opt_value_from_str("--test")?,
            model: pargs.opt_value_from_str(["-m", "--model"])?,
            epochs: pargs.opt_value_from_str(["-n", "--epochs"])?,
            seed: pargs.opt_value_from_str(["-s", "--seed"])?,
            metrics: pargs.opt_value_from_str("--metrics")?,
            save_config: pargs.contains("--save-config"),
        };

        let remaining = pargs.finish();
        if !remaining.is_empty() {
            return Err(anyhow!("Unexpected arguments: {:?}", remaining));
        }

        Ok(Some(args))
    }

    fn into_config(self) -> anyhow::Result<ExperimentConfig> {
        let mut config = match &self.config {
            Some(path) => ExperimentConfig::load(path)
                .map_err(|e| anyhow!("Unable to load config file: {}", e))?,
            None => ExperimentConfig::new(),
        };

        if let Some(train) = self.train {
            config.train_path = train;
        }

        if let Some(test) = self.test {
            config.test_path = test;
        }

        if let Some(model) = self.model {
            config.model_path = model;
        }

        if let Some(epochs) = self.epochs {
            config.classifier.num_epochs = epochs;
        }

        if let Some(seed) = self.seed {
            config.classifier.seed = seed;
        }

        if self.save_config {
            config.save_config = true;
        }

        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let Some(args) = Args::parse()? else {
        print!("{}", HELP);

        return Ok(());
    };

    let metrics_path = args.metrics.clone();
    let config = args.into_config()?;
    let report = session::run(&config)?;

    println!("{}", report.metrics);
    log::debug!("Confusion matrix:\n{}", report.metrics.confusion_matrix);

    println!("Saved the model to {}", report.model_path.display());

    if let Some(path) = metrics_path {
        std::fs::write(&path, serde_json::to_string_pretty(&report.metrics)?)?;
        println!("Saved the metrics to {}", path);
    }

    let headings = ["Single Prediction", "Second Prediction"];
    for (index, (_, prediction)) in report.predictions.iter().enumerate() {
        let heading = headings.get(index).copied().unwrap_or("Prediction");

        println!(
            "=============== {} - Result: {} ===============",
            heading, prediction.area
        );
    }

    Ok(())
}
