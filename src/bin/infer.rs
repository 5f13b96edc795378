//! Command line tool to classify one issue with a saved model

use std::path::Path;

use anyhow::{anyhow, Result};
use issue_classifier::{
    datasets::Issue,
    pipelines::text_classification::{persistence, PredictionEngine},
};
use pico_args::Arguments;

const HELP: &str = "\
Usage: infer [OPTIONS] TITLE DESCRIPTION

Arguments:
  TITLE                The issue title
  DESCRIPTION          The issue description

Options:
  -h, --help           Print help
  -m, --model          The saved model (defaults to 'models/model')
  -k, --top            How many areas to list (defaults to 3)
";

#[derive(Debug)]
struct Args {
    /// Prints the usage menu
    help: bool,

    /// The saved model
    model: Option<String>,

    /// How many areas to list
    top: Option<usize>,

    /// The issue title
    title: String,

    /// The issue description
    description: String,
}

fn parse_args() -> Result<Args, pico_args::Error> {
    let mut pargs = Arguments::from_env();

    let help = pargs.contains(["-h", "--help"]);
    if help {
        return Ok(Args {
            help,
            model: None,
            top: None,
            title: String::new(),
            description: String::new(),
        });
    }

    let args = Args {
        help,
        model: pargs.opt_value_from_str(["-m", "--model"])?,
        top: pargs.opt_value_from_str(["-k", "--top"])?,
        title: pargs.free_from_str()?,
        description: pargs.free_from_str()?,
    };

    Ok(args)
}

fn main() -> Result<()> {
    pretty_env_logger::init();

    let args = parse_args().map_err(|e| match e {
        pico_args::Error::MissingArgument => anyhow!("Missing required arguments: TITLE DESCRIPTION"),
        _ => anyhow!("{}", e),
    })?;

    if args.help {
        println!("{}", HELP);
        return Ok(());
    }

    let model_path = args.model.unwrap_or_else(|| "models/model".to_string());

    let (model, schema) = persistence::load(Path::new(&model_path))?;
    log::debug!("Model input columns: {:?}", schema.names().collect::<Vec<_>>());

    let engine = PredictionEngine::with_schema(model, &schema);
    let prediction = engine.predict_issue(&Issue::unlabeled(&args.title, &args.description))?;

    println!(
        "\n=== Issue ===\
         \n- Title: {}\
         \n- Description: {}\
         \n- Area: {}\
         \n=============",
        args.title, args.description, prediction.area
    );

    for (area, score) in prediction.top(args.top.unwrap_or(3)) {
        println!("{:>8.4}  {}", score, area);
    }

    Ok(())
}
