use clap::{Arg, ArgMatches, Command};
use housecast::{Error, HousecastConfig, PriceEngine};
use serde_json::json;

/// Housecast administrative CLI.
///
/// Mirrors the operations the serving layer exposes: trigger a training
/// run, estimate a price, and report the latest training status.

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let matches = create_cli().get_matches();
    if let Err(e) = run_command(matches) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn create_cli() -> Command {
    Command::new("housecast-cli")
        .about("Housecast model lifecycle administration")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("train")
                .about("Train on a dataset and publish a new model version")
                .arg(Arg::new("store").help("Model store root").required(true).index(1))
                .arg(
                    Arg::new("dataset")
                        .help("Training CSV path")
                        .long("dataset")
                        .default_value("data/houses.csv"),
                ),
        )
        .subcommand(
            Command::new("predict")
                .about("Estimate a price for one house")
                .arg(Arg::new("store").help("Model store root").required(true).index(1))
                .arg(Arg::new("size").long("size").required(true))
                .arg(Arg::new("bedrooms").long("bedrooms").required(true))
                .arg(Arg::new("age").long("age").required(true)),
        )
        .subcommand(
            Command::new("status")
                .about("Show the latest training run")
                .arg(Arg::new("store").help("Model store root").required(true).index(1)),
        )
}

fn open_engine(store_root: &str, dataset: Option<&str>) -> Result<PriceEngine, Error> {
    let mut config = HousecastConfig::default();
    config.store_root = store_root.into();
    if let Some(dataset) = dataset {
        config.dataset_path = dataset.into();
    }
    PriceEngine::open(config)
}

fn run_command(matches: ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    match matches.subcommand() {
        Some(("train", sub)) => {
            let store = sub.get_one::<String>("store").unwrap();
            let dataset = sub.get_one::<String>("dataset").unwrap();
            let engine = open_engine(store, Some(dataset))?;
            let outcome = engine.retrain()?;
            println!(
                "published version {} (rows={}, mae={:.2}, r2={:.4})",
                outcome.version, outcome.metrics.rows, outcome.metrics.mae, outcome.metrics.r2
            );
            Ok(())
        }
        Some(("predict", sub)) => {
            let store = sub.get_one::<String>("store").unwrap();
            let engine = open_engine(store, None)?;
            // values pass through as strings; the schema layer coerces them
            let input = json!({
                "size": sub.get_one::<String>("size").unwrap(),
                "bedrooms": sub.get_one::<String>("bedrooms").unwrap(),
                "age": sub.get_one::<String>("age").unwrap(),
            });
            match engine.predict(&input) {
                Ok(price) => {
                    println!("estimated price: {price:.2}");
                    Ok(())
                }
                Err(Error::ModelNotTrained) => {
                    eprintln!("model not trained yet; run `housecast-cli train` first");
                    std::process::exit(2);
                }
                Err(e) => Err(e.into()),
            }
        }
        Some(("status", sub)) => {
            let store = sub.get_one::<String>("store").unwrap();
            let engine = open_engine(store, None)?;
            match engine.status()? {
                Some(run) => println!(
                    "trained: version {} at {} (rows={}, mae={:.2}, r2={:.4})",
                    run.version, run.created_at, run.dataset_rows, run.mae, run.r2_score
                ),
                None => println!("not trained"),
            }
            Ok(())
        }
        _ => unreachable!(),
    }
}
