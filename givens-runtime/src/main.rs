use anyhow::{anyhow, Context, Result};
use clap::{arg, ArgAction, ArgMatches, Command};
use givens_classifier::{
    dataset::mnist::load_mnist,
    network::{Network, NetworkOptions},
    train_classifier,
    training::validate_config,
};
use givens_structs::{
    config::{Nonlinearity, RunConfig},
    core::EvalRecord,
};
use givens_utils::{compress_obj, dejsonify, jsonify};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("givens-runtime")
        .about("Trains and inspects Givens rotation digit classifiers")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("train")
                .about("Downloads MNIST if needed, then trains and evaluates a classifier")
                .arg(
                    arg!([SETTINGS] "Settings json string or path to json file")
                        .default_value("{}")
                        .value_parser(clap::value_parser!(String)),
                )
                .arg(
                    arg!(--seed [SEED] "Overrides the random seed")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    arg!(--steps [STEPS] "Overrides the number of training steps")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--digits [DIGITS] "Comma separated digits to keep, e.g. 6,9")
                        .value_delimiter(',')
                        .value_parser(clap::value_parser!(u8)),
                )
                .arg(
                    arg!(--layers [LAYERS] "Comma separated output size of every layer, e.g. 4,2")
                        .value_delimiter(',')
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--nonlinearity [NONLINEARITY] "One of sigmoid, selu, relu, tanh")
                        .value_parser(clap::value_parser!(String)),
                )
                .arg(
                    arg!(--"data-dir" [DATA_DIR] "Where the MNIST files are cached")
                        .value_parser(clap::value_parser!(String)),
                )
                .arg(
                    arg!(--output [OUTPUT_FILE] "If set, the run report will be saved to this file path (default json)")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(--compress [COMPRESS] "If output file is set, the run report will be compressed as zlib")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("wires")
                .about("Prints the rotation schedule of every layer")
                .arg(
                    arg!(<INPUT_DIM> "Width of the network input")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(<LAYERS> "Comma separated output size of every layer, e.g. 4,2")
                        .value_delimiter(',')
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--bias [BIAS] "Count a bias per output coordinate")
                        .action(ArgAction::SetTrue),
                ),
        )
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().get_matches();

    if let Err(e) = match matches.subcommand() {
        Some(("train", sub_m)) => train(sub_m),
        Some(("wires", sub_m)) => wires(
            sub_m.get_one::<usize>("INPUT_DIM").copied().unwrap_or_default(),
            sub_m
                .get_many::<usize>("LAYERS")
                .map(|v| v.copied().collect())
                .unwrap_or_default(),
            sub_m.get_flag("bias"),
        ),
        _ => Err(anyhow!("Invalid subcommand")),
    } {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn train(sub_m: &ArgMatches) -> Result<()> {
    let mut config = load_settings(
        sub_m
            .get_one::<String>("SETTINGS")
            .map(String::as_str)
            .unwrap_or("{}"),
    )?;
    if let Some(seed) = sub_m.get_one::<u64>("seed") {
        config.seed = *seed;
    }
    if let Some(steps) = sub_m.get_one::<usize>("steps") {
        config.train_steps = *steps;
    }
    if let Some(digits) = sub_m.get_many::<u8>("digits") {
        config.digits = Some(digits.copied().collect());
    }
    if let Some(layers) = sub_m.get_many::<usize>("layers") {
        config.output_sizes = layers.copied().collect();
    }
    if let Some(nonlinearity) = sub_m.get_one::<String>("nonlinearity") {
        config.nonlinearity = nonlinearity.parse::<Nonlinearity>().map_err(|e| anyhow!(e))?;
    }
    if let Some(data_dir) = sub_m.get_one::<String>("data-dir") {
        config.data_dir = data_dir.clone();
    }
    validate_config(&config)?;
    info!("settings: {}", jsonify(&config)?);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let dataset = runtime.block_on(load_mnist(
        Path::new(&config.data_dir),
        &config.base_url,
        config.digits.as_deref(),
    ))?;

    let report = train_classifier(&config, dataset, &mut |record: &EvalRecord| {
        println!("{}", record)
    })?;
    println!(
        "Final test accuracy after {} steps: {:.3}.",
        report.steps_completed, report.final_test_accuracy
    );

    if let Some(path) = sub_m.get_one::<PathBuf>("output") {
        if sub_m.get_flag("compress") {
            fs::write(path, compress_obj(&report)?)?;
        } else {
            fs::write(path, jsonify(&report)?)?;
        }
        info!("report written to {}", path.display());
    }
    Ok(())
}

fn wires(input_dim: usize, layers: Vec<usize>, with_bias: bool) -> Result<()> {
    let options = NetworkOptions {
        with_bias,
        ..NetworkOptions::from(&RunConfig::default())
    };
    let network = Network::new(input_dim, &layers, &options)?;
    for (l, layer) in network.layers().iter().enumerate() {
        println!(
            "Layer {}: {} -> {}, {} rotations, {} parameters",
            l,
            layer.dim,
            layer.size,
            layer.schedule.len(),
            layer.num_parameters()
        );
        let pairs: Vec<String> = layer.schedule.iter().map(|w| w.to_string()).collect();
        println!("  {}", pairs.join(" "));
    }
    println!("Total parameters: {}", network.num_parameters());
    Ok(())
}

fn load_settings(settings: &str) -> Result<RunConfig> {
    let settings = if settings.ends_with(".json") {
        fs::read_to_string(settings)
            .with_context(|| format!("Failed to read settings file: {}", settings))?
    } else {
        settings.to_string()
    };

    dejsonify::<RunConfig>(&settings).context("Failed to parse settings")
}
