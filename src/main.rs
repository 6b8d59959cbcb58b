use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::info;

use fta_rs::config::Config;
use fta_rs::error::Error;
use fta_rs::importance::ImportanceAnalyzer;
use fta_rs::input::load_inputs;
use fta_rs::probability::ProbabilityAnalyzer;
use fta_rs::report::Report;
use fta_rs::settings::Settings;
use fta_rs::uncertainty::UncertaintyAnalyzer;

#[derive(Parser)]
#[command(author, version, about = "Quantitative fault-tree analysis over minimal cut sets")]
struct Cli {
    /// Input files with basic events and minimal cut sets (JSON)
    #[arg(value_name = "FILE")]
    inputs: Vec<PathBuf>,

    /// Run configuration (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write the report here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    if color_eyre::install().is_err() {
        eprintln!("warning: failed to install the error report handler");
    }

    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => simplelog::LevelFilter::Warn,
        1 => simplelog::LevelFilter::Info,
        _ => simplelog::LevelFilter::Debug,
    };
    let _ = simplelog::TermLogger::init(
        level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(cli: Cli) -> Result<(), Error> {
    let (mut inputs, output_path, settings) = match cli.config {
        Some(path) => {
            let config = Config::from_file(path)?;
            (config.input_files, config.output_path, config.settings)
        }
        None => {
            // Without a configuration, report at least the probability.
            let mut settings = Settings::default();
            settings.probability_analysis(true);
            (Vec::new(), None, settings)
        }
    };
    inputs.extend(cli.inputs);
    if inputs.is_empty() {
        return Err(Error::Config { reason: "no input files".into() });
    }
    let output_path = cli.output.or(output_path);

    let (graph, cut_sets) = load_inputs(&inputs)?;
    info!("{} variables, {} minimal cut sets", graph.num_vars(), cut_sets.len());

    let mut report = Report::default();
    let mut prob = ProbabilityAnalyzer::new(&graph, cut_sets, &settings)?;

    if settings.is_probability_analysis() {
        prob.analyze()?;
        report.with_probability(&prob);
    }
    if settings.is_importance_analysis() {
        let mut importance = ImportanceAnalyzer::new(&mut prob);
        importance.analyze()?;
        report.with_importance(&importance);
    }
    if settings.is_uncertainty_analysis() {
        let mut uncertainty = UncertaintyAnalyzer::new(&mut prob);
        uncertainty.analyze()?;
        if let Some(result) = uncertainty.result() {
            report.with_uncertainty(result);
        }
    }

    match output_path {
        Some(path) => report.write(File::create(path)?)?,
        None => report.write(io::stdout().lock())?,
    }
    Ok(())
}
