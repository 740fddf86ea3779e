//! Larva death time prediction CLI
//!
//! Enter a mealworm larva's measurements and get the XGBoost model's
//! predicted time to death.

use clap::{Parser, Subcommand};
use larva::{Config, Feature, Result};

#[derive(Parser)]
#[command(name = "larva")]
#[command(about = "Larva death time predictor (XGBoost based, mealworms only)", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Predict time to death from measurements given as flags
    ///
    /// Omitted measurements are treated as missing.
    Predict {
        #[command(flatten)]
        measurements: Measurements,
        /// Mark a feature as missing even if a value was given (repeatable)
        #[arg(long, value_name = "FEATURE")]
        missing: Vec<Feature>,
        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
    /// Enter measurements one by one and predict, repeatedly
    Interactive,
    /// Model management commands
    Model {
        #[command(subcommand)]
        action: ModelCommands,
    },
    /// Write a default config file
    Init,
}

/// One flag per model input; values may be a number, `nan` or blank
#[derive(clap::Args)]
struct Measurements {
    /// Wt. (fresh)/g
    #[arg(long, value_name = "G", allow_hyphen_values = true)]
    weight: Option<String>,
    /// Weight Loss/g
    #[arg(long, value_name = "G", allow_hyphen_values = true)]
    weight_loss: Option<String>,
    /// Len/cm
    #[arg(long, value_name = "CM", allow_hyphen_values = true)]
    length: Option<String>,
    /// Initial M.C./%
    #[arg(long, value_name = "PCT", allow_hyphen_values = true)]
    initial_moisture: Option<String>,
    /// M.C. Loss/%
    #[arg(long, value_name = "PCT", allow_hyphen_values = true)]
    moisture_loss: Option<String>,
    /// Area-to-Volume Ratio
    #[arg(long, value_name = "RATIO", allow_hyphen_values = true)]
    area_to_volume: Option<String>,
    /// Death Temp (T1)/°C
    #[arg(long = "death-temp-t1", value_name = "C", allow_hyphen_values = true)]
    death_temp_t1: Option<String>,
    /// Death Temp (T2)/°C
    #[arg(long = "death-temp-t2", value_name = "C", allow_hyphen_values = true)]
    death_temp_t2: Option<String>,
}

impl Measurements {
    fn raw(&self, feature: Feature) -> Option<&str> {
        let value = match feature {
            Feature::Weight => &self.weight,
            Feature::WeightLoss => &self.weight_loss,
            Feature::Length => &self.length,
            Feature::InitialMoisture => &self.initial_moisture,
            Feature::MoistureLoss => &self.moisture_loss,
            Feature::AreaToVolume => &self.area_to_volume,
            Feature::DeathTempT1 => &self.death_temp_t1,
            Feature::DeathTempT2 => &self.death_temp_t2,
        };
        value.as_deref()
    }
}

#[derive(Subcommand)]
enum ModelCommands {
    /// Show model information
    Info,
}

#[derive(Clone, Debug)]
enum OutputFormat {
    Table,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use table or json.", s)),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load or create config
    let config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    let result = match cli.command {
        Commands::Predict {
            measurements,
            missing,
            format,
        } => commands::predict(&config, &measurements, &missing, format),
        Commands::Interactive => commands::interactive(&config),
        Commands::Model { action } => match action {
            ModelCommands::Info => commands::model_info(&config),
        },
        Commands::Init => commands::init(&cli.config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use larva::features::parse_value;
    use larva::predict::{format_outcome, run_prediction};
    use larva::{FeatureVector, LarvaError, Regressor, XgbRegressor};

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        println!("\nNext steps:");
        println!("  1. Copy your trained model to {}", config.model.path);
        println!("  2. Run 'larva predict --weight 0.5 --length 3.0 ...' to make a prediction");
        println!("  3. Or run 'larva interactive' to be prompted for each measurement");

        Ok(())
    }

    fn load_model(config: &Config) -> Result<XgbRegressor> {
        XgbRegressor::load(&config.model.path)
    }

    pub fn predict(
        config: &Config,
        measurements: &Measurements,
        missing: &[Feature],
        format: OutputFormat,
    ) -> Result<()> {
        let supplied = Feature::ALL
            .into_iter()
            .filter_map(|f| measurements.raw(f).map(|raw| (f, raw)));
        let features = FeatureVector::from_inputs(supplied, missing)?;

        let model = load_model(config)?;
        let outcome = run_prediction(&model, &features);

        match format {
            OutputFormat::Table => println!("{}", format_outcome(&outcome)),
            OutputFormat::Json => {
                let inputs: serde_json::Map<String, serde_json::Value> = Feature::ALL
                    .iter()
                    .map(|f| {
                        let v = features.get(*f);
                        let v = if v.is_nan() { None } else { Some(v) };
                        (f.key().to_string(), serde_json::json!(v))
                    })
                    .collect();
                let json = serde_json::json!({
                    "inputs": inputs,
                    "result": outcome,
                });
                println!("{}", serde_json::to_string_pretty(&json)?);
            }
        }

        Ok(())
    }

    pub fn interactive(config: &Config) -> Result<()> {
        use rustyline::error::ReadlineError;
        use rustyline::Editor;

        let model = load_model(config)?;
        let mut rl = Editor::<(), rustyline::history::DefaultHistory>::new().map_err(|e| {
            LarvaError::Config(format!("failed to initialize prompt: {}", e))
        })?;

        println!("🐛 Larva Death Time Predictor (XGBoost based, Mealworms only)");
        println!("Enter each measurement; leave blank or type 'nan' if missing, 'q' to quit.");
        println!("Ctrl-C discards the current larva, Ctrl-D exits.");

        'form: loop {
            println!();
            let mut features = FeatureVector::all_missing_vector();

            for feature in Feature::ALL {
                let prompt = format!("  {:<22} ({} dp): ", feature.label(), feature.precision());
                loop {
                    let line = match rl.readline(&prompt) {
                        Ok(line) => line,
                        Err(ReadlineError::Interrupted) => {
                            println!("  (discarded)");
                            continue 'form;
                        }
                        Err(ReadlineError::Eof) => return Ok(()),
                        Err(e) => {
                            return Err(LarvaError::Io(std::io::Error::new(
                                std::io::ErrorKind::Other,
                                e.to_string(),
                            )))
                        }
                    };
                    if line.trim().eq_ignore_ascii_case("q") {
                        return Ok(());
                    }

                    match parse_value(feature, &line) {
                        Ok(value) => {
                            features.set(feature, value);
                            break;
                        }
                        Err(e @ LarvaError::InvalidInput { .. }) => println!("  {}", e),
                        Err(e) => return Err(e),
                    }
                }
            }

            let outcome = run_prediction(&model, &features);
            println!("\n{}", format_outcome(&outcome));
        }
    }

    pub fn model_info(config: &Config) -> Result<()> {
        let model = load_model(config)?;
        let summary = model.summary();

        println!("Model Information");
        println!("───────────────────────────────");
        println!("  Path:           {}", config.model.path);
        if let Some(version) = &summary.xgboost_version {
            println!("  XGBoost:        {}", version);
        }
        println!("  Trees:          {}", summary.num_trees);
        if let Some(best) = summary.best_iteration {
            println!(
                "  Early stopping: best_iteration {} ({} trees used)",
                best, summary.trees_used
            );
        }
        println!("  Features:       {}", summary.num_features);
        println!("  Objective:      {}", summary.objective);
        println!("  Base score:     {}", summary.base_score);
        if !summary.feature_names.is_empty() {
            println!("  Feature names:  {}", summary.feature_names.join(", "));
        }
        if model.num_features() != Feature::COUNT {
            println!(
                "\n  Warning: model expects {} features but this tool supplies {}",
                model.num_features(),
                Feature::COUNT
            );
        }

        Ok(())
    }
}
