use anyhow::Context;
use chrono::{Local, NaiveDate, NaiveTime};
use clap::{Args, Parser, Subcommand};
use inquire::InquireError;
use pm25_core::{
    Config, ModelBundle, ModelLoader, Pollutant, PollutantReading, Session, TimestampSelection,
};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    output,
    prompts::{self, MenuAction},
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "pm25", version, about = "PM2.5 predictor")]
pub struct Cli {
    /// Local model artifact; overrides the configured path.
    #[arg(long, global = true)]
    pub model: Option<PathBuf>,

    /// URL to download the model from when the local artifact is missing.
    #[arg(long, global = true)]
    pub model_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Predict PM2.5 once from command-line values.
    Predict(PredictArgs),

    /// Interactive session with history, CSV export and a trend chart.
    Session {
        /// Where "Export CSV" writes the history.
        #[arg(long, default_value = "pm25_history.csv")]
        csv: PathBuf,

        /// Where "Save chart" writes the SVG trend chart.
        #[arg(long, default_value = "pm25_trend.svg")]
        chart: PathBuf,
    },

    /// Configure the model location interactively.
    Configure,

    /// Print the config file location.
    ConfigPath,
}

/// Omitted pollutants take their defaults; omitted date/time mean "now".
#[derive(Debug, Args)]
pub struct PredictArgs {
    #[arg(long)]
    pub co: Option<f64>,
    #[arg(long)]
    pub no: Option<f64>,
    #[arg(long)]
    pub no2: Option<f64>,
    #[arg(long)]
    pub o3: Option<f64>,
    #[arg(long)]
    pub so2: Option<f64>,
    #[arg(long)]
    pub pm10: Option<f64>,
    #[arg(long)]
    pub nh3: Option<f64>,

    /// Date as YYYY-MM-DD.
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Time of day as HH:MM.
    #[arg(long, value_parser = prompts::parse_time)]
    pub time: Option<NaiveTime>,
}

impl PredictArgs {
    fn reading(&self) -> PollutantReading {
        let mut reading = PollutantReading::default();
        let given = [
            (Pollutant::Co, self.co),
            (Pollutant::No, self.no),
            (Pollutant::No2, self.no2),
            (Pollutant::O3, self.o3),
            (Pollutant::So2, self.so2),
            (Pollutant::Pm10, self.pm10),
            (Pollutant::Nh3, self.nh3),
        ];
        for (pollutant, value) in given {
            if let Some(value) = value {
                reading.set(pollutant, value);
            }
        }
        reading
    }

    fn timestamp(&self) -> TimestampSelection {
        let now = Local::now().naive_local();
        TimestampSelection::new(
            self.date.unwrap_or(now.date()),
            self.time.unwrap_or(now.time()),
        )
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let Cli { model, model_url, command } = self;

        match command {
            Command::Configure => configure(),
            Command::ConfigPath => {
                println!("{}", Config::config_file_path()?.display());
                Ok(())
            }
            Command::Predict(args) => {
                let loader = build_loader(model, model_url)?;
                let bundle = load_model(&loader).await.context("Could not load the model")?;
                let mut session = Session::new(bundle);

                let prediction = session.predict(&args.reading(), &args.timestamp())?;
                output::print_prediction(&prediction);
                Ok(())
            }
            Command::Session { csv, chart } => {
                let loader = build_loader(model, model_url)?;
                run_session(&loader, &csv, &chart).await
            }
        }
    }
}

fn build_loader(model: Option<PathBuf>, model_url: Option<String>) -> anyhow::Result<ModelLoader> {
    let config = Config::load()?;
    let mut source = config.model_source()?;

    if let Some(path) = model {
        source.path = path;
    }
    if model_url.is_some() {
        source.url = model_url;
    }

    Ok(ModelLoader::new(source)?)
}

/// Shown before a blocking first-use download.
fn download_notice(loader: &ModelLoader) -> Option<&'static str> {
    loader.needs_download().then_some("Downloading model...")
}

async fn load_model(loader: &ModelLoader) -> pm25_core::Result<Arc<ModelBundle>> {
    if let Some(notice) = download_notice(loader) {
        println!("{notice}");
    }
    loader.get().await
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    match prompts::configure(&mut config) {
        Ok(()) => {}
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
            println!("Configuration unchanged.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    }

    // Surface a malformed checksum before it is written.
    config.model_source()?;
    config.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn run_session(loader: &ModelLoader, csv_path: &Path, chart_path: &Path) -> anyhow::Result<()> {
    let bundle = load_model(loader)
        .await
        .context("Could not load the model; fix the problem and start a new session")?;
    let mut session = Session::new(bundle);
    output::print_model_summary(session.model());

    let mut reading = PollutantReading::default();

    loop {
        let action = match prompts::menu() {
            Ok(action) => action,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(e) => return Err(e.into()),
        };

        match action {
            MenuAction::Predict => {
                let input = prompts::reading(&reading)
                    .and_then(|r| prompts::timestamp().map(|t| (r, t)));
                let (next, instant) = match input {
                    Ok(input) => input,
                    Err(InquireError::OperationCanceled) => continue,
                    Err(InquireError::OperationInterrupted) => break,
                    Err(e) => return Err(e.into()),
                };
                reading = next;

                match session.predict(&reading, &instant) {
                    Ok(prediction) => output::print_prediction(&prediction),
                    Err(e) if e.is_fatal() => return Err(e.into()),
                    Err(e) => eprintln!("Error: {e}"),
                }
            }
            MenuAction::History => output::print_history(&session.render()),
            MenuAction::ExportCsv => match export_csv(&session, csv_path) {
                Ok(()) => println!("Saved {} rows to {}", session.history().len(), csv_path.display()),
                Err(e) => eprintln!("Error: {e:#}"),
            },
            MenuAction::SaveChart => match save_chart(&session, chart_path) {
                Ok(()) => println!("Saved chart to {}", chart_path.display()),
                Err(e) => eprintln!("Error: {e:#}"),
            },
            MenuAction::Quit => break,
        }
    }

    println!("Session ended after {} prediction(s).", session.history().len());
    Ok(())
}

fn export_csv(session: &Session, path: &Path) -> anyhow::Result<()> {
    let bytes = session.export_csv()?;
    fs::write(path, bytes).with_context(|| format!("Failed to write CSV file: {}", path.display()))
}

fn save_chart(session: &Session, path: &Path) -> anyhow::Result<()> {
    let svg = session.render().chart.to_svg()?;
    fs::write(path, svg).with_context(|| format!("Failed to write chart file: {}", path.display()))
}
