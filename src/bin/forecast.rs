use clap::Parser;
use log::{error, info};
use station_forecast::{
    run_inference, CsvObservationStore, ForecastConfig, ForecastError, JsonModelStore,
    ModelStore, ObservationSource, ObservationStore, Secrets,
};
use std::path::PathBuf;
use std::process::ExitCode;

/// Fetches today's station readings, appends them to the history and sends tomorrow's forecast.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Config file. Defaults to the user config directory.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Forecast from the stored history without fetching new readings.
    #[arg(long)]
    skip_fetch: bool,
}

async fn run(args: Args) -> Result<(), ForecastError> {
    let config_path = match args.config {
        Some(path) => path,
        None => ForecastConfig::default_path()?,
    };
    let config = ForecastConfig::load(&config_path)?;
    info!("Loaded configuration from {:?}", config_path);

    let notifier = config.notifier()?;
    let store = CsvObservationStore::new(&config.observations.history);
    if args.skip_fetch {
        info!("Skipping fetch, forecasting from stored history");
    } else {
        let source = config.arduino_source(&Secrets::from_env())?;
        let observation = source.fetch_latest().await?;
        store.append(&observation)?;
    }

    let history = store.read_all()?;
    let models = JsonModelStore::new(&config.models.directory);
    info!("Loading models from {:?}", models.directory());
    let predictors = models.load_all()?;
    let forecast = run_inference(&history, &predictors)?;
    info!(
        "Forecast for {}: high {:.1}, low {:.1}, rain {}",
        forecast.forecast_for, forecast.temp_max, forecast.temp_min, forecast.rain
    );

    notifier.notify(&forecast)?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Args::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Forecast run failed: {}", e);
            let mut source = std::error::Error::source(&e);
            while let Some(cause) = source {
                error!("  caused by: {}", cause);
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}
