use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use log::{error, info};
use station_forecast::{
    impute_training_gaps, read_ghcn_daily, ForecastError, TargetKind, TrainingError, TrainingTable,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Csv,
    Parquet,
}

impl Format {
    fn extension(self) -> &'static str {
        match self {
            Format::Csv => "csv",
            Format::Parquet => "parquet",
        }
    }
}

/// Builds train/test feature tables for every target from a NOAA daily summary export.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// GHCN daily CSV with DATE, PRCP, TMAX, TMIN, AWND and WDF2 columns.
    input: PathBuf,

    /// Directory the tables are written to.
    #[arg(short, long, default_value = "data")]
    output: PathBuf,

    /// Last date of the training split; later rows form the test split.
    #[arg(long, default_value = "2020-12-31")]
    cutoff: NaiveDate,

    #[arg(long, value_enum, default_value_t = Format::Csv)]
    format: Format,

    /// Only build this target (temp_max, temp_min or rain).
    #[arg(long)]
    target: Option<TargetKind>,
}

fn run(args: Args) -> Result<(), ForecastError> {
    let raw = read_ghcn_daily(&args.input)?;
    let history = impute_training_gaps(&raw)?;

    std::fs::create_dir_all(&args.output)
        .map_err(|e| TrainingError::DirCreation(args.output.clone(), e))?;

    let targets = match args.target {
        Some(target) => vec![target],
        None => TargetKind::ALL.to_vec(),
    };
    for target in targets {
        let table = TrainingTable::build(&history, target)?;
        let (train, test) = table.split_at(args.cutoff);
        info!(
            "{}: {} training rows up to {}, {} test rows",
            target,
            train.len(),
            args.cutoff,
            test.len()
        );

        for (split, part) in [("train", &train), ("test", &test)] {
            let path = args
                .output
                .join(format!("{}_{}.{}", target, split, args.format.extension()));
            match args.format {
                Format::Csv => part.write_csv(&path)?,
                Format::Parquet => part.write_parquet(&path)?,
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Building training tables failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
