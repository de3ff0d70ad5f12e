use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use log::{LevelFilter, info};

use setlog::config::EtlConfig;
use setlog::db::{self, models::NewExercise, operations};
use setlog::error::EtlError;
use setlog::etl::{InputSource, RunCoordinator, StagedBatch, StagedRows};

#[derive(Parser, Debug)]
#[command(version, about = "setlog - workout ETL", long_about = None)]
struct Args {
    /// Log more (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one ETL cycle against a staged batch file
    Run {
        /// JSON staging file with session fields and set rows
        staging: PathBuf,
        /// Shared secret presented by the triggering caller
        #[arg(long)]
        secret: String,
    },
    /// Inspect or curate the exercise reference table
    Exercises {
        #[command(subcommand)]
        command: ExerciseCommands,
    },
    /// Print totals and top muscle groups by volume
    Summary,
}

#[derive(Subcommand, Debug)]
enum ExerciseCommands {
    /// List the reference table (also the UI dropdown payload)
    List,
    /// Replace the reference table from a CSV (name, muscle_group, category)
    Import { path: PathBuf },
}

fn init_logger(level: LevelFilter) {
    let mut builder = env_logger::Builder::new();
    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "{}: {} - {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .target(env_logger::Target::Stderr)
        .filter_level(level);
    let _ = builder.try_init();
}

/// File-backed staging area: a JSON document with `session` and `rows`.
/// Clearing mirrors the spreadsheet semantics - field keys survive with
/// blank values, rows are emptied, structure stays.
struct FileSource {
    path: PathBuf,
}

impl FileSource {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    fn read(&self) -> Result<StagedBatch, EtlError> {
        let text = std::fs::read_to_string(&self.path)
            .map_err(|e| EtlError::Source(format!("{}: {}", self.path.display(), e)))?;
        serde_json::from_str(&text)
            .map_err(|e| EtlError::Source(format!("{}: {}", self.path.display(), e)))
    }
}

impl InputSource for FileSource {
    async fn fetch_batch(&self) -> Result<StagedBatch, EtlError> {
        self.read()
    }

    async fn clear_staging(&self) -> Result<(), EtlError> {
        let batch = self.read()?;
        let session: serde_json::Map<String, serde_json::Value> = batch
            .session
            .keys()
            .map(|key| (key.clone(), serde_json::Value::String(String::new())))
            .collect();
        let rows = match batch.rows {
            StagedRows::Blob(_) => serde_json::Value::String(String::new()),
            StagedRows::Rows(_) => serde_json::Value::Array(Vec::new()),
        };
        let cleared = serde_json::json!({ "session": session, "rows": rows });
        let text = serde_json::to_string_pretty(&cleared)
            .map_err(|e| EtlError::Source(e.to_string()))?;
        std::fs::write(&self.path, text)
            .map_err(|e| EtlError::Source(format!("{}: {}", self.path.display(), e)))?;
        info!("cleared staging file {}", self.path.display());
        Ok(())
    }
}

fn read_exercise_csv(path: &Path) -> Result<Vec<NewExercise>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let mut exercises = Vec::new();
    for record in reader.deserialize::<NewExercise>() {
        exercises.push(record.with_context(|| format!("bad row in {}", path.display()))?);
    }
    Ok(exercises)
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenv();
    let args = Args::parse();

    init_logger(match args.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    });

    let config = EtlConfig::from_env()?;
    let pool = db::connect(&config.database_url).await?;

    match args.command {
        Commands::Run { staging, secret } => {
            let coordinator = RunCoordinator::new(config, pool, FileSource::new(&staging));
            let result = coordinator.run(&secret).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
            if !result.success {
                std::process::exit(1);
            }
        }
        Commands::Exercises { command } => match command {
            ExerciseCommands::List => {
                let exercises = operations::get_all_exercises(&pool).await?;
                if exercises.is_empty() {
                    println!("No exercises in the reference table.");
                }
                for exercise in exercises {
                    println!(
                        "{:>4}  {:<30} {:<15} {}",
                        exercise.exercise_id,
                        exercise.name,
                        exercise.muscle_group.as_deref().unwrap_or("-"),
                        exercise.category.as_deref().unwrap_or("-"),
                    );
                }
            }
            ExerciseCommands::Import { path } => {
                let exercises = read_exercise_csv(&path)?;
                let count = operations::replace_exercises(&pool, &exercises).await?;
                println!("Imported {} exercises from {}", count, path.display());
            }
        },
        Commands::Summary => {
            let summary = operations::summarize(&pool).await?;
            println!("Total sets logged: {}", summary.total_sets);
            println!("Unique workout dates: {}", summary.unique_dates);
            if !summary.volume_by_muscle_group.is_empty() {
                println!("Top muscle groups by volume:");
                for (muscle_group, volume) in &summary.volume_by_muscle_group {
                    println!("  {}: {:.0} kg", muscle_group, volume);
                }
            }
        }
    }

    Ok(())
}
