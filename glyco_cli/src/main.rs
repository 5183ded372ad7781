use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use glyco_core::*;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "glyco")]
#[command(about = "Insulin dosing and basal adherence tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Override remote store directory
    #[arg(long, global = true)]
    remote_dir: Option<PathBuf>,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Show debug logging
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate a meal and correction bolus
    Bolus {
        /// Carbohydrates in grams
        #[arg(long, allow_hyphen_values = true)]
        carbs: f64,

        /// Insulin-to-carb ratio (grams per unit); defaults to the profile
        #[arg(long, allow_hyphen_values = true)]
        ratio: Option<f64>,

        /// Current glucose (mg/dL)
        #[arg(long, allow_hyphen_values = true)]
        current: Option<f64>,

        /// Target glucose (mg/dL); defaults to the profile when --current is given
        #[arg(long, allow_hyphen_values = true)]
        target: Option<f64>,

        /// Correction factor (mg/dL per unit); defaults to the profile when --current is given
        #[arg(long, allow_hyphen_values = true)]
        factor: Option<f64>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Log and review basal insulin doses
    Basal {
        #[command(subcommand)]
        action: BasalCommand,
    },

    /// Show or change the target glucose range
    Range {
        #[command(subcommand)]
        action: RangeCommand,
    },

    /// Show or change saved dosing parameters
    Profile {
        #[command(subcommand)]
        action: ProfileCommand,
    },

    /// Summarize today's glucose, sleep and activity as JSON
    Snapshot {
        /// JSON file with glucose, activity and sleep series
        #[arg(long)]
        input: PathBuf,

        /// Day to summarize (YYYY-MM-DD); defaults to today
        #[arg(long)]
        today: Option<NaiveDate>,
    },

    /// Export the basal dose history to CSV
    Export {
        #[arg(long)]
        output: PathBuf,
    },
}

#[derive(Subcommand)]
enum BasalCommand {
    /// Log a basal dose taken now
    Log {
        /// Insulin name; defaults to the profile
        #[arg(long)]
        insulin: Option<String>,

        /// Units taken
        #[arg(long, allow_hyphen_values = true)]
        units: f64,
    },

    /// Show doses per day, including days without an entry
    History {
        /// Number of days to show (1-366); defaults to the configured report length
        #[arg(long)]
        days: Option<u32>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Retry doses saved only on this device
    Sync,
}

#[derive(Subcommand)]
enum RangeCommand {
    /// Show the current target range
    Show,

    /// Set a new target range (mg/dL, whole numbers between 50 and 250)
    Set {
        #[arg(long, allow_hyphen_values = true)]
        min: String,

        #[arg(long, allow_hyphen_values = true)]
        max: String,
    },
}

#[derive(Subcommand)]
enum ProfileCommand {
    /// Show saved dosing parameters
    Show,

    /// Update saved dosing parameters
    Set {
        #[arg(long, allow_hyphen_values = true)]
        ratio: Option<f64>,

        #[arg(long, allow_hyphen_values = true)]
        factor: Option<f64>,

        #[arg(long, allow_hyphen_values = true)]
        target: Option<f64>,

        /// Default basal insulin name
        #[arg(long)]
        insulin: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.verbose {
        glyco_core::logging::init_with_level("debug");
    } else {
        glyco_core::logging::init();
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(dir) = cli.data_dir {
        config.data.data_dir = dir;
    }
    if let Some(dir) = cli.remote_dir {
        config.remote.dir = Some(dir);
    }
    tracing::debug!(
        "Data directory {:?}, remote {:?}",
        config.data.data_dir,
        config.remote.dir
    );

    match cli.command {
        Commands::Bolus {
            carbs,
            ratio,
            current,
            target,
            factor,
            json,
        } => cmd_bolus(
            &config,
            BolusRequest {
                carbs_grams: carbs,
                insulin_to_carb_ratio: ratio,
                current_glucose: current,
                target_glucose: target,
                correction_factor: factor,
            },
            json,
        ),
        Commands::Basal { action } => match config.remote.dir.clone() {
            Some(dir) => cmd_basal(&config, DirectoryRemote::new(dir), action),
            None => cmd_basal(&config, OfflineRemote, action),
        },
        Commands::Range { action } => match config.remote.dir.clone() {
            Some(dir) => cmd_range(&config, DirectoryRemote::new(dir), action),
            None => cmd_range(&config, OfflineRemote, action),
        },
        Commands::Profile { action } => cmd_profile(&config, action),
        Commands::Snapshot { input, today } => cmd_snapshot(&config, &input, today),
        Commands::Export { output } => match config.remote.dir.clone() {
            Some(dir) => cmd_export(&config, DirectoryRemote::new(dir), &output),
            None => cmd_export(&config, OfflineRemote, &output),
        },
    }
}

fn open_store<R: RemoteStore>(config: &Config, remote: R) -> Result<WriteThroughStore<R>> {
    let wal_dir = config.wal_dir();
    std::fs::create_dir_all(&wal_dir)?;
    Ok(WriteThroughStore::new(remote, config.data.user_id.clone(), &wal_dir))
}

fn cmd_bolus(config: &Config, request: BolusRequest, json: bool) -> Result<()> {
    let profile = DosingProfile::load(&config.profile_path())?;
    let input = bolus_input_from_profile(&request, &profile)?;
    let result = glyco_core::bolus::calculate(&input)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!();
    println!("  Meal insulin:        {:>6.2} u", result.meal_insulin_units);
    println!("  Correction insulin:  {:>6.2} u", result.correction_insulin_units);
    println!("  ─────────────────────────────");
    println!("  Total (rounded):     {:>6.1} u", result.total_units);

    if let Some(current) = input.current_glucose {
        let class = profile.target_range.classify(current);
        println!(
            "  Current glucose:     {:>6.0} mg/dL ({})",
            current,
            describe_class(class)
        );
    }

    if result.low_glucose_warning {
        println!();
        println!(
            "  ⚠ Glucose is below {} mg/dL. Treat the low before taking a bolus.",
            glyco_core::bolus::LOW_GLUCOSE_THRESHOLD_MG_DL
        );
    }
    if result.total_units <= 0.0 {
        println!();
        println!("  ℹ No bolus recommended for these inputs.");
    }
    println!();

    Ok(())
}

fn cmd_basal<R: RemoteStore>(config: &Config, remote: R, action: BasalCommand) -> Result<()> {
    let offset = config.timezone.offset()?;
    let mut store = open_store(config, remote)?;
    let mut tracker = load_tracker(&store, offset)?;

    match action {
        BasalCommand::Log { insulin, units } => {
            let insulin = match insulin {
                Some(name) => name,
                None => DosingProfile::load(&config.profile_path())?
                    .basal_insulin_name
                    .ok_or(ValidationError::Missing {
                        field: "insulin name",
                    })?,
            };

            let logged = log_basal_dose(&mut tracker, &mut store, &insulin, units)?;

            println!(
                "\n✓ Logged {} u of {} at {}",
                logged.entry.dose_units,
                logged.entry.insulin_name,
                format_time(logged.entry.timestamp, offset)
            );
            if let PersistOutcome::CachedOnly { reason } = &logged.persistence {
                println!("  ⚠ Saved on this device only ({}).", reason);
                println!("    Run `glyco basal sync` to retry.");
            }
            if let Some(warning) = &logged.feedback.timing_deviation_warning {
                println!("  ⚠ {}", warning);
            }
            if let Some(message) = &logged.feedback.weekly_consistency_message {
                println!("  ★ {}", message);
            }
            println!();
        }

        BasalCommand::History { days, json } => {
            let days = days.unwrap_or(config.report.history_days);
            let report = tracker.history_for_window(days, Utc::now())?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }

            for day in &report {
                match &day.status {
                    DayStatus::NoEntry => println!("{}  (no entry)", day.date),
                    DayStatus::Logged(entries) => {
                        for (i, entry) in entries.iter().enumerate() {
                            let date = if i == 0 {
                                day.date.to_string()
                            } else {
                                " ".repeat(10)
                            };
                            let sync_note = if tracker.is_confirmed(entry.id) {
                                ""
                            } else {
                                " (not yet synced)"
                            };
                            println!(
                                "{}  {} {} u at {}{}",
                                date,
                                entry.insulin_name,
                                entry.dose_units,
                                format_time(entry.timestamp, offset),
                                sync_note
                            );
                        }
                    }
                }
            }
        }

        BasalCommand::Sync => {
            if tracker.unconfirmed_count() == 0 {
                println!("Nothing to sync.");
            } else {
                let report = reconcile_pending(&mut tracker, &mut store)?;
                println!("✓ Synced {} entries", report.confirmed.len());
                if report.still_pending > 0 {
                    println!(
                        "  ⚠ {} entries still saved on this device only",
                        report.still_pending
                    );
                }
            }

            let keep_since =
                Utc::now() - chrono::Duration::days(glyco_core::store::JOURNAL_RETENTION_DAYS);
            store.compact_journal(keep_since)?;
        }
    }

    Ok(())
}

fn cmd_range<R: RemoteStore>(config: &Config, remote: R, action: RangeCommand) -> Result<()> {
    let profile_path = config.profile_path();

    match action {
        RangeCommand::Show => {
            let range = DosingProfile::load(&profile_path)?.target_range;
            println!("Target range: {}-{} mg/dL", range.minimum, range.maximum);
        }
        RangeCommand::Set { min, max } => {
            let range = glyco_core::range::validate_str(&min, &max)?;
            let mut store = open_store(config, remote)?;
            let update = save_target_range(&profile_path, &mut store, range)?;

            println!(
                "✓ Target range set to {}-{} mg/dL",
                update.range.minimum, update.range.maximum
            );
            if let PersistOutcome::CachedOnly { reason } = &update.remote {
                println!("  ⚠ Saved on this device only ({}).", reason);
            }
        }
    }

    Ok(())
}

fn cmd_profile(config: &Config, action: ProfileCommand) -> Result<()> {
    let profile_path = config.profile_path();

    let profile = match action {
        ProfileCommand::Show => DosingProfile::load(&profile_path)?,
        ProfileCommand::Set {
            ratio,
            factor,
            target,
            insulin,
        } => {
            let profile = DosingProfile::update(&profile_path, |profile| {
                if let Some(ratio) = ratio {
                    profile.insulin_to_carb_ratio = Some(require_positive("ratio", ratio)?);
                }
                if let Some(factor) = factor {
                    profile.correction_factor = Some(require_positive("factor", factor)?);
                }
                if let Some(target) = target {
                    profile.target_glucose = Some(require_positive("target", target)?);
                }
                if let Some(insulin) = &insulin {
                    let name = insulin.trim();
                    if name.is_empty() {
                        return Err(ValidationError::BlankInsulinName.into());
                    }
                    profile.basal_insulin_name = Some(name.to_string());
                }
                Ok(())
            })?;
            println!("✓ Profile updated");
            profile
        }
    };

    println!("{}", serde_json::to_string_pretty(&profile)?);
    Ok(())
}

fn cmd_snapshot(config: &Config, input: &Path, today: Option<NaiveDate>) -> Result<()> {
    let series = HealthSeries::load(input)?;
    let today = match today {
        Some(day) => day,
        None => Utc::now()
            .with_timezone(&config.timezone.offset()?)
            .date_naive(),
    };

    let snapshot = series.snapshot(today);
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

fn cmd_export<R: RemoteStore>(config: &Config, remote: R, output: &Path) -> Result<()> {
    let offset = config.timezone.offset()?;
    let store = open_store(config, remote)?;
    let tracker = load_tracker(&store, offset)?;

    let count = export_history(tracker.history(), output, |e| tracker.is_confirmed(e.id))?;
    println!("✓ Exported {} entries to {}", count, output.display());
    Ok(())
}

fn require_positive(field: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ValidationError::NotPositive { field, value }.into())
    }
}

fn describe_class(class: GlucoseClass) -> &'static str {
    match class {
        GlucoseClass::Low => "below range",
        GlucoseClass::InRange => "in range",
        GlucoseClass::High => "above range",
    }
}

fn format_time(instant: DateTime<Utc>, offset: FixedOffset) -> String {
    instant.with_timezone(&offset).format("%H:%M").to_string()
}
