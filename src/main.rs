use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL};
use composition::{CompositionEngine, CompositionResult};
use configuration::{Config, init_tracing, load_config, load_config_from};
use coordinator::MeasurementVersionCoordinator;
use core_types::{MeasurementField, MeasurementPatch, MeasurementSet, Sex};
use database::{DbRepository, connect, run_migrations};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

/// The main entry point for the Anthropo command-line tool.
#[tokio::main]
async fn main() {
    // Load environment variables (DATABASE_URL, ANTHROPO__*) from a .env file, if any.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = match cli.config.as_deref() {
        Some(path) => load_config_from(path),
        None => load_config(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            std::process::exit(2);
        }
    };

    // The guard must live until exit so buffered file logs are flushed.
    let _log_guard = match init_tracing(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error initializing logging: {}", e);
            std::process::exit(2);
        }
    };

    if let Err(e) = run(cli, config).await {
        tracing::error!(error = %e, "Command failed.");
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Anthropometric body-composition engine.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML settings file. Defaults to ./config.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print the raw JSON record instead of tables.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute a composition result from a measurement JSON file, without storing anything.
    Compute(ComputeArgs),
    /// Store a new measurement (at version 1) and optionally compute its result.
    Register(RegisterArgs),
    /// Apply a versioned update to a stored measurement.
    Update(UpdateArgs),
    /// Show a stored measurement and its current result.
    Show(ShowArgs),
}

#[derive(Args)]
struct ComputeArgs {
    /// Measurement set as JSON.
    #[arg(long)]
    input: PathBuf,

    /// Patient sex (male/female).
    #[arg(long)]
    sex: Option<Sex>,
}

#[derive(Args)]
struct RegisterArgs {
    /// Measurement set as JSON.
    #[arg(long)]
    input: PathBuf,

    /// When given, the result for version 1 is computed and stored.
    #[arg(long)]
    sex: Option<Sex>,
}

#[derive(Args)]
struct UpdateArgs {
    /// The measurement to update.
    #[arg(long)]
    id: Uuid,

    /// The version the edit was based on.
    #[arg(long)]
    expected_version: u64,

    /// A patch as JSON (`values`, `clear`, `notes`, `taken_at`).
    #[arg(long)]
    patch: Option<PathBuf>,

    /// Set a single reading, e.g. `--set skinfold_triceps=10.4`. Repeatable.
    #[arg(long = "set", value_parser = parse_assignment)]
    set: Vec<(MeasurementField, f64)>,

    /// Remove an optional reading, e.g. `--clear perimeter_head`. Repeatable.
    #[arg(long = "clear")]
    clear: Vec<MeasurementField>,

    /// When given, the result for the new version is computed and stored.
    #[arg(long)]
    sex: Option<Sex>,
}

#[derive(Args)]
struct ShowArgs {
    #[arg(long)]
    id: Uuid,
}

fn parse_assignment(raw: &str) -> Result<(MeasurementField, f64), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got '{}'", raw))?;
    let field = key.trim().parse::<MeasurementField>().map_err(|e| e.to_string())?;
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid number '{}': {}", value, e))?;
    Ok((field, value))
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    let engine = CompositionEngine::from_config(&config).context("invalid reference settings")?;

    match cli.command {
        Commands::Compute(args) => {
            let measurement = read_measurement(&args.input)?;
            let result = engine.compute(&measurement, args.sex)?;
            print_result(&result, cli.json)?;
        }
        Commands::Register(args) => {
            let coordinator = connect_coordinator(&config, engine).await?;
            let measurement = read_measurement(&args.input)?;
            let registered = coordinator.register(measurement).await?;
            println!(
                "Registered measurement {} (patient {}) at version {}.",
                registered.measurement_id, registered.patient_id, registered.version
            );
            if args.sex.is_some() {
                let result = coordinator
                    .recompute(registered.measurement_id, args.sex)
                    .await?;
                print_result(&result, cli.json)?;
            }
        }
        Commands::Update(args) => {
            let coordinator = connect_coordinator(&config, engine).await?;
            let patch = build_patch(&args)?;
            if args.sex.is_some() {
                let result = coordinator
                    .update_and_recompute(args.id, args.expected_version, &patch, args.sex)
                    .await?;
                println!("Committed version {}.", result.version);
                print_result(&result, cli.json)?;
            } else {
                let committed = coordinator
                    .update(args.id, args.expected_version, &patch)
                    .await?;
                println!(
                    "Committed version {}. Stored results for earlier versions are now stale.",
                    committed.version
                );
            }
        }
        Commands::Show(args) => {
            let coordinator = connect_coordinator(&config, engine).await?;
            let measurement = coordinator.measurement(args.id).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&measurement)?);
            } else {
                print_measurement(&measurement);
            }
            match coordinator.current_result(args.id).await? {
                Some(result) => print_result(&result, cli.json)?,
                None => println!(
                    "No result for version {}. Run `update` or `register` with --sex to compute one.",
                    measurement.version
                ),
            }
        }
    }
    Ok(())
}

async fn connect_coordinator(
    config: &Config,
    engine: CompositionEngine,
) -> anyhow::Result<MeasurementVersionCoordinator> {
    let pool = connect(&config.database)
        .await
        .context("failed to connect to the database")?;
    run_migrations(&pool)
        .await
        .context("failed to run database migrations")?;
    let repository = DbRepository::new(pool);
    Ok(MeasurementVersionCoordinator::new(Arc::new(repository), engine))
}

fn read_measurement(path: &Path) -> anyhow::Result<MeasurementSet> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("{} is not a measurement set", path.display()))
}

fn build_patch(args: &UpdateArgs) -> anyhow::Result<MeasurementPatch> {
    let mut patch = match &args.patch {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("{} is not a measurement patch", path.display()))?
        }
        None => MeasurementPatch::new(),
    };
    for (field, value) in &args.set {
        patch = patch.set(*field, *value);
    }
    for field in &args.clear {
        patch = patch.clear(*field);
    }
    if patch.is_empty() {
        anyhow::bail!("nothing to update: pass --patch, --set or --clear");
    }
    Ok(patch)
}

// ==============================================================================
// Output
// ==============================================================================

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn print_measurement(measurement: &MeasurementSet) {
    println!(
        "Measurement {} | patient {} | taken {} | version {}",
        measurement.measurement_id,
        measurement.patient_id,
        measurement.taken_at.format("%Y-%m-%d %H:%M"),
        measurement.version
    );
    if let Some(notes) = &measurement.notes {
        println!("Notes: {}", notes);
    }
}

fn print_result(result: &CompositionResult, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    let mut summary = new_table(vec!["Index", "Value"]);
    summary.add_row(vec!["Version".to_string(), result.version.to_string()]);
    summary.add_row(vec!["Sex".to_string(), result.sex.to_string()]);
    summary.add_row(vec!["BMI (kg/m²)".to_string(), format!("{:.2}", result.bmi)]);
    summary.add_row(vec![
        "Sum of 6 skinfolds (mm)".to_string(),
        format!("{:.1}", result.sum_of_6_skinfolds),
    ]);
    summary.add_row(vec![
        "Body density (g/cm³)".to_string(),
        format!("{:.4}", result.body_density),
    ]);
    summary.add_row(vec!["Fat (Siri %)".to_string(), format!("{:.2}", result.fat_pct)]);
    summary.add_row(vec![
        "Muscle / bone".to_string(),
        format!("{:.2}", result.muscle_to_bone_ratio),
    ]);
    summary.add_row(vec![
        "Adipose / muscle".to_string(),
        format!("{:.2}", result.adipose_to_muscle_ratio),
    ]);
    if let Some(whr) = result.waist_to_hip_ratio {
        summary.add_row(vec!["Waist / hip".to_string(), format!("{:.2}", whr)]);
    }
    if let Some(cormic) = result.cormic_index {
        summary.add_row(vec!["Cormic index".to_string(), format!("{:.1}", cormic)]);
    }
    if let Some(s) = &result.somatotype {
        summary.add_row(vec![
            "Somatotype".to_string(),
            format!("{:.1} - {:.1} - {:.1}", s.endomorphy, s.mesomorphy, s.ectomorphy),
        ]);
    }
    println!("{summary}");

    let mut components = new_table(vec!["Component", "kg", "%"]);
    for (name, component) in result.components() {
        components.add_row(vec![
            name.to_string(),
            format!("{:.2}", component.kg),
            format!("{:.1}", component.pct),
        ]);
    }
    components.add_row(vec![
        "structured weight".to_string(),
        format!("{:.2}", result.structured_weight),
        format!("{:+.2} vs measured", result.weight_difference),
    ]);
    println!("{components}");

    let mut fields = new_table(vec!["Field", "Raw", "Adjusted", "±ETM", "Z"]);
    for field in &result.fields {
        fields.add_row(vec![
            format!("{} ({})", field.field, field.unit),
            format!("{:.2}", field.raw),
            format!("{:.2}", field.adjusted),
            field
                .etm_bound
                .map(|b| format!("{:.2}", b))
                .unwrap_or_else(|| "-".to_string()),
            field
                .z_score
                .map(|z| format!("{:+.2}", z))
                .unwrap_or_else(|| "-".to_string()),
        ]);
    }
    println!("{fields}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_field_assignments() {
        assert_eq!(
            parse_assignment("skinfold_triceps=10.4").unwrap(),
            (MeasurementField::SkinfoldTriceps, 10.4)
        );
        assert!(parse_assignment("skinfold_triceps").is_err());
        assert!(parse_assignment("forehead=3").is_err());
        assert!(parse_assignment("weight=heavy").is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
