use clap::Parser;
use portage_sim::config::{Cli, Command};
use portage_sim::utils::error::{ErrorSeverity, PortageError};
use portage_sim::utils::{logger, validation::Validate};
use portage_sim::{
    CalculationEngine, CalculationRequest, CsvReferenceSource, PayrollSimulator, SimulatorConfig,
};
use portage_sim::app::BatchRunner;
use std::fs::File;
use std::io::{BufReader, BufWriter};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match SimulatorConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("❌ Failed to load config file '{}': {}", path, e);
                eprintln!("💡 Make sure the file exists and is valid TOML format");
                std::process::exit(3);
            }
        },
        None => SimulatorConfig::default(),
    };

    let verbose = cli.verbose || config.logging.verbose;
    if cli.json_logs || config.logging.json {
        logger::init_json_logger(verbose);
    } else {
        logger::init_cli_logger(verbose);
    }

    tracing::info!("Starting portage-sim");
    tracing::debug!("Config: {:?}", config);

    if let Err(e) = config.validate() {
        exit_with(&e);
    }

    let reference = match config.reference_source() {
        Ok(source) => source,
        Err(e) => exit_with(&e),
    };
    let simulator = PayrollSimulator::new(CalculationEngine::new(config.engine.clone()), reference);

    if config.reference.preload_on_startup {
        match simulator.preload() {
            Ok(count) => tracing::info!("Preloaded {} commune codes", count),
            Err(e) => tracing::warn!(
                "Commune codes could not be preloaded, commune checks will fail: {}",
                e
            ),
        }
    }

    let outcome = match cli.command {
        Command::Simulate(args) => simulate(&simulator, args.into()),
        Command::Batch { input, output } => batch(&simulator, &input, &output),
        Command::CheckCommune { code } => check_commune(&simulator, &code),
        Command::Info => {
            info(&config, &simulator);
            Ok(())
        }
    };

    if let Err(e) = outcome {
        exit_with(&e);
    }

    Ok(())
}

fn simulate(
    simulator: &PayrollSimulator<CsvReferenceSource>,
    request: CalculationRequest,
) -> portage_sim::Result<()> {
    let result = simulator.simulate(&request)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn batch(
    simulator: &PayrollSimulator<CsvReferenceSource>,
    input: &str,
    output: &str,
) -> portage_sim::Result<()> {
    let reader = BufReader::new(File::open(input)?);
    let writer = BufWriter::new(File::create(output)?);

    let summary = BatchRunner::new(simulator).run(reader, writer)?;

    println!(
        "✅ {} rows simulated ({} ok, {} rejected)",
        summary.total, summary.succeeded, summary.rejected
    );
    println!("📁 Output saved to: {}", output);
    Ok(())
}

fn check_commune(
    simulator: &PayrollSimulator<CsvReferenceSource>,
    code: &str,
) -> portage_sim::Result<()> {
    if simulator.check_commune(code)? {
        println!("✅ Commune code '{}' is known", code.trim());
        Ok(())
    } else {
        Err(PortageError::UnknownCommuneCode {
            code: code.trim().to_string(),
        })
    }
}

fn info(config: &SimulatorConfig, simulator: &PayrollSimulator<CsvReferenceSource>) {
    let settings = simulator.engine().settings();
    println!("📋 Configuration Summary:");
    println!("  Meal voucher per day: {}", settings.per_diem_rate);
    println!("  Insurance flat amount: {}", settings.insurance_flat_amount);
    println!("  Net ratio: {}", settings.net_ratio);
    if let Some(min) = settings.min_daily_rate {
        println!("  Minimum daily rate: {}", min);
    }
    if let Some(max) = settings.max_days_worked {
        println!("  Maximum days worked: {}", max);
    }

    println!();
    println!("📚 Reference Dataset:");
    let path = simulator.reference().path();
    println!("  Source: {}", config.reference.source_id);
    println!("  Path: {}", path.display());
    match std::fs::metadata(path) {
        Ok(meta) => {
            println!("  Exists: yes ({} bytes)", meta.len());
            match simulator.preload() {
                Ok(count) => println!("  Commune codes: {}", count),
                Err(e) => println!("  Commune codes: unreadable ({})", e.user_friendly_message()),
            }
        }
        Err(_) => println!("  Exists: no"),
    }
}

fn exit_with(e: &PortageError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}
