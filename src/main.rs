//! diskstress CLI entry point

use anyhow::{Context, Result};
use diskstress::config::{cli::Cli, cli_convert, validator, ClockKind, RunConfig};
use diskstress::output::ReportWriter;
use diskstress::util::{Clock, Monotonic, MonotonicRaw};
use diskstress::StressLoop;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse_args();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr so report lines on stdout stay machine-readable
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("diskstress={}", default_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    cli.validate()?;

    let config = cli_convert::build_run_config(cli)?;
    validator::validate_config(&config).context("Invalid configuration")?;

    if cli.dry_run {
        print_configuration(&config);
        return Ok(());
    }

    match config.clock {
        ClockKind::Monotonic => run_matrix::<Monotonic>(&config),
        ClockKind::MonotonicRaw => run_matrix::<MonotonicRaw>(&config),
    }
}

/// Run every combination in matrix order, stopping at the first failure
fn run_matrix<C: Clock>(config: &RunConfig) -> Result<()> {
    let mut sink = ReportWriter::stdout(config.format);
    let total = config.matrix.len();

    tracing::info!(
        device = %config.device.display(),
        combinations = total,
        clock = %config.clock,
        "Starting stress run"
    );

    for (index, stress) in config.stress_configs().enumerate() {
        tracing::info!(
            combination = index + 1,
            of = total,
            read_size = stress.read_size,
            write_size = stress.write_size,
            jump = stress.jump_increment,
            "Starting traversal"
        );

        let summary = StressLoop::<C>::new(&stress)
            .run(&mut sink)
            .inspect_err(|err| {
                tracing::debug!(
                    allocation = err.is_allocation(),
                    os_error = ?err.raw_os_error(),
                    "Traversal aborted"
                )
            })
            .with_context(|| format!("Stress run failed ({})", stress))?;

        tracing::info!(
            cycles = summary.cycles,
            reports = summary.reports,
            overflowed = summary.overflowed_rounds,
            "Traversal complete"
        );
    }

    Ok(())
}

fn print_configuration(config: &RunConfig) {
    println!("Device:          {}", config.device.display());
    println!("Clock:           {}", config.clock);
    println!("Report interval: {}s", config.report_interval_secs);
    println!(
        "Open flags:      {}",
        if config.open_flags.direct {
            "O_DIRECT|O_SYNC|O_DSYNC"
        } else {
            "O_SYNC|O_DSYNC"
        }
    );
    match config.alignment {
        Some(alignment) => println!("Alignment:       {}", alignment),
        None => println!("Alignment:       page size"),
    }
    println!("Combinations:    {}", config.matrix.len());
    for combo in config.matrix.combinations() {
        println!(
            "  jump={} read={} write={}",
            combo.jump_increment, combo.read_size, combo.write_size
        );
    }
}
