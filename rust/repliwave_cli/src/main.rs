mod cli;
mod commands;
mod error;

use clap::Parser;
use tracing::subscriber::set_global_default;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::Registry;

use crate::cli::{
    Args,
    Commands,
};
use crate::commands::{
    main_adjacent_peaks,
    main_domains,
    main_fit,
    main_heatmap,
    main_height_sweep,
    main_isolated_peaks,
    main_peak_growth,
    main_peaks,
    main_region,
    main_valleys,
    main_write_template,
};
use crate::error::CliError;

// Without it everything is extremely slow on windows
#[cfg(target_os = "windows")]
use mimalloc::MiMalloc;

#[cfg(target_os = "windows")]
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn main() -> Result<(), CliError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = Registry::default()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_span_events(FmtSpan::CLOSE));

    set_global_default(subscriber)?;
    let args = Args::parse();

    match args.command {
        Some(Commands::Region(args)) => main_region(args)?,
        Some(Commands::Heatmap(args)) => main_heatmap(args)?,
        Some(Commands::Peaks(args)) => main_peaks(args)?,
        Some(Commands::Domains(args)) => main_domains(args)?,
        Some(Commands::IsolatedPeaks(args)) => main_isolated_peaks(args)?,
        Some(Commands::PeakGrowth(args)) => main_peak_growth(args)?,
        Some(Commands::Fit(args)) => main_fit(args)?,
        Some(Commands::Valleys(args)) => main_valleys(args)?,
        Some(Commands::AdjacentPeaks(args)) => main_adjacent_peaks(args)?,
        Some(Commands::HeightSweep(args)) => main_height_sweep(args)?,
        Some(Commands::WriteTemplate(args)) => main_write_template(args)?,
        None => {
            println!("No command provided");
        }
    }
    Ok(())
}
