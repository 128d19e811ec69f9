use indicatif::{
    ParallelProgressIterator,
    ProgressStyle,
};
use rayon::prelude::*;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::{
    Path,
    PathBuf,
};
use std::time::Instant;
use tabled::{
    Table,
    Tabled,
};
use tracing::{
    info,
    instrument,
    warn,
};

use repliwave::analytics::{
    DomainPeakCount,
    GrowthMethod,
    GrowthSeries,
    GrowthSummary,
    RankTally,
    SimilaritySummary,
};
use repliwave::serde::{
    read_peak_list,
    read_signal_matrix,
    read_timing_track,
    write_growth_report,
};
use repliwave::utils::MeanStdev;
use repliwave::{
    AnalysisConfig,
    DataCentre,
    Peak,
    PeakRegion,
    RegionResponse,
    RegionStats,
    TimingDomain,
};

use crate::cli::{
    CurveModel,
    DataArgs,
    FitArgs,
    PeakGrowthArgs,
    PeaksArgs,
    RegionArgs,
    RegionCoordinates,
    WriteTemplateArgs,
};
use crate::error::CliError;

const PROGRESS_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})";

/// Reads the configuration file, if any, and applies the command line
/// overrides on top of it.
pub fn analysis_config(args: &DataArgs) -> Result<AnalysisConfig, CliError> {
    let mut config: AnalysisConfig = match &args.config {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => AnalysisConfig::default(),
    };
    if let Some(width) = args.peak_width_kb {
        config.wavelet_peak_width_kb = width;
    }
    if let Some(time_series) = &args.time_series {
        config.time_series = time_series.clone();
    }
    Ok(config)
}

/// Loads both inputs and selects the requested dataset. Returns the centre
/// with the name of the dataset to analyse.
#[instrument(skip_all)]
pub fn load_data_centre(args: &DataArgs) -> Result<(DataCentre, String), CliError> {
    let start = Instant::now();
    let timing = read_timing_track(&args.timing_track)?;
    let mut centre = read_signal_matrix(&args.signal_matrix)?.into_data_centre(timing)?;
    if let Some(dataset) = &args.dataset {
        centre.set_active_dataset(dataset)?;
    }
    let dataset = centre.active_dataset_name().to_string();
    info!(
        "Loaded {} datasets in {:?}, analysing {}",
        centre.dataset_names().len(),
        start.elapsed(),
        dataset
    );
    Ok((centre, dataset))
}

fn write_json<T: Serialize>(output_dir: &Path, file_name: &str, value: &T) -> Result<PathBuf, CliError> {
    std::fs::create_dir_all(output_dir)?;
    let path = output_dir.join(file_name);
    let writer = BufWriter::new(File::create(&path)?);
    serde_json::to_writer_pretty(writer, value)?;
    println!("Wrote to {}", path.display());
    Ok(path)
}

fn domains_of(centre: &DataCentre, args: &PeaksArgs) -> Vec<TimingDomain> {
    args.domains
        .domain_types()
        .into_iter()
        .flat_map(|t| {
            centre
                .timing_domains()
                .domains_matching(t, args.min_domain_kb)
        })
        .collect()
}

fn region_error(region: &RegionCoordinates) -> CliError {
    CliError::DataProcessing(format!(
        "Region {}:{}-{} kb does not fit on the chromosome",
        region.chromosome, region.start_kb, region.end_kb
    ))
}

#[derive(Debug, Serialize)]
struct RegionReport {
    chromosome: String,
    start_kb: f64,
    end_kb: f64,
    peak_width_kb: f64,
    values: Vec<f64>,
    stats: RegionStats,
    response: Option<RegionResponse>,
    timing_levels: Vec<f64>,
    peaks: Vec<Peak>,
}

/// Main function for the 'region' subcommand.
#[instrument(skip_all)]
pub fn main_region(args: RegionArgs) -> Result<(), CliError> {
    let config = analysis_config(&args.data)?;
    let (mut centre, dataset) = load_data_centre(&args.data)?;
    let RegionCoordinates {
        chromosome,
        start_kb,
        end_kb,
    } = args.region;
    let width = config.wavelet_peak_width_kb;

    let response = centre.analyse_region(&dataset, &chromosome, start_kb, end_kb, width)?;
    if response.is_none() {
        warn!("No wavelet response for {}:{}-{}", chromosome, start_kb, end_kb);
    }
    let report = RegionReport {
        values: centre
            .region_values(&dataset, &chromosome, start_kb, end_kb)?
            .to_vec(),
        stats: centre.region_stats(&dataset, &chromosome, start_kb, end_kb)?,
        timing_levels: centre
            .timing_domains()
            .timing_levels_in_region(&chromosome, start_kb, end_kb),
        peaks: centre.peaks_in_region(&dataset, &chromosome, start_kb, end_kb, width)?,
        response,
        chromosome,
        start_kb,
        end_kb,
        peak_width_kb: width,
    };
    info!("{} peaks in region", report.peaks.len());
    write_json(&args.data.output_path, "region.json", &report)?;
    Ok(())
}

/// Main function for the 'heatmap' subcommand.
#[instrument(skip_all)]
pub fn main_heatmap(args: RegionArgs) -> Result<(), CliError> {
    let (mut centre, dataset) = load_data_centre(&args.data)?;
    let region = &args.region;
    let heatmap = centre
        .response_heatmap(&dataset, &region.chromosome, region.start_kb, region.end_kb)?
        .ok_or_else(|| region_error(region))?;
    info!("Heatmap with {} peak widths", heatmap.peak_widths_kb.len());
    write_json(&args.data.output_path, "heatmap.json", &heatmap)?;
    Ok(())
}

/// Main function for the 'peaks' subcommand.
#[instrument(skip_all)]
pub fn main_peaks(args: PeaksArgs) -> Result<(), CliError> {
    let config = analysis_config(&args.data)?;
    let (mut centre, dataset) = load_data_centre(&args.data)?;
    let domains = domains_of(&centre, &args);
    let min_height = args.min_height.unwrap_or(f64::NEG_INFINITY);

    let peaks: Vec<Peak> = centre
        .peaks_in_timing_domains(&dataset, &domains, config.wavelet_peak_width_kb)?
        .into_iter()
        .filter(|p| p.peak_height >= min_height)
        .collect();
    info!("{} peaks in {} domains", peaks.len(), domains.len());
    write_json(&args.data.output_path, "peaks.json", &peaks)?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct DomainReport {
    domains: Vec<TimingDomain>,
    peak_counts: Vec<DomainPeakCount>,
    total_signal: Vec<f64>,
    peak_separations_kb: Vec<f64>,
    separation_summary: MeanStdev,
}

/// Main function for the 'domains' subcommand.
#[instrument(skip_all)]
pub fn main_domains(args: PeaksArgs) -> Result<(), CliError> {
    let config = analysis_config(&args.data)?;
    let (mut centre, dataset) = load_data_centre(&args.data)?;
    let domains = domains_of(&centre, &args);
    let min_height = args.min_height.unwrap_or(f64::NEG_INFINITY);
    let width = config.wavelet_peak_width_kb;

    let peak_counts = centre.peaks_per_timing_domain(&dataset, &domains, min_height, width)?;
    let total_signal = centre.total_signal_per_timing_domain(&dataset, &domains)?;
    let peak_separations_kb = centre.peak_separations(&dataset, &domains, min_height, width)?;
    let separation_summary = MeanStdev::from_values(&peak_separations_kb);
    info!(
        "{} domains, mean peak separation {:.1} kb",
        domains.len(),
        separation_summary.mean
    );
    let report = DomainReport {
        domains,
        peak_counts,
        total_signal,
        peak_separations_kb,
        separation_summary,
    };
    write_json(&args.data.output_path, "domains.json", &report)?;
    Ok(())
}

/// Main function for the 'isolated-peaks' subcommand.
#[instrument(skip_all)]
pub fn main_isolated_peaks(args: DataArgs) -> Result<(), CliError> {
    let config = analysis_config(&args)?;
    let (mut centre, dataset) = load_data_centre(&args)?;
    let peaks = centre.auto_isolated_peaks(&dataset, &config)?;
    write_json(&args.output_path, "isolated_peaks.json", &peaks)?;
    Ok(())
}

/// Main function for the 'peak-growth' subcommand.
#[instrument(skip_all)]
pub fn main_peak_growth(args: PeakGrowthArgs) -> Result<(), CliError> {
    let config = analysis_config(&args.data)?;
    let (mut centre, dataset) = load_data_centre(&args.data)?;
    let method = GrowthMethod::from(args.method);

    let peaks: Vec<PeakRegion> = match &args.peak_list {
        Some(path) => read_peak_list(path)?,
        None => centre
            .auto_isolated_peaks(&dataset, &config)?
            .iter()
            .map(PeakRegion::from)
            .collect(),
    };
    info!("Following {} peaks with {:?} widths", peaks.len(), method);

    let start = Instant::now();
    centre.prepare_growth(method, &config)?;
    let centre = &centre;
    let style = ProgressStyle::with_template(PROGRESS_TEMPLATE)?;
    let series = peaks
        .par_iter()
        .progress_with_style(style)
        .map(|peak| centre.peak_growth(peak, method, &config))
        .collect::<Result<Vec<GrowthSeries>, _>>()?;
    info!("Measured peak growth in {:?}", start.elapsed());

    std::fs::create_dir_all(&args.data.output_path)?;
    let report_path = args.data.output_path.join("peak_growth.tsv");
    write_growth_report(&report_path, &config.time_series, &series)?;
    println!("Wrote to {}", report_path.display());

    let summary = GrowthSummary::from_series(&series);
    println!("{}", Table::new(summary.rows(&config.time_series)));
    write_json(&args.data.output_path, "peak_growth_summary.json", &summary)?;
    Ok(())
}

/// Main function for the 'fit' subcommand.
#[instrument(skip_all)]
pub fn main_fit(args: FitArgs) -> Result<(), CliError> {
    let config = analysis_config(&args.data)?;
    let (centre, dataset) = load_data_centre(&args.data)?;
    let region = &args.region;
    let output = &args.data.output_path;

    match args.model {
        CurveModel::Gaussian => {
            let fit = centre
                .fit_gaussian(
                    &dataset,
                    &region.chromosome,
                    region.start_kb,
                    region.end_kb,
                    &config.gaussian_fit,
                )?
                .ok_or_else(|| CliError::DataProcessing("Gaussian fit failed".to_string()))?;
            println!("{:#?}", fit.curve);
            println!("FWHM: {:.1} kb", fit.full_width_at_half_max_kb());
            write_json(output, "fit.json", &fit)?;
        }
        CurveModel::FlatTopped => {
            let fit = centre
                .fit_flat_topped_gaussian(
                    &dataset,
                    &region.chromosome,
                    region.start_kb,
                    region.end_kb,
                    &config.flat_topped_fit,
                )?
                .ok_or_else(|| CliError::DataProcessing("Flat-topped Gaussian fit failed".to_string()))?;
            println!("{:#?}", fit.curve);
            println!("FWHM: {:.1} kb", fit.full_width_at_half_max_kb());
            write_json(output, "fit.json", &fit)?;
        }
    }
    Ok(())
}

#[derive(Debug, Tabled)]
struct ValleyRow {
    dataset: String,
    valleys: usize,
    mean_pct: String,
    min_pct: String,
}

/// Main function for the 'valleys' subcommand.
#[instrument(skip_all)]
pub fn main_valleys(args: DataArgs) -> Result<(), CliError> {
    let config = analysis_config(&args)?;
    let (mut centre, _) = load_data_centre(&args)?;
    let series = centre.valley_signal_series(&config)?;

    let rows: Vec<ValleyRow> = series
        .time_points
        .iter()
        .map(|t| {
            let mean = t.mean_summary();
            let min = t.min_summary();
            ValleyRow {
                dataset: t.dataset.clone(),
                valleys: mean.n,
                mean_pct: format!("{:.1} +- {:.1}", mean.mean, mean.stdev),
                min_pct: format!("{:.1} +- {:.1}", min.mean, min.stdev),
            }
        })
        .collect();
    println!("{}", Table::new(rows));
    write_json(&args.output_path, "valleys.json", &series)?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct AdjacentPeaksReport {
    groups: usize,
    neighbouring_heights: Vec<(f64, f64)>,
    size_sequences: Vec<Vec<usize>>,
    rank_tally: RankTally,
    similarity_between_adjacent_peaks: Vec<f64>,
    similarity_summary: Option<SimilaritySummary>,
}

/// Main function for the 'adjacent-peaks' subcommand.
#[instrument(skip_all)]
pub fn main_adjacent_peaks(args: DataArgs) -> Result<(), CliError> {
    let config = analysis_config(&args)?;
    let (mut centre, dataset) = load_data_centre(&args)?;
    let early = centre.timing_domains().early_domains();
    let groups = centre.adjacent_peak_groups(
        &dataset,
        &early,
        config.wavelet_peak_width_kb,
        config.max_peak_separation_kb,
    )?;

    let size_sequences = centre.size_sequences_of_adjacent_peaks(&dataset, &groups)?;
    let rank_tally = RankTally::from_sequences(&size_sequences);
    let similarities = centre.group_similarities(&dataset, &groups)?;
    let similarity_summary = SimilaritySummary::from_groups(&similarities, 3);

    println!("{}", Table::new(rank_tally.rows()));
    match &similarity_summary {
        Some(summary) => println!("{}", Table::new([*summary])),
        None => warn!("No group with more than 3 peaks to summarize"),
    }

    let report = AdjacentPeaksReport {
        groups: groups.len(),
        neighbouring_heights: centre.neighbouring_peak_heights(&dataset, &groups)?,
        similarity_between_adjacent_peaks: centre.similarity_between_adjacent_peaks(&dataset, &groups)?,
        size_sequences,
        rank_tally,
        similarity_summary,
    };
    write_json(&args.output_path, "adjacent_peaks.json", &report)?;
    Ok(())
}

/// Main function for the 'height-sweep' subcommand.
#[instrument(skip_all)]
pub fn main_height_sweep(args: DataArgs) -> Result<(), CliError> {
    let config = analysis_config(&args)?;
    let (mut centre, dataset) = load_data_centre(&args)?;
    let sweep = centre.height_cutoff_sweep(&dataset, config.wavelet_peak_width_kb)?;
    if sweep.is_empty() {
        warn!("No peaks in late domains, nothing to sweep");
    }
    write_json(&args.output_path, "height_sweep.json", &sweep)?;
    Ok(())
}

/// Main function for the 'write-template' subcommand.
pub fn main_write_template(args: WriteTemplateArgs) -> Result<(), CliError> {
    write_json(
        &args.output_path,
        "analysis_config.json",
        &AnalysisConfig::default(),
    )?;
    Ok(())
}
