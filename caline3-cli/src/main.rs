use caline3_core::core_types::PartsPerMillion;
use caline3_core::{
    compute_job, render, summarize, Caline3Result, ConcentrationMatrix, Job, JobReader, MeteoResult,
    ReportConfig, RunConfig,
};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Output layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Classic CALINE3 printout, one page per meteorology
    Text,
    /// One JSON document with every job and scenario
    Json,
}

/// CALINE3 line source dispersion model
#[derive(Parser, Debug)]
#[command(name = "caline3")]
#[command(about = "Roadway pollutant concentrations with the CALINE3 dispersion model", long_about = None)]
struct Args {
    /// CALINE3 input deck ("-" reads standard input)
    input: PathBuf,

    /// Output layout
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Pollutant molecular weight in g/mol (28 for CO)
    #[arg(short = 'm', long, default_value_t = ReportConfig::CO_MOLECULAR_WEIGHT)]
    molecular_weight: f64,

    /// Decimal digits kept in reported concentrations
    #[arg(short, long, default_value_t = 1)]
    digits: u32,

    /// Evaluate on the calling thread only
    #[arg(long)]
    sequential: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn report_config(&self) -> ReportConfig {
        ReportConfig {
            molecular_weight: self.molecular_weight,
            digits: self.digits,
        }
    }

    fn run_config(&self) -> RunConfig {
        if self.sequential {
            RunConfig::sequential()
        } else {
            RunConfig::default()
        }
    }
}

/// JSON form of one job's results
#[derive(Serialize)]
struct JobReport<'a> {
    title: &'a str,
    run: &'a str,
    meteorology: Vec<MeteoResult>,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn open_input(path: &Path) -> io::Result<Box<dyn BufRead>> {
    if path.as_os_str() == "-" {
        Ok(Box::new(BufReader::new(io::stdin())))
    } else {
        Ok(Box::new(BufReader::new(File::open(path)?)))
    }
}

/// Every scenario of one job, with the time spent computing it
fn compute_timed(job: &Job, config: &RunConfig) -> Caline3Result<(Vec<ConcentrationMatrix>, Duration)> {
    let start = Instant::now();
    let matrices = compute_job(job, config)?;
    let elapsed = start.elapsed();
    info!(
        job = job.title(),
        run = job.run(),
        elapsed_us = elapsed.as_micros(),
        "Job computation time (excl. I/O)"
    );
    Ok((matrices, elapsed))
}

/// Text pages of one job
fn render_job(job: &Job, matrices: &[ConcentrationMatrix], config: &ReportConfig) -> String {
    let pages: Vec<String> = job
        .meteos()
        .iter()
        .zip(matrices)
        .map(|(meteo, matrix)| render(job, meteo, matrix, config))
        .collect();
    pages.join("\n")
}

fn summarize_job<'a>(job: &'a Job, matrices: &[ConcentrationMatrix], config: &ReportConfig) -> JobReport<'a> {
    JobReport {
        title: job.title(),
        run: job.run(),
        meteorology: job
            .meteos()
            .iter()
            .zip(matrices)
            .map(|(meteo, matrix)| summarize(job, meteo, matrix, config))
            .collect(),
    }
}

fn validate(args: &Args) -> Result<(), String> {
    if !(args.molecular_weight.is_finite() && args.molecular_weight > 0.0) {
        return Err(format!("molecular weight must be positive, got {}", args.molecular_weight));
    }
    if args.digits > PartsPerMillion::MAX_DIGITS {
        return Err(format!(
            "digits must be at most {}, got {}",
            PartsPerMillion::MAX_DIGITS,
            args.digits
        ));
    }
    Ok(())
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    validate(args)?;

    let jobs = JobReader::new(open_input(&args.input)?).collect::<Result<Vec<_>, _>>()?;
    info!(jobs = jobs.len(), input = %args.input.display(), "Read input");

    let run_config = args.run_config();
    let report_config = args.report_config();
    let mut total = Duration::ZERO;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match args.format {
        Format::Text => {
            for job in &jobs {
                let (matrices, elapsed) = compute_timed(job, &run_config)?;
                total += elapsed;
                writeln!(out, "{}", render_job(job, &matrices, &report_config))?;
            }
        }
        Format::Json => {
            let mut reports = Vec::with_capacity(jobs.len());
            for job in &jobs {
                let (matrices, elapsed) = compute_timed(job, &run_config)?;
                total += elapsed;
                reports.push(summarize_job(job, &matrices, &report_config));
            }
            serde_json::to_writer_pretty(&mut out, &reports)?;
            writeln!(out)?;
        }
    }

    info!(elapsed_us = total.as_micros(), "Total computation time (excl. I/O)");
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("caline3: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["caline3", "deck.dat"]).unwrap();
        assert_eq!(args.format, Format::Text);
        assert_eq!(args.report_config(), ReportConfig::default());
        assert_eq!(args.run_config(), RunConfig::default());
        assert_eq!(args.verbose, 0);
    }

    #[test]
    fn test_options() {
        let args = Args::try_parse_from([
            "caline3",
            "-",
            "--format",
            "json",
            "--molecular-weight",
            "46",
            "--digits",
            "3",
            "--sequential",
            "-vv",
        ])
        .unwrap();
        assert_eq!(args.input, PathBuf::from("-"));
        assert_eq!(args.format, Format::Json);
        assert_eq!(args.report_config().molecular_weight, 46.0);
        assert_eq!(args.report_config().digits, 3);
        assert_eq!(args.run_config(), RunConfig::sequential());
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_validate_bounds_digits_and_molecular_weight() {
        let parse = |extra: &[&str]| {
            let mut argv = vec!["caline3", "deck.dat"];
            argv.extend_from_slice(extra);
            Args::try_parse_from(argv).unwrap()
        };

        assert!(validate(&parse(&[])).is_ok());
        assert!(validate(&parse(&["--digits", "15"])).is_ok());

        let err = validate(&parse(&["--digits", "309"])).unwrap_err();
        assert!(err.contains("digits"), "{err}");
        assert!(validate(&parse(&["-m", "0"])).is_err());
        assert!(validate(&parse(&["--molecular-weight=-28"])).is_err());
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        assert!(Args::try_parse_from(["caline3", "deck.dat", "--format", "xml"]).is_err());
    }

    #[test]
    fn test_json_report_shape() {
        let input = "\
DEMO                                     60. 10.   0.   0. 1        1.
R1                         30.        0.       1.8
RUN                                       1  1
L1                  AG     0.  -500.     0.   500.   1000. 10.  0. 10.
1. 270.4 1000. 0.0
";
        let job = JobReader::new(input.as_bytes()).read().unwrap().unwrap();
        let args = Args::try_parse_from(["caline3", "-", "--format", "json"]).unwrap();
        let (matrices, _) = compute_timed(&job, &args.run_config()).unwrap();
        let report = summarize_job(&job, &matrices, &args.report_config());
        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(value["title"], "DEMO");
        assert_eq!(value["run"], "RUN");
        assert_eq!(value["meteorology"].as_array().unwrap().len(), 1);
        assert_eq!(value["meteorology"][0]["receptors"][0]["receptor"], "R1");
    }
}
