extern crate rc_demand;

use anyhow::Context;
use clap::Parser;
use rc_demand::output::FileOutput;
use rc_demand::read_weather_file::weather_data_to_vec;
use rc_demand::run_project;
use std::fs::{create_dir_all, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Parser, Default, Debug)]
#[clap(author, version, about, long_about = None)]
struct DemandArgs {
    input_file: String,
    #[arg(long, short)]
    epw_file: Option<String>,
    /// Directory for the output tables, defaults to a "<input>_results" directory beside the
    /// input file
    #[arg(long, short)]
    output_dir: Option<PathBuf>,
    #[arg(long, default_value_t = false)]
    log_spans: bool,
    #[arg(long, short, default_value_t = false)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = DemandArgs::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        })
        .with_span_events(if args.log_spans {
            FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        })
        .init();

    let input_file = args.input_file.as_str();
    let input_file_stem = Path::new(input_file)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(input_file);
    let output_dir = args.output_dir.unwrap_or_else(|| {
        Path::new(input_file)
            .with_file_name(format!("{input_file_stem}_results"))
    });
    create_dir_all(&output_dir)
        .with_context(|| format!("Could not create output directory {output_dir:?}"))?;

    let weather_file = args
        .epw_file
        .map(|file| {
            let reader = BufReader::new(
                File::open(&file).with_context(|| format!("Could not open weather file {file}"))?,
            );
            weather_data_to_vec(reader).with_context(|| format!("Could not parse weather file {file}"))
        })
        .transpose()?;

    run_project(
        BufReader::new(File::open(Path::new(input_file))?),
        FileOutput::new(output_dir, "{}.csv".to_string()),
        weather_file,
        &AtomicBool::new(false),
    )
}
