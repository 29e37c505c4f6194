use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use piomas_fetch::app::{ConvertOptions, Downloader, FetchOptions};
use piomas_fetch::catalog;
use piomas_fetch::config::{ConfigLoader, ResolvedConfig};
use piomas_fetch::domain::ByteOrder;
use piomas_fetch::error::PiomasError;
use piomas_fetch::output::JsonOutput;
use piomas_fetch::psc::{DEFAULT_BASE_URL, PscHttpClient};

#[derive(Parser)]
#[command(name = "piomas-dl")]
#[command(about = "Download PIOMAS sea-ice model output and convert it to NetCDF")]
#[command(version, author)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Download raw data files")]
    Download(DownloadArgs),
    #[command(about = "Gunzip downloaded archives in place")]
    Unzip(JobArgs),
    #[command(about = "Convert raw files to a NetCDF container")]
    Convert(ConvertArgs),
    #[command(about = "Download, unzip and convert in one go")]
    Run(RunArgs),
    #[command(about = "List supported variables")]
    Variables,
}

#[derive(Args)]
struct JobArgs {
    #[arg(long, help = "Path to a piomas.json job file")]
    config: Option<String>,

    #[arg(long, help = "Directory for raw data files")]
    dest: Option<String>,

    #[arg(
        long,
        value_delimiter = ',',
        help = "Variable short names, or 'all'"
    )]
    variables: Vec<String>,

    #[arg(long, value_delimiter = ',', help = "Years to process")]
    years: Vec<i32>,

    #[arg(long, help = "Override the PSC base URL")]
    base_url: Option<String>,
}

#[derive(Args)]
struct DownloadArgs {
    #[command(flatten)]
    job: JobArgs,

    #[arg(long, help = "Re-download files that already exist")]
    force: bool,
}

#[derive(Args)]
struct ConvertArgs {
    #[command(flatten)]
    job: JobArgs,

    #[arg(long, help = "Output NetCDF file")]
    output: Option<String>,

    #[arg(long, help = "Skip the year-stacking pass")]
    no_stack: bool,

    #[arg(long, value_enum, help = "Byte order of the raw records")]
    byte_order: Option<ByteOrder>,
}

#[derive(Args)]
struct RunArgs {
    #[command(flatten)]
    convert: ConvertArgs,

    #[arg(long, help = "Re-download files that already exist")]
    force: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(report) => {
            eprintln!("{report:?}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> miette::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Download(args) => {
            let job = resolve_job(&args.job)?;
            let downloader = build_downloader(&job)?;
            let report = downloader
                .download(&FetchOptions {
                    skip_existing: !args.force,
                })
                .into_diagnostic()?;
            JsonOutput::print_download(&report).into_diagnostic()?;
        }
        Commands::Unzip(args) => {
            let job = resolve_job(&args)?;
            let downloader = build_downloader(&job)?;
            let report = downloader.unzip(true).into_diagnostic()?;
            JsonOutput::print_unzip(&report).into_diagnostic()?;
        }
        Commands::Convert(args) => {
            let job = resolve_job(&args.job)?;
            let downloader = build_downloader(&job)?;
            let report = downloader
                .to_netcdf(&output_path(&args, &job), &convert_options(&args, &job))
                .into_diagnostic()?;
            JsonOutput::print_convert(&report).into_diagnostic()?;
        }
        Commands::Run(args) => {
            let job = resolve_job(&args.convert.job)?;
            let downloader = build_downloader(&job)?;
            let report = downloader
                .download(&FetchOptions {
                    skip_existing: !args.force,
                })
                .into_diagnostic()?;
            JsonOutput::print_download(&report).into_diagnostic()?;
            let report = downloader.unzip(true).into_diagnostic()?;
            JsonOutput::print_unzip(&report).into_diagnostic()?;
            let report = downloader
                .to_netcdf(
                    &output_path(&args.convert, &job),
                    &convert_options(&args.convert, &job),
                )
                .into_diagnostic()?;
            JsonOutput::print_convert(&report).into_diagnostic()?;
        }
        Commands::Variables => {
            for desc in catalog::CATALOG {
                println!("{:<12} {}", desc.short_name, desc.long_name);
            }
        }
    }

    Ok(())
}

fn resolve_job(args: &JobArgs) -> miette::Result<ResolvedConfig> {
    if args.config.is_none()
        && args.dest.is_some()
        && !args.variables.is_empty()
        && !args.years.is_empty()
    {
        let variables = if args.variables.len() == 1 && args.variables[0] == "all" {
            catalog::supported_names()
                .map(|name| name.parse())
                .collect::<Result<Vec<_>, PiomasError>>()
                .into_diagnostic()?
        } else {
            args.variables
                .iter()
                .map(|name| name.parse())
                .collect::<Result<Vec<_>, PiomasError>>()
                .into_diagnostic()?
        };

        return Ok(ResolvedConfig {
            schema_version: 1,
            dest_dir: Utf8PathBuf::from(args.dest.clone().unwrap_or_default()),
            output: None,
            variables,
            years: args.years.clone(),
            byte_order: ByteOrder::default(),
            base_url: args
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        });
    }

    ConfigLoader::resolve(args.config.as_deref()).into_diagnostic()
}

fn build_downloader(job: &ResolvedConfig) -> miette::Result<Downloader<PscHttpClient>> {
    let client = PscHttpClient::new().into_diagnostic()?;
    Ok(Downloader::new(
        client,
        job.dest_dir.clone(),
        job.base_url.clone(),
        job.variables.clone(),
        job.years.clone(),
    ))
}

fn output_path(args: &ConvertArgs, job: &ResolvedConfig) -> Utf8PathBuf {
    args.output
        .as_ref()
        .map(Utf8PathBuf::from)
        .or_else(|| job.output.clone())
        .unwrap_or_else(|| job.dest_dir.join("piomas.nc"))
}

fn convert_options(args: &ConvertArgs, job: &ResolvedConfig) -> ConvertOptions {
    ConvertOptions {
        stack_years: !args.no_stack,
        byte_order: args.byte_order.unwrap_or(job.byte_order),
    }
}
