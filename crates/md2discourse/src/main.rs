mod logging;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{CommandFactory, Parser};
use md2discourse_core::api::{DiscourseApi, DiscourseClient};
use md2discourse_core::config::{CONFIG_FILENAME, DiscourseConfig, load_config};
use md2discourse_core::import::{ImportReport, import_directory, import_file};
use md2discourse_core::markdown::preview_file;
use md2discourse_core::site::{list_categories, test_connection};
use tracing::debug;

#[derive(Debug, Parser)]
#[command(
    name = "md2discourse",
    version,
    about = "Import Markdown files into Discourse"
)]
struct Cli {
    #[arg(short = 'c', long, value_name = "ID", help = "Category ID for the Discourse posts")]
    category: Option<u64>,
    #[arg(short = 'd', long, value_name = "PATH", help = "Directory containing Markdown files")]
    directory: Option<PathBuf>,
    #[arg(short = 'f', long, value_name = "PATH", help = "Path to a single Markdown file")]
    file: Option<PathBuf>,
    #[arg(short = 'l', long, help = "List available categories in Discourse")]
    list_categories: bool,
    #[arg(short = 't', long, help = "Test connection to Discourse")]
    test_connection: bool,
    #[arg(long, help = "Log requests and responses exchanged with the Discourse API")]
    debug: bool,
    #[arg(
        long,
        value_name = "PATH",
        help = "Preview the processing of a single Markdown file"
    )]
    preview: Option<PathBuf>,
    #[arg(
        long,
        value_name = "PATH",
        default_value = CONFIG_FILENAME,
        help = "Path to the JSON config with Discourse credentials"
    )]
    config: PathBuf,
}

#[derive(Debug)]
enum Mode {
    Preview(PathBuf),
    ListCategories,
    TestConnection,
    ImportFile { category: u64, path: PathBuf },
    ImportDirectory { category: u64, path: PathBuf },
    Help,
}

impl Mode {
    /// First matching flag wins, mirroring the order the options are documented in.
    fn from_cli(cli: &Cli) -> Self {
        if let Some(path) = &cli.preview {
            return Self::Preview(path.clone());
        }
        if cli.list_categories {
            return Self::ListCategories;
        }
        if cli.test_connection {
            return Self::TestConnection;
        }
        match (cli.category, &cli.file, &cli.directory) {
            (Some(category), Some(path), _) => Self::ImportFile {
                category,
                path: path.clone(),
            },
            (Some(category), None, Some(path)) => Self::ImportDirectory {
                category,
                path: path.clone(),
            },
            _ => Self::Help,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();
    logging::init_logging(cli.debug);

    let config = load_config(&cli.config)?;
    let mode = Mode::from_cli(&cli);
    debug!(?mode, url = config.base_url(), "dispatching");

    match mode {
        Mode::Preview(path) => run_preview(&path),
        Mode::ListCategories => run_list_categories(&config),
        Mode::TestConnection => run_test_connection(&config),
        Mode::ImportFile { category, path } => run_import_file(&config, &path, category),
        Mode::ImportDirectory { category, path } => {
            run_import_directory(&config, &path, category)
        }
        Mode::Help => {
            let mut command = Cli::command();
            command.print_help()?;
            println!();
            Ok(())
        }
    }
}

fn run_preview(path: &Path) -> Result<()> {
    let topic = preview_file(path)?;
    println!("Previewing '{}':", normalize_path(path));
    println!("Discourse Topic Title:");
    println!("{}", topic.title);
    println!();
    println!("Discourse Topic Content:");
    println!("{}", topic.content);
    Ok(())
}

fn run_list_categories(config: &DiscourseConfig) -> Result<()> {
    let mut client = DiscourseClient::from_config(config)?;
    for group in list_categories(&mut client)? {
        for line in group.lines() {
            println!("{line}");
        }
    }
    Ok(())
}

fn run_test_connection(config: &DiscourseConfig) -> Result<()> {
    let mut client = DiscourseClient::from_config(config)?;
    println!("{}", test_connection(&mut client));
    Ok(())
}

fn run_import_file(config: &DiscourseConfig, path: &Path, category: u64) -> Result<()> {
    let mut client = DiscourseClient::from_config(config)?;
    let report = import_file(&mut client, path, category, &mut print_importing)?;
    log_report(&report)?;
    Ok(())
}

fn run_import_directory(config: &DiscourseConfig, directory: &Path, category: u64) -> Result<()> {
    let mut client = DiscourseClient::from_config(config)?;
    let reports = import_directory(&mut client, directory, category, &mut print_importing)?;
    for report in &reports {
        log_report(report)?;
    }
    debug!(
        imported = reports.len(),
        requests = client.request_count(),
        "directory import finished"
    );
    Ok(())
}

fn print_importing(title: &str) {
    println!("Importing \"{title}\"...");
}

fn log_report(report: &ImportReport) -> Result<()> {
    debug!(
        path = %normalize_path(&report.path),
        duplicate = report.duplicate,
        tagged = report.tagged,
        response = %serde_json::to_string(&report.response)?,
        "post response"
    );
    Ok(())
}

fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
