use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use meta_finder::app::{App, NoopSink, Overview};
use meta_finder::assembler::{ResultAssembler, SearchResponse};
use meta_finder::config::{ConfigLoader, Overrides, SourceSpec};
use meta_finder::error::FinderError;
use meta_finder::fuzzy::LevenshteinMatcher;
use meta_finder::output::{JsonOutput, OutputMode};
use meta_finder::source::{Manifest, ManifestSource};
use meta_finder::tui::Tui;

#[derive(Parser)]
#[command(name = "meta-finder")]
#[command(about = "Fuzzy search over object-storage metadata and tags")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    non_interactive: bool,

    #[arg(long, global = true)]
    config: Option<String>,

    #[arg(long, global = true, conflicts_with = "manifest_url")]
    manifest: Option<String>,

    #[arg(long, global = true)]
    manifest_url: Option<String>,

    #[arg(long, global = true)]
    base_url: Option<String>,

    #[arg(long, global = true)]
    threshold: Option<f64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Index all buckets and run one query")]
    Search(SearchArgs),
    #[command(about = "Index all buckets and show files, metadata and tags")]
    Index,
    #[command(about = "Write the demo data set as a manifest")]
    Seed(SeedArgs),
}

#[derive(Args)]
struct SearchArgs {
    #[arg(required = true, num_args = 1..)]
    query: Vec<String>,
}

#[derive(Args)]
struct SeedArgs {
    #[arg(long, default_value = "manifest.json")]
    output: String,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<FinderError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &FinderError) -> u8 {
    match error {
        FinderError::MissingConfig
        | FinderError::ConfigRead(_)
        | FinderError::ConfigParse(_)
        | FinderError::InvalidThreshold(_)
        | FinderError::InvalidBaseUrl(_) => 2,
        FinderError::StorageUnavailable { .. }
        | FinderError::ManifestHttp(_)
        | FinderError::ManifestStatus { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    if let Some(Commands::Seed(args)) = &cli.command {
        return run_seed(args, output_mode);
    }

    let overrides = Overrides {
        base_url: cli.base_url.clone(),
        threshold: cli.threshold,
        source: match (&cli.manifest, &cli.manifest_url) {
            (Some(path), _) => Some(SourceSpec::Manifest(Utf8PathBuf::from(path))),
            (None, Some(url)) => Some(SourceSpec::Url(url.clone())),
            (None, None) => None,
        },
    };
    let resolved = ConfigLoader::resolve(cli.config.as_deref(), overrides)?;

    let source = match &resolved.source {
        SourceSpec::Manifest(path) => ManifestSource::from_path(path.clone()),
        SourceSpec::Url(url) => ManifestSource::from_url(url)?,
    };
    let matcher = LevenshteinMatcher::new(resolved.threshold)?;
    let assembler = ResultAssembler::new(&resolved.base_url)?;
    let app = App::new(source, matcher, assembler);

    tracing::info!(source = %app.source().describe(), "indexing");
    let overview = app.index(&NoopSink)?;

    match cli.command {
        Some(Commands::Search(args)) => {
            let query = args.query.join(" ");
            let response = app.search(&query, &NoopSink);
            match output_mode {
                OutputMode::NonInteractive => JsonOutput::print_search(&response).into_diagnostic(),
                OutputMode::Interactive => {
                    print_search_summary(&query, &response);
                    Ok(())
                }
            }
        }
        Some(Commands::Index) => match output_mode {
            OutputMode::NonInteractive => JsonOutput::print_overview(&overview).into_diagnostic(),
            OutputMode::Interactive => {
                print_overview_summary(&overview);
                Ok(())
            }
        },
        Some(Commands::Seed(_)) => Ok(()),
        None => match output_mode {
            OutputMode::Interactive => Tui::new(Some(overview)).run(&app),
            OutputMode::NonInteractive => Err(miette::Report::msg(
                "command required (try `meta-finder --help`)",
            )),
        },
    }
}

fn run_seed(args: &SeedArgs, output_mode: OutputMode) -> miette::Result<()> {
    let path = Utf8PathBuf::from(&args.output);
    let manifest = Manifest::sample();
    manifest.write_atomic(&path)?;
    match output_mode {
        OutputMode::NonInteractive => {
            let value = serde_json::json!({
                "written": path.as_str(),
                "objects": manifest.object_count(),
            });
            println!("{value}");
        }
        OutputMode::Interactive => {
            println!(
                "\x1b[32mWrote {} sample objects to {path}\x1b[0m",
                manifest.object_count()
            );
        }
    }
    Ok(())
}

fn print_search_summary(query: &str, response: &SearchResponse) {
    let green = "\x1b[32m";
    let yellow = "\x1b[33m";
    let cyan = "\x1b[36m";
    let reset = "\x1b[0m";

    println!("{cyan}meta-finder: '{query}'{reset}");
    if response.is_empty() {
        println!("{yellow}no match{reset}");
        return;
    }
    println!("{green}{} files matched{reset}", response.results.len());
    for item in &response.results {
        println!("{cyan}• {}{reset}", item.filename);
        println!("   url:      {}", item.url);
        println!("   metadata: {}", item.metadata);
        println!("   tags:     {}", item.tags);
        println!("{green}   match:    {}{reset}", item.matches.join(", "));
    }
}

fn print_overview_summary(overview: &Overview) {
    let cyan = "\x1b[36m";
    let reset = "\x1b[0m";

    println!(
        "{cyan}Index built {}{reset}",
        overview.built_at.as_deref().unwrap_or("-")
    );
    println!("Files: {:?}", overview.files);
    println!("Metadata: {:?}", overview.metadata_keys);
    println!("Tags: {:?}", overview.tag_keys);
    println!(
        "{cyan}{} files · {} metadata keys ({} entries) · {} tag keys ({} entries){reset}",
        overview.stats.files,
        overview.stats.metadata_keys,
        overview.stats.metadata_entries,
        overview.stats.tag_keys,
        overview.stats.tag_entries
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_exit_with_two() {
        assert_eq!(map_exit_code(&FinderError::MissingConfig), 2);
        assert_eq!(map_exit_code(&FinderError::InvalidThreshold(1.5)), 2);
        assert_eq!(
            map_exit_code(&FinderError::InvalidBaseUrl("http://".to_string())),
            2
        );
    }

    #[test]
    fn storage_errors_exit_with_three() {
        assert_eq!(map_exit_code(&FinderError::storage("test", "*", "down")), 3);
        assert_eq!(
            map_exit_code(&FinderError::ManifestHttp("refused".to_string())),
            3
        );
        assert_eq!(
            map_exit_code(&FinderError::InvalidCatalogKey("x".to_string())),
            1
        );
    }
}
