//! artifact-resolver CLI

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;

use artifact_resolver::{
    ArtifactResolver, Coordinate, FixSuggestion, RemoteRepo, RepositoryConfig, ResolverError,
};

#[derive(Parser)]
#[command(name = "artifact-resolver")]
#[command(about = "Resolve versioned artifacts into a local repository")]
#[command(version)]
struct Cli {
    /// Configuration file (.yaml/.yml or .toml)
    #[arg(short, long, global = true, env = "ARTIFACT_RESOLVER_CONFIG")]
    config: Option<PathBuf>,

    /// Override the local repository directory
    #[arg(long, global = true)]
    local_repo: Option<PathBuf>,

    /// Add a remote repository as name=url (repeatable, appended in order)
    #[arg(long = "repo", value_name = "NAME=URL", global = true, value_parser = parse_repo)]
    repos: Vec<(String, String)>,

    /// Do not access the network
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve an artifact and print its local path
    Resolve {
        /// group:artifact[:extension[:classifier]]:version
        coordinate: String,

        /// Also resolve the artifact's POM
        #[arg(long)]
        resolve_pom: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration (passwords masked)
    Config,
}

fn parse_repo(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, url)) if !name.trim().is_empty() && !url.trim().is_empty() => {
            Ok((name.trim().to_string(), url.trim().to_string()))
        }
        _ => Err(format!("expected NAME=URL, got '{}'", s)),
    }
}

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        if let Some(suggestion) = e
            .downcast_ref::<ResolverError>()
            .and_then(FixSuggestion::fix_suggestion)
        {
            eprintln!("  {} {}", "Fix:".yellow(), suggestion);
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => RepositoryConfig::load(path)?,
        None => RepositoryConfig::default(),
    };

    // Apply CLI overrides
    if let Some(local) = cli.local_repo {
        config.local_cache_path = local;
    }
    for (name, url) in cli.repos {
        config.remote_repositories.insert(name, RemoteRepo::new(url));
    }
    if cli.offline {
        config.offline = true;
    }

    match cli.command {
        Commands::Resolve {
            coordinate,
            resolve_pom,
            json,
        } => {
            if resolve_pom {
                config.resolve_descriptor = true;
            }
            resolve_artifact(config, &coordinate, json)
        }
        Commands::Config => {
            let yaml = serde_yaml::to_string(&config.masked())
                .context("Failed to render configuration")?;
            print!("{}", yaml);
            Ok(())
        }
    }
}

fn resolve_artifact(config: RepositoryConfig, coordinate: &str, json: bool) -> anyhow::Result<()> {
    let coordinate: Coordinate = coordinate.parse()?;
    coordinate.validate()?;

    let resolver = ArtifactResolver::new(config)?;
    let artifact = resolver.resolve(&coordinate)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&artifact)?);
    } else {
        println!("{}", artifact.local_file_path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_repo() {
        assert_eq!(
            parse_repo("central=https://repo").unwrap(),
            ("central".to_string(), "https://repo".to_string())
        );
        assert!(parse_repo("central").is_err());
        assert!(parse_repo("=https://repo").is_err());
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
