mod commands;
mod config;
mod credentials;
mod logging;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lib_retriever::{CredentialStore, ExecutionContext, Retriever};
use lib_retriever_http::{HttpRetriever, HttpTransport, HttpTransportOptions};

use crate::config::{AppConfig, LibraryEntry};
use crate::credentials::ConfigCredentialStore;

#[derive(Parser)]
#[command(name = "lib-retriever")]
#[command(about = "Retrieve versioned library archives over HTTP(S)")]
struct Cli {
    /// Configuration file (TOML, or YAML with a .yaml/.yml extension)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Verbose diagnostic logging
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Download and extract a library into a target directory
    Retrieve {
        /// Library name
        name: String,
        /// Version to retrieve (defaults to the library's default version)
        #[arg(long)]
        version: Option<String>,
        /// Directory the library content is copied into
        #[arg(long)]
        target: PathBuf,
        /// Label of the execution the library is retrieved for
        #[arg(long, default_value = "cli")]
        owner: String,
        /// Base workspace (overrides the configured one)
        #[arg(long)]
        workspace: Option<PathBuf>,
    },
    /// Check that a library version is reachable
    Validate {
        /// Library name
        name: String,
        /// Version to check (defaults to the library's default version)
        #[arg(long)]
        version: Option<String>,
    },
    /// List configured libraries
    Libraries,
}

fn library<'a>(config: &'a AppConfig, name: &str) -> Result<&'a LibraryEntry> {
    config
        .library(name)
        .with_context(|| format!("library {name} is not configured"))
}

fn version_for(entry: &LibraryEntry, requested: Option<String>) -> Result<String> {
    requested
        .or_else(|| entry.default_version.clone())
        .with_context(|| {
            format!(
                "no version given for library {} and it has no default version",
                entry.name
            )
        })
}

fn transport_options(config: &AppConfig) -> HttpTransportOptions {
    HttpTransportOptions {
        connect_timeout: config.connect_timeout_secs.map(Duration::from_secs),
        timeout: config.timeout_secs.map(Duration::from_secs),
        ..HttpTransportOptions::default()
    }
}

fn build_retriever(config: &AppConfig, entry: &LibraryEntry) -> Result<HttpRetriever> {
    let transport = HttpTransport::with_options(&transport_options(config))?;
    let credentials: Arc<dyn CredentialStore> =
        Arc::new(ConfigCredentialStore::new(config.credentials.clone()));

    Ok(Retriever::new(entry.retriever.clone(), transport, credentials)
        .with_workspace_suffix(config.workspace_suffix.clone()))
}

fn workspace_for(config: &AppConfig, explicit: Option<PathBuf>) -> Result<PathBuf> {
    explicit
        .or_else(|| config.workspace.clone())
        .or_else(crate::config::default_workspace)
        .context("could not determine a base workspace directory")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let app_config = config::load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Retrieve {
            name,
            version,
            target,
            owner,
            workspace,
        } => {
            let entry = library(&app_config, &name)?;
            let version = version_for(entry, version)?;
            let retriever = build_retriever(&app_config, entry)?;
            let context = ExecutionContext::new(owner, workspace_for(&app_config, workspace)?);

            commands::retrieve::run(&retriever, &name, &version, &target, &context).await
        }
        Command::Validate { name, version } => {
            let entry = library(&app_config, &name)?;
            let version = version_for(entry, version)?;
            let retriever = build_retriever(&app_config, entry)?;

            commands::validate::run(&retriever, &name, &version).await
        }
        Command::Libraries => {
            commands::libraries::run(&app_config);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(default_version: Option<&str>) -> LibraryEntry {
        LibraryEntry {
            name: "foo".into(),
            default_version: default_version.map(str::to_owned),
            retriever: lib_retriever::RetrieverConfig::new("https://x/foo.zip"),
        }
    }

    #[test]
    fn explicit_version_wins() {
        let version = version_for(&entry(Some("1.0")), Some("2.0".into())).unwrap();
        assert_eq!(version, "2.0");
    }

    #[test]
    fn falls_back_to_default_version() {
        assert_eq!(version_for(&entry(Some("1.0")), None).unwrap(), "1.0");
    }

    #[test]
    fn no_version_at_all_is_an_error() {
        assert!(version_for(&entry(None), None).is_err());
    }

    #[test]
    fn explicit_workspace_wins() {
        let config = AppConfig {
            workspace: Some(PathBuf::from("/configured")),
            ..AppConfig::default()
        };
        assert_eq!(
            workspace_for(&config, Some(PathBuf::from("/explicit"))).unwrap(),
            PathBuf::from("/explicit")
        );
        assert_eq!(workspace_for(&config, None).unwrap(), PathBuf::from("/configured"));
    }

    #[test]
    fn timeouts_come_from_config() {
        let config = AppConfig {
            connect_timeout_secs: Some(5),
            timeout_secs: Some(60),
            ..AppConfig::default()
        };
        let options = transport_options(&config);
        assert_eq!(options.connect_timeout, Some(Duration::from_secs(5)));
        assert_eq!(options.timeout, Some(Duration::from_secs(60)));
    }
}
