use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::config::CuratorConfig;
use crate::curator::Curator;
use crate::models::{ItinerarySource, TripRequest};
use crate::render::export_html;
use crate::search::search_activities;
use crate::web;

#[derive(Parser, Debug)]
#[command(
    name = "travel-curator",
    version,
    about = "Curated travel itineraries from a language model, like a local would plan them"
)]
pub struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Debug logging, including prompts and raw model replies
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the itinerary form (default)
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Generate one itinerary and print it or write the HTML export
    Generate(GenerateArgs),
    /// Print the activity search pages for a destination
    Sources {
        #[arg(long)]
        destination: String,
    },
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    #[arg(long)]
    pub destination: String,

    #[arg(long, default_value = "")]
    pub preferences: String,

    /// Number of days, defaults to `defaults.days`
    #[arg(long)]
    pub days: Option<u8>,

    /// First day of the trip, YYYY-MM-DD
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Use the sample itinerary instead of calling the model
    #[arg(long, default_value_t = false)]
    pub test_mode: bool,

    /// Write a standalone HTML file instead of printing markdown
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Print the itinerary as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

impl Cli {
    pub async fn run(self, mut config: CuratorConfig) -> Result<()> {
        match self.command.unwrap_or(Command::Serve {
            host: None,
            port: None,
        }) {
            Command::Serve { host, port } => {
                if let Some(host) = host {
                    config.server.host = host;
                }
                if let Some(port) = port {
                    config.server.port = port;
                }
                let curator = Curator::from_config(config)?;
                web::run(Arc::new(curator)).await
            }
            Command::Generate(args) => generate(args, config).await,
            Command::Sources { destination } => {
                for link in search_activities(&destination) {
                    println!("{link}");
                }
                Ok(())
            }
        }
    }
}

async fn generate(args: GenerateArgs, config: CuratorConfig) -> Result<()> {
    let mut request = TripRequest::new(args.destination, args.preferences)
        .with_days(args.days.unwrap_or(config.defaults.days));
    if let Some(start) = args.start_date {
        request = request.starting(start);
    }
    if args.test_mode {
        request = request.in_test_mode();
    }

    let curator = Curator::from_config(config)?;
    let itinerary = curator.generate(request).await?;

    if let ItinerarySource::Fallback { reason } = &itinerary.source {
        eprintln!("warning: {reason} Showing the sample itinerary instead.");
    }

    if let Some(path) = args.output {
        std::fs::write(&path, export_html(&itinerary)?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Saved itinerary to {}", path.display());
    } else if args.json {
        println!("{}", serde_json::to_string_pretty(&itinerary)?);
    } else {
        println!("{}", itinerary.markdown);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_generate() {
        let cli = Cli::try_parse_from([
            "travel-curator",
            "--verbose",
            "generate",
            "--destination",
            "Madrid",
            "--days",
            "3",
            "--start-date",
            "2025-05-12",
            "--test-mode",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Some(Command::Generate(args)) => {
                assert_eq!(args.destination, "Madrid");
                assert_eq!(args.days, Some(3));
                assert_eq!(args.start_date, NaiveDate::from_ymd_opt(2025, 5, 12));
                assert!(args.test_mode);
                assert!(args.preferences.is_empty());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["travel-curator", "--config", "config/default.toml"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.config, Some(PathBuf::from("config/default.toml")));
    }

    #[test]
    fn test_bad_start_date_rejected() {
        let result = Cli::try_parse_from([
            "travel-curator",
            "generate",
            "--destination",
            "Madrid",
            "--start-date",
            "tomorrow",
        ]);
        assert!(result.is_err());
    }
}
