use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use inquire::{Password, Select, Text};
use std::sync::Arc;
use tracing::debug;
use wunderground_core::{Client, Config, ResponseBody, ResponseFormat, SIMPLE_FEATURES};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "wunderground", version, about = "Weather Underground API client")]
pub struct Cli {
    /// Log requests and cache activity.
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Always go to the network.
    #[arg(long, global = true)]
    pub no_cache: bool,

    /// Override the configured response format ("json" or "xml").
    #[arg(long, global = true)]
    pub format: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the API key, response format and language.
    Configure,

    /// Fetch a simple feature, e.g. "alerts" or "astronomy".
    Feature {
        name: String,

        /// Location, e.g. "CA/San_Francisco" or a ZIP code.
        query: String,
    },

    /// Current conditions for a location.
    Conditions {
        query: String,

        /// Exclude personal weather stations.
        #[arg(long)]
        no_pws: bool,
    },

    /// Forecast for a location.
    Forecast {
        query: String,

        /// Ten days instead of three.
        #[arg(long)]
        ten_day: bool,

        /// Disable the best-forecast blend.
        #[arg(long)]
        no_bestfct: bool,
    },

    /// Observations for a location on a past day.
    History {
        query: String,

        /// Day to look up, YYYY-MM-DD.
        date: String,
    },

    /// Currently active hurricanes.
    Hurricane,

    /// List the simple feature names.
    Features,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let use_cache = !self.no_cache;
        let format = self.format;
        let client = || build_client(format.as_deref(), use_cache);

        let body = match self.command {
            Command::Configure => return configure(),
            Command::Features => {
                for name in SIMPLE_FEATURES {
                    println!("{name}");
                }
                return Ok(());
            }
            Command::Feature { name, query } => {
                client()?.feature(&name)?.get(&query, use_cache).await?
            }
            Command::Conditions { query, no_pws } => {
                client()?.conditions(&query, !no_pws, use_cache).await?
            }
            Command::Forecast { query, ten_day: true, no_bestfct } => {
                client()?.forecast10day(&query, !no_bestfct, use_cache).await?
            }
            Command::Forecast { query, ten_day: false, no_bestfct } => {
                client()?.forecast(&query, !no_bestfct, use_cache).await?
            }
            Command::History { query, date } => {
                let date = parse_date(&date)?;
                client()?.history(&query, date, use_cache).await?
            }
            Command::Hurricane => client()?.current_hurricane(use_cache).await?,
        };

        print_body(&body)
    }
}

fn build_client(format: Option<&str>, use_cache: bool) -> Result<Client> {
    let mut config = Config::load()?;
    if let Some(format) = format {
        config.format = Some(format.to_string());
    }

    let cache = use_cache.then(|| Arc::new(config.memory_cache()));
    let client = config.client(cache)?;
    debug!(?client, "client ready");

    Ok(client)
}

fn print_body(body: &ResponseBody) -> Result<()> {
    println!("{}", body.to_pretty_string()?);
    Ok(())
}

fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{input}', expected YYYY-MM-DD"))
}

fn configure() -> Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    let formats: Vec<&str> = ResponseFormat::all().iter().map(|f| f.as_str()).collect();
    let format = Select::new("Response format:", formats)
        .with_starting_cursor(format_cursor(&config))
        .prompt()
        .context("Failed to read format")?;

    let lang = Text::new("Language code:")
        .with_default(config.lang.as_deref().unwrap_or("EN"))
        .prompt()
        .context("Failed to read language")?;

    config.api_key = Some(api_key.trim().to_string());
    config.format = Some(format.to_string());
    config.lang = Some(lang.trim().to_string());
    config.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

/// Position of the saved format in the format prompt, falling back to the default.
fn format_cursor(config: &Config) -> usize {
    let saved = config.response_format().unwrap_or_default();
    ResponseFormat::all().iter().position(|f| *f == saved).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_date_accepts_iso_dates() {
        let date = parse_date("2017-01-01").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2017, 1, 1).unwrap());
    }

    #[test]
    fn parse_date_rejects_other_layouts() {
        let err = parse_date("01/01/2017").unwrap_err();
        assert!(err.to_string().contains("expected YYYY-MM-DD"));
    }

    #[test]
    fn format_prompt_starts_on_saved_format() {
        let xml = Config { format: Some("xml".into()), ..Config::default() };
        assert_eq!(ResponseFormat::all()[format_cursor(&xml)], ResponseFormat::Xml);

        assert_eq!(ResponseFormat::all()[format_cursor(&Config::default())], ResponseFormat::Json);

        let bogus = Config { format: Some("yaml".into()), ..Config::default() };
        assert_eq!(ResponseFormat::all()[format_cursor(&bogus)], ResponseFormat::Json);
    }

    #[test]
    fn forecast_flags_parse() {
        let cli = Cli::try_parse_from(["wunderground", "--no-cache", "forecast", "12345", "--ten-day"])
            .unwrap();
        assert!(cli.no_cache);
        assert!(matches!(cli.command, Command::Forecast { ten_day: true, no_bestfct: false, .. }));
    }

    #[test]
    fn global_format_flag_after_subcommand() {
        let cli =
            Cli::try_parse_from(["wunderground", "feature", "alerts", "12345", "--format", "xml"])
                .unwrap();
        assert_eq!(cli.format.as_deref(), Some("xml"));
    }

    #[test]
    fn history_requires_date() {
        assert!(Cli::try_parse_from(["wunderground", "history", "12345"]).is_err());
    }
}
