use clap::{Parser, Subcommand};
use weatherbot::bot::{self, Bot};
use weatherbot::config::{self, Credentials};
use weatherbot::weather::{render_reply, OpenWeatherClient, WeatherLookup};

#[derive(Parser)]
#[command(name = "weatherbot")]
#[command(about = "Telegram bot that answers city names with the current weather", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory and a default config file.
    Init {
        /// Config file path (default: WEATHERBOT_CONFIG_PATH or ~/.weatherbot/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,
    },

    /// Run the bot (the default when no subcommand is given). Requires OWM_API_KEY and TELEGRAM_API_KEY.
    Run {
        /// Config file path (default: WEATHERBOT_CONFIG_PATH or ~/.weatherbot/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// Seconds between polls, at least 1 (default from config or 3)
        #[arg(long, short, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
        interval: Option<u64>,
    },

    /// Look up one city and print the reply the bot would send. Requires OWM_API_KEY.
    Weather {
        /// City name, passed to the provider as-is
        city: String,

        /// Config file path (default: WEATHERBOT_CONFIG_PATH or ~/.weatherbot/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("weatherbot {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init { config }) => {
            if let Err(e) = run_init(config) {
                log::error!("init failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Weather { city, config }) => {
            if let Err(e) = run_weather(config, &city).await {
                log::error!("weather lookup failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Run { config, interval }) => {
            if let Err(e) = run_bot(config, interval).await {
                exit_startup_failure(&e);
            }
        }
        None => {
            if let Err(e) = run_bot(None, None).await {
                exit_startup_failure(&e);
            }
        }
    }
}

/// Printed on stderr regardless of the log filter, then exit 1.
fn exit_startup_failure(e: &anyhow::Error) -> ! {
    eprintln!("{}", startup_diagnostic(e));
    std::process::exit(1);
}

fn startup_diagnostic(e: &anyhow::Error) -> String {
    format!("Error: {:#}", e)
}

fn run_init(config_path: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(config::default_config_path);
    let dir = weatherbot::init::init_config_dir(&path)?;
    println!("initialized configuration at {}", dir.display());
    Ok(())
}

async fn run_weather(config_path: Option<std::path::PathBuf>, city: &str) -> anyhow::Result<()> {
    let (config, _) = config::load_config(config_path)?;
    let api_key = config::resolve_weather_api_key(&config).ok_or_else(|| {
        anyhow::anyhow!(
            "OpenWeather API key is not set (export {})",
            config::WEATHER_API_KEY_ENV
        )
    })?;
    let client = OpenWeatherClient::with_client(
        api_key,
        Some(config.weather.api_url.clone()),
        Some(config.weather.lang.clone()),
        bot::http_client(&config)?,
    );
    let outcome = client.query(city).await;
    println!("{}", render_reply(city, &outcome));
    Ok(())
}

async fn run_bot(
    config_path: Option<std::path::PathBuf>,
    interval: Option<u64>,
) -> anyhow::Result<()> {
    let (mut config, _) = config::load_config(config_path)?;
    if let Some(secs) = interval {
        config.polling.interval_secs = secs;
    }
    let credentials = Credentials::resolve(&config)?;
    let bot = Bot::from_config(&config, &credentials)?;
    log::info!("polling every {:?}", bot.interval());

    let (trigger, shutdown) = bot::shutdown_channel();
    tokio::spawn(async move {
        bot::wait_for_signal().await;
        trigger.trigger();
    });

    let state = bot.run(shutdown).await;
    log::info!(
        "stopped; replied up to message {:?}, {} distinct senders seen",
        state.cursor(),
        state.known_senders().len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use weatherbot::config::ConfigError;

    #[test]
    fn missing_credential_diagnostic_names_the_env_var() {
        let e = anyhow::Error::from(ConfigError::MissingCredential {
            what: "Telegram API key",
            env: config::TELEGRAM_TOKEN_ENV,
        });
        let msg = startup_diagnostic(&e);
        assert!(msg.starts_with("Error: Telegram API key is not set"));
        assert!(msg.contains("TELEGRAM_API_KEY"));
    }

    #[test]
    fn diagnostic_includes_context_chain() {
        let e = anyhow::anyhow!("file missing").context("reading config from /x/config.json");
        assert_eq!(
            startup_diagnostic(&e),
            "Error: reading config from /x/config.json: file missing"
        );
    }
}
