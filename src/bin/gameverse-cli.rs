use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

use gameverse::client::ServicePoller;
use gameverse::lifecycle::{wait_for_signal, Shutdown};

#[derive(Parser)]
#[command(name = "gameverse-cli")]
#[command(about = "Management CLI for the GameVerse service registry", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[arg(short, long, env = "GAMEVERSE_ADMIN_KEY", default_value = "CHANGE_ME_IN_PRODUCTION")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every service flag
    Services,
    /// Turn a service on or off
    Set {
        name: String,
        #[arg(value_enum)]
        state: Switch,
    },
    /// Show circuit breaker states
    Breakers,
    /// Poll the flag map and print availability on every refresh
    Watch {
        #[arg(long, default_value_t = 10)]
        interval_secs: u64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Switch {
    On,
    Off,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", cli.key))?);

    match cli.command {
        Commands::Services => {
            let res = client.get(format!("{base}/api/admin/services")).send().await?;
            print_response(res).await?;
        }
        Commands::Set { name, state } => {
            let status = match state {
                Switch::On => 1,
                Switch::Off => 0,
            };
            let mut url = reqwest::Url::parse(&format!("{base}/api/admin/services/"))?;
            if let Ok(mut path) = url.path_segments_mut() {
                path.pop_if_empty().push(&name);
            }
            let res = client
                .put(url)
                .headers(headers)
                .json(&json!({ "status": status }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Breakers => {
            let res = client
                .get(format!("{base}/api/admin/breakers"))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Watch { interval_secs } => {
            watch(base, Duration::from_secs(interval_secs.max(1))).await?;
        }
    }

    Ok(())
}

async fn watch(base: &str, interval: Duration) -> Result<(), Box<dyn std::error::Error>> {
    let poller = ServicePoller::new(base, interval)?;
    let shutdown = Shutdown::new();
    let mut stop = shutdown.subscribe();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        trigger.trigger();
    });

    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let status = poller.refresh().await;
                println!("--");
                for (name, _) in status.services().into_iter().flatten() {
                    let label = if status.is_active(name) { "ACTIVE" } else { "INACTIVE" };
                    println!("{label:<8} {name}");
                }
            }
            _ = stop.recv() => break,
        }
    }
    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
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
    fn test_set_takes_name_and_switch() {
        let cli = Cli::try_parse_from(["gameverse-cli", "set", "User Library", "on"]).unwrap();
        assert_eq!(cli.url, "http://localhost:8080");
        assert!(matches!(
            cli.command,
            Commands::Set { ref name, state: Switch::On } if name == "User Library"
        ));

        let cli = Cli::try_parse_from(["gameverse-cli", "-u", "http://gv:9000", "set", "Analytics Service", "off"]).unwrap();
        assert_eq!(cli.url, "http://gv:9000");
        assert!(matches!(cli.command, Commands::Set { state: Switch::Off, .. }));
    }

    #[test]
    fn test_rejects_unknown_switch_and_missing_name() {
        assert!(Cli::try_parse_from(["gameverse-cli", "set", "User Library", "maybe"]).is_err());
        assert!(Cli::try_parse_from(["gameverse-cli", "set", "on"]).is_err());
    }

    #[test]
    fn test_watch_interval_defaults_to_ten_seconds() {
        let cli = Cli::try_parse_from(["gameverse-cli", "watch"]).unwrap();
        assert!(matches!(cli.command, Commands::Watch { interval_secs: 10 }));
    }
}
