use clap::Parser;
use fintap::cli::{Cli, Commands};
use fintap::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
        eprintln!("Using default configuration");
        Config::parse(include_str!("../config.toml.example")).expect("Invalid default config")
    });

    // Initialize telemetry
    let _guard = fintap::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Polygon(args) => {
            args.execute(&config).await?;
        }
        Commands::Coingecko(args) => {
            args.execute(&config).await?;
        }
        Commands::Eodhd(args) => {
            args.execute(&config).await?;
        }
        Commands::Target(args) => {
            args.execute(&config).await?;
        }
        Commands::Config => {
            println!("Current configuration:");
            println!("  Shard: {}/{}", config.shard.id, config.shard.count);
            println!("  HTTP timeout: {}s", config.http.timeout_secs);
            println!(
                "  Polygon: {}",
                if config.polygon.is_some() { "configured" } else { "-" }
            );
            println!(
                "  CoinGecko: {}",
                if config.coingecko.is_some() { "configured" } else { "-" }
            );
            println!(
                "  EODHD: {}",
                if config.eodhd.is_some() { "configured" } else { "-" }
            );
            match &config.target {
                Some(target) => println!(
                    "  Target: app {} mapping {}",
                    target.app_id,
                    target.index_mapping_file.display()
                ),
                None => println!("  Target: -"),
            }
            println!(
                "  Telemetry: level={} metrics_port={}",
                config.telemetry.log_level, config.telemetry.metrics_port
            );
        }
    }

    Ok(())
}
