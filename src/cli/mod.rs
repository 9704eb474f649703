//! CLI interface for fintap
//!
//! Provides subcommands for:
//! - `polygon`: run the Polygon tap
//! - `coingecko`: run the CoinGecko tap
//! - `eodhd`: run the EOD Historical Data tap
//! - `target`: load Singer messages from stdin into the search index
//! - `config`: show the effective configuration

mod coingecko;
mod eodhd;
mod polygon;
mod target;

pub use coingecko::CoingeckoArgs;
pub use eodhd::EodhdArgs;
pub use polygon::PolygonArgs;
pub use target::TargetArgs;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::error::TapError;
use crate::singer::TapState;

#[derive(Parser, Debug)]
#[command(name = "fintap")]
#[command(about = "Singer-protocol taps for financial market APIs and a search-index target")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract market status and historical prices from Polygon
    Polygon(PolygonArgs),
    /// Extract per-coin data from CoinGecko
    Coingecko(CoingeckoArgs),
    /// Extract fundamentals, dividends, prices, and options from EODHD
    Eodhd(EodhdArgs),
    /// Load Singer messages from stdin into the search index
    Target(TargetArgs),
    /// Show the effective configuration
    Config,
}

/// Seed tap state from a file, or start empty.
pub(crate) fn load_state(path: Option<&PathBuf>) -> Result<TapState, TapError> {
    match path {
        Some(p) => TapState::load(p),
        None => Ok(TapState::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_polygon_with_shard_overrides() {
        let cli = Cli::try_parse_from([
            "fintap",
            "polygon",
            "--shard-id",
            "2",
            "--shard-count",
            "8",
            "--streams",
            "polygon_stocks_historical_prices,polygon_crypto_historical_prices",
        ])
        .unwrap();
        match cli.command {
            Commands::Polygon(args) => {
                assert_eq!(args.shard_id, Some(2));
                assert_eq!(args.shard_count, Some(8));
                assert_eq!(args.streams.len(), 2);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_default_config_path() {
        let cli = Cli::try_parse_from(["fintap", "config"]).unwrap();
        assert_eq!(cli.config, "config.toml");
    }

    #[test]
    fn test_cli_discover_flag() {
        let cli = Cli::try_parse_from(["fintap", "eodhd", "--discover"]).unwrap();
        match cli.command {
            Commands::Eodhd(args) => assert!(args.discover),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_load_state_default_when_no_file() {
        let state = load_state(None).unwrap();
        assert!(state.bookmarks.is_empty());
    }
}
