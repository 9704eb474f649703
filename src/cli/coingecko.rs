//! CoinGecko tap command

use clap::Args;
use std::path::PathBuf;
use uuid::Uuid;

use super::load_state;
use crate::config::Config;
use crate::singer::MessageWriter;
use crate::taps::coingecko::CoingeckoTap;

#[derive(Args, Debug)]
pub struct CoingeckoArgs {
    /// Initial Singer state file
    #[arg(long)]
    pub state: Option<PathBuf>,

    /// Print the stream catalog as JSON and exit
    #[arg(long)]
    pub discover: bool,

    /// Streams to sync, comma-separated (default: all)
    #[arg(long, value_delimiter = ',')]
    pub streams: Vec<String>,
}

impl CoingeckoArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        if self.discover {
            println!(
                "{}",
                serde_json::to_string_pretty(&CoingeckoTap::catalog()?)?
            );
            return Ok(());
        }

        let tap_config = config.coingecko()?;
        let mut state = load_state(self.state.as_ref())?;

        let run_id = Uuid::new_v4();
        tracing::info!(%run_id, "starting coingecko sync");

        let tap = CoingeckoTap::new(tap_config, &config.http)?;
        let stdout = std::io::stdout();
        let mut out = MessageWriter::new(stdout.lock());
        tap.sync(&mut state, &mut out, &self.streams).await?;

        tracing::info!(%run_id, records = out.records_written(), "coingecko sync complete");
        Ok(())
    }
}
