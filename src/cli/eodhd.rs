//! EOD Historical Data tap command

use clap::Args;
use std::path::PathBuf;
use uuid::Uuid;

use super::load_state;
use crate::config::Config;
use crate::singer::MessageWriter;
use crate::taps::eodhd::EodhdTap;

#[derive(Args, Debug)]
pub struct EodhdArgs {
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

impl EodhdArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        if self.discover {
            println!("{}", serde_json::to_string_pretty(&EodhdTap::catalog()?)?);
            return Ok(());
        }

        let tap_config = config.eodhd()?;
        let mut state = load_state(self.state.as_ref())?;

        let run_id = Uuid::new_v4();
        tracing::info!(%run_id, symbols = tap_config.symbols.len(), "starting eodhd sync");

        let tap = EodhdTap::new(tap_config, &config.http)?;
        let stdout = std::io::stdout();
        let mut out = MessageWriter::new(stdout.lock());
        tap.sync(&mut state, &mut out, &self.streams).await?;

        tracing::info!(%run_id, records = out.records_written(), "eodhd sync complete");
        Ok(())
    }
}
