//! Polygon tap command

use clap::Args;
use std::path::PathBuf;
use uuid::Uuid;

use super::load_state;
use crate::config::Config;
use crate::singer::MessageWriter;
use crate::sync::Shard;
use crate::taps::polygon::PolygonTap;

#[derive(Args, Debug)]
pub struct PolygonArgs {
    /// Initial Singer state file
    #[arg(long)]
    pub state: Option<PathBuf>,

    /// Print the stream catalog as JSON and exit
    #[arg(long)]
    pub discover: bool,

    /// Streams to sync, comma-separated (default: all)
    #[arg(long, value_delimiter = ',')]
    pub streams: Vec<String>,

    /// Override the configured shard id
    #[arg(long)]
    pub shard_id: Option<u32>,

    /// Override the configured shard count
    #[arg(long)]
    pub shard_count: Option<u32>,
}

impl PolygonArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        if self.discover {
            println!("{}", serde_json::to_string_pretty(&PolygonTap::catalog()?)?);
            return Ok(());
        }

        let tap_config = config.polygon()?;
        let shard = Shard::from_config(&config.shard, self.shard_id, self.shard_count)?;
        let mut state = load_state(self.state.as_ref())?;

        let run_id = Uuid::new_v4();
        tracing::info!(
            %run_id,
            shard = shard.id(),
            shard_count = shard.count(),
            "starting polygon sync"
        );

        let tap = PolygonTap::new(tap_config, &config.http, shard)?;
        let stdout = std::io::stdout();
        let mut out = MessageWriter::new(stdout.lock());
        tap.sync(&mut state, &mut out, &self.streams).await?;

        tracing::info!(%run_id, records = out.records_written(), "polygon sync complete");
        Ok(())
    }
}
