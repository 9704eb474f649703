//! Search-index target command

use clap::Args;
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

use crate::config::Config;
use crate::target::{HttpSearchIndex, IndexMapping, IndexTarget};

#[derive(Args, Debug)]
pub struct TargetArgs {
    /// Override the index mapping file from the config
    #[arg(long)]
    pub index_mapping: Option<PathBuf>,

    /// Skip pushing index settings at startup
    #[arg(long)]
    pub skip_settings: bool,
}

impl TargetArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let target_config = config.target()?;
        let mapping_path = self
            .index_mapping
            .as_ref()
            .unwrap_or(&target_config.index_mapping_file);
        let mapping = IndexMapping::load(mapping_path)?;

        let run_id = Uuid::new_v4();
        tracing::info!(%run_id, streams = mapping.streams.len(), "starting target");

        let index = HttpSearchIndex::new(
            target_config,
            Duration::from_secs(config.http.timeout_secs),
        )?;
        let mut target = IndexTarget::new(mapping, index);

        if !self.skip_settings {
            target.apply_settings().await?;
        }

        let stdin = std::io::stdin();
        let stdout = std::io::stdout();
        target.run(stdin.lock(), stdout.lock()).await?;

        tracing::info!(%run_id, "target finished");
        Ok(())
    }
}
