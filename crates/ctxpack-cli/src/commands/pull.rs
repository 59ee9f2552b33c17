use ctxpack_data::dataset::{HubSource, ShardCacheOptions};

use crate::logging::LogArgs;

/// Args for the pull command.
#[derive(clap::Args, Debug)]
pub struct PullArgs {
    /// Dataset repository, e.g. "lightblue/tagengo-gpt4".
    #[arg(long)]
    repo: String,

    /// Repository revision.
    #[arg(long, default_value = "main")]
    revision: String,

    /// Number of shards in the dataset.
    #[arg(long)]
    shard_count: usize,

    /// Shards to fetch.
    #[arg(long, num_args = 1.., default_values_t = vec![0])]
    shards: Vec<usize>,

    /// Dataset cache directory.
    #[arg(long, default_value = "~/.cache/ctxpack/datasets/")]
    cache_dir: String,

    #[command(flatten)]
    logging: LogArgs,
}

impl PullArgs {
    /// Run the pull command.
    pub fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.logging.setup_logging(3)?;

        let source = HubSource::new(self.repo.clone(), self.shard_count)
            .with_revision(self.revision.clone());

        let mut cache = ShardCacheOptions::new(source)
            .with_cache_dir(self.cache_dir.clone())
            .init()?;

        let mut shards = self.shards.clone();
        shards.sort();
        shards.dedup();

        log::info!("loading {} shards of {}", shards.len(), self.repo);
        let paths = cache.load_shards(&shards)?;

        for path in &paths {
            log::info!("cached: {}", path.display());
        }

        Ok(())
    }
}
