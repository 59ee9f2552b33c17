//! # Hub Shard Cache
//!
//! Downloads parquet text shards of a hub-hosted dataset into a local
//! cache directory, and reads their text columns back for packing.

use std::fs;
use std::fs::File;
use std::path::PathBuf;

use arrow::array::{Array, StringArray};
use downloader::{Download, Downloader};
use parquet::arrow::arrow_reader::{ParquetRecordBatchReader, ParquetRecordBatchReaderBuilder};

/// The hub base URL for dataset repositories.
pub static DEFAULT_HUB_BASE_URL: &str = "https://huggingface.co/datasets";

/// A hub-hosted, sharded dataset source.
#[derive(Debug, Clone, PartialEq)]
pub struct HubSource {
    /// The dataset repository, e.g. `"lightblue/tagengo-gpt4"`.
    pub repo: String,

    /// The repository revision.
    pub revision: String,

    /// The number of shards in the dataset.
    pub shard_count: usize,

    /// The 0-pad width of the shard index.
    pub index_pad_width: usize,

    /// The shard filename template; `"{index}"` is substituted.
    pub shard_template: String,
}

impl HubSource {
    /// Construct a source for a dataset repository.
    pub fn new<S: Into<String>>(
        repo: S,
        shard_count: usize,
    ) -> Self {
        Self {
            repo: repo.into(),
            revision: "main".to_string(),
            shard_count,
            index_pad_width: 5,
            shard_template: "shard_{index}.parquet".to_string(),
        }
    }

    /// Sets the repository revision.
    pub fn with_revision<S: Into<String>>(
        mut self,
        revision: S,
    ) -> Self {
        self.revision = revision.into();
        self
    }

    /// Sets the shard filename template and index pad width.
    pub fn with_shard_template<S: Into<String>>(
        mut self,
        template: S,
        index_pad_width: usize,
    ) -> Self {
        self.shard_template = template.into();
        self.index_pad_width = index_pad_width;
        self
    }

    /// Format a shard index with 0-padding.
    pub fn format_index(
        &self,
        index: usize,
    ) -> String {
        format!("{index:0width$}", width = self.index_pad_width)
    }

    /// Construct a shard filename from the template.
    pub fn format_shard_filename(
        &self,
        index: usize,
    ) -> String {
        self.shard_template
            .replace("{index}", &self.format_index(index))
    }

    /// Construct the hub `resolve` URL for a shard.
    pub fn format_shard_url(
        &self,
        index: usize,
    ) -> String {
        format!(
            "{}/{}/resolve/{}/{}",
            DEFAULT_HUB_BASE_URL,
            self.repo,
            self.revision,
            self.format_shard_filename(index),
        )
    }

    /// The cache subdirectory name for this repository.
    pub fn cache_dir_name(&self) -> String {
        self.repo.replace('/', "--")
    }
}

/// Options for configuring a [`ShardCache`].
#[derive(Debug, Clone, PartialEq)]
pub struct ShardCacheOptions {
    /// The cache root directory; `~` and environment vars are expanded.
    pub cache_dir: String,

    /// The dataset source.
    pub source: HubSource,

    /// Parallel download requests.
    pub parallel_requests: u16,
}

impl ShardCacheOptions {
    /// Construct options for a dataset source.
    pub fn new(source: HubSource) -> Self {
        Self {
            cache_dir: "~/.cache/ctxpack/datasets/".to_string(),
            source,
            parallel_requests: 8,
        }
    }

    /// Sets the cache root directory.
    pub fn with_cache_dir<S: Into<String>>(
        mut self,
        cache_dir: S,
    ) -> Self {
        self.cache_dir = cache_dir.into();
        self
    }

    /// Build the cache, creating its directory as needed.
    pub fn init(self) -> anyhow::Result<ShardCache> {
        let root = shellexpand::full(&self.cache_dir)?.to_string();
        let cache_dir = PathBuf::from(root).join(self.source.cache_dir_name());

        fs::create_dir_all(&cache_dir)?;

        let downloader = Downloader::builder()
            .parallel_requests(self.parallel_requests)
            .build()?;

        Ok(ShardCache {
            cache_dir: cache_dir.canonicalize()?,
            source: self.source,
            downloader,
        })
    }
}

/// A local cache of downloaded dataset shards.
pub struct ShardCache {
    cache_dir: PathBuf,
    source: HubSource,
    downloader: Downloader,
}

impl ShardCache {
    /// The dataset source.
    pub fn source(&self) -> &HubSource {
        &self.source
    }

    /// Construct the local path of a shard.
    pub fn shard_path(
        &self,
        index: usize,
    ) -> PathBuf {
        self.cache_dir.join(self.source.format_shard_filename(index))
    }

    /// Check if a shard is cached.
    pub fn has_shard(
        &self,
        index: usize,
    ) -> bool {
        self.shard_path(index).exists()
    }

    /// Load a shard, downloading it if not cached.
    pub fn load_shard(
        &mut self,
        index: usize,
    ) -> anyhow::Result<PathBuf> {
        self.load_shards(&[index])?;
        Ok(self.shard_path(index))
    }

    /// Load multiple shards, downloading the missing ones.
    pub fn load_shards(
        &mut self,
        shards: &[usize],
    ) -> anyhow::Result<Vec<PathBuf>> {
        let mut paths = Vec::with_capacity(shards.len());
        let mut downloads = Vec::new();

        for &shard in shards {
            anyhow::ensure!(
                shard < self.source.shard_count,
                "shard {} out of range (< {})",
                shard,
                self.source.shard_count,
            );

            let path = self.shard_path(shard);
            paths.push(path.clone());

            if path.exists() {
                continue;
            }

            let url = self.source.format_shard_url(shard);
            log::info!("fetching {url}");
            downloads.push(Download::new(&url).file_name(path.as_ref()));
        }

        if !downloads.is_empty() {
            for summary in self.downloader.download(&downloads)? {
                summary?;
            }
        }

        Ok(paths)
    }

    /// List the indices of all cached shards, in order.
    pub fn list_cached_shards(&self) -> anyhow::Result<Vec<usize>> {
        let (pre, post) = self
            .source
            .shard_template
            .split_once("{index}")
            .ok_or_else(|| anyhow::anyhow!("shard template has no {{index}} placeholder"))?;

        let mut shards = Vec::new();
        for entry in fs::read_dir(&self.cache_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }

            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };

            if let Some(index) = name
                .strip_prefix(pre)
                .and_then(|stem| stem.strip_suffix(post))
                .and_then(|index| index.parse::<usize>().ok())
            {
                shards.push(index);
            }
        }

        shards.sort();
        Ok(shards)
    }

    /// Read a cached shard as a parquet record-batch reader.
    pub fn read_shard_batches(
        &self,
        index: usize,
    ) -> anyhow::Result<ParquetRecordBatchReader> {
        let file = File::open(self.shard_path(index))?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
        Ok(reader)
    }

    /// Read the text column of a cached shard.
    ///
    /// Null rows are skipped.
    pub fn read_shard_text(
        &self,
        index: usize,
        column: &str,
    ) -> anyhow::Result<Vec<String>> {
        let mut rows = Vec::new();

        for batch in self.read_shard_batches(index)? {
            let batch = batch?;

            let texts = batch
                .column_by_name(column)
                .ok_or_else(|| anyhow::anyhow!("no {column:?} column in shard {index}"))?
                .as_any()
                .downcast_ref::<StringArray>()
                .ok_or_else(|| anyhow::anyhow!("column {column:?} is not a string column"))?;

            rows.extend(texts.iter().flatten().map(str::to_string));
        }

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use tempdir::TempDir;

    use super::*;

    #[test]
    fn test_hub_source_formatting() {
        let source = HubSource::new("lightblue/tagengo-gpt4", 16);

        assert_eq!(source.revision, "main");
        assert_eq!(source.format_index(0), "00000");
        assert_eq!(source.format_index(312), "00312");
        assert_eq!(source.format_shard_filename(7), "shard_00007.parquet");
        assert_eq!(
            source.format_shard_url(7),
            "https://huggingface.co/datasets/lightblue/tagengo-gpt4/resolve/main/shard_00007.parquet",
        );
        assert_eq!(source.cache_dir_name(), "lightblue--tagengo-gpt4");
    }

    #[test]
    fn test_custom_template() {
        let source = HubSource::new("acme/corpus", 4)
            .with_revision("v2")
            .with_shard_template("train-{index}.parquet", 3);

        assert_eq!(source.format_shard_filename(9), "train-009.parquet");
        assert_eq!(
            source.format_shard_url(9),
            "https://huggingface.co/datasets/acme/corpus/resolve/v2/train-009.parquet",
        );
    }

    #[test]
    fn test_cache_listing() -> anyhow::Result<()> {
        let tmpdir = TempDir::new("ctxpack-data-test")?;
        let base_dir = tmpdir.path();

        let cache = ShardCacheOptions::new(HubSource::new("acme/corpus", 2000))
            .with_cache_dir(base_dir.to_string_lossy().to_string())
            .init()?;

        let shards = vec![0, 12, 312, 1821];
        for &index in &shards {
            File::create(cache.shard_path(index))?;
        }

        for index in 0..cache.source().shard_count {
            assert_eq!(cache.has_shard(index), shards.contains(&index));
        }

        assert_eq!(cache.list_cached_shards()?, shards);

        Ok(())
    }

    #[test]
    fn test_out_of_range_shard_rejected() -> anyhow::Result<()> {
        let tmpdir = TempDir::new("ctxpack-data-test")?;

        let mut cache = ShardCacheOptions::new(HubSource::new("acme/corpus", 4))
            .with_cache_dir(tmpdir.path().to_string_lossy().to_string())
            .init()?;

        assert!(cache.load_shards(&[4]).is_err());
        Ok(())
    }
}
