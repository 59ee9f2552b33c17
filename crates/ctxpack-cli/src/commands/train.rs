use std::{
    fs,
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use ctxpack::{
    PackOptions,
    Record,
    TrainPlanOptions,
    packer::DEFAULT_EOS_TOKEN,
    plan::{DEFAULT_LEARNING_RATE, DEFAULT_TOKEN_BUDGET},
    tokenize::{HfSampleTokenizer, SampleTokenizer},
};
use ctxpack_data::{
    dataset::{HubSource, ShardCache, ShardCacheOptions},
    records::write_record,
};
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};

use crate::logging::LogArgs;

/// Args for the train command.
#[derive(clap::Args, Debug)]
pub struct TrainArgs {
    /// Base model directory; must contain `tokenizer.json`.
    #[arg(long)]
    base_model: String,

    /// Tokens per packed example.
    #[arg(long)]
    context_length: usize,

    /// Dataset repository of parquet text shards.
    #[arg(long)]
    dataset: String,

    /// Dataset repository revision.
    #[arg(long, default_value = "main")]
    revision: String,

    /// Number of shards in the dataset.
    #[arg(long)]
    shard_count: usize,

    /// Shards for the training split.
    #[arg(long, num_args = 1..)]
    train_shards: Vec<usize>,

    /// Shards for the validation split.
    #[arg(long, num_args = 1..)]
    validation_shards: Vec<usize>,

    /// Text column name in the shards.
    #[arg(long, default_value = "text")]
    text_column: String,

    /// End-of-sequence marker id appended after each document.
    #[arg(long, default_value_t = DEFAULT_EOS_TOKEN)]
    eos_token: u32,

    /// Dataset cache directory.
    #[arg(long, default_value = "~/.cache/ctxpack/datasets/")]
    cache_dir: String,

    /// Output directory for the packed splits and the plan.
    #[arg(long)]
    output_dir: String,

    /// Per-device batch size.
    #[arg(long, default_value = "4")]
    batch_size: usize,

    /// Gradient accumulation steps.
    #[arg(long, default_value = "8")]
    gradient_accumulation_steps: usize,

    /// Training device count.
    #[arg(long, default_value = "1")]
    device_count: usize,

    /// Total number of tokens to train on.
    #[arg(long, default_value_t = DEFAULT_TOKEN_BUDGET)]
    token_budget: u64,

    /// Optimizer learning rate.
    #[arg(long, default_value_t = DEFAULT_LEARNING_RATE)]
    learning_rate: f64,

    /// Optional checkpoint path the external trainer resumes from.
    #[arg(long)]
    resume_from_checkpoint: Option<String>,

    /// Shard-order shuffle seed.
    #[arg(long, default_value = "43")]
    shuffle_seed: u64,

    #[command(flatten)]
    logging: LogArgs,
}

impl TrainArgs {
    /// Run the train command.
    pub fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.logging.setup_logging(3)?;

        let tokenizer =
            HfSampleTokenizer::from_file(Path::new(&self.base_model).join("tokenizer.json"))?;

        let mut plan_options = TrainPlanOptions::new(
            self.context_length,
            self.device_count,
            self.batch_size,
            self.gradient_accumulation_steps,
        )
        .with_token_budget(self.token_budget)
        .with_learning_rate(self.learning_rate);

        if let Some(checkpoint) = &self.resume_from_checkpoint {
            plan_options = plan_options.with_resume_from_checkpoint(checkpoint.clone());
        }

        let plan = plan_options.init()?;

        let output_dir = PathBuf::from(&self.output_dir);
        fs::create_dir_all(&output_dir)?;

        let plan_path = output_dir.join("train_plan.json");
        let mut plan_writer = BufWriter::new(File::create(&plan_path)?);
        serde_json::to_writer_pretty(&mut plan_writer, &plan)?;
        plan_writer.flush()?;
        log::info!(
            "plan: {} steps ({} warmup) -> {}",
            plan.max_steps,
            plan.warmup_steps,
            plan_path.display(),
        );

        let source = HubSource::new(self.dataset.clone(), self.shard_count)
            .with_revision(self.revision.clone());
        let mut cache = ShardCacheOptions::new(source)
            .with_cache_dir(self.cache_dir.clone())
            .init()?;

        for (split, shards) in [
            ("train", &self.train_shards),
            ("validation", &self.validation_shards),
        ] {
            let mut shards = shards.clone();

            // Shard-order shuffle; rows within a shard stay in stream order.
            let mut rng = StdRng::seed_from_u64(self.shuffle_seed);
            shards.shuffle(&mut rng);

            cache.load_shards(&shards)?;

            let path = output_dir.join(format!("packed_{split}.jsonl"));
            let count = self.pack_split(&cache, &tokenizer, &shards, &path)?;

            log::info!(
                "{split}: packed {count} examples of {} tokens -> {}",
                self.context_length,
                path.display(),
            );
        }

        Ok(())
    }

    /// Pack one split's shards into a JSONL file of training examples.
    fn pack_split(
        &self,
        cache: &ShardCache,
        tokenizer: &dyn SampleTokenizer<u32>,
        shards: &[usize],
        path: &Path,
    ) -> Result<usize, Box<dyn std::error::Error>> {
        let options = PackOptions::<u32>::new(self.context_length).with_eos_token(self.eos_token);

        let records = shards.iter().flat_map(|&shard| {
            match cache.read_shard_text(shard, &self.text_column) {
                Ok(rows) => rows
                    .into_iter()
                    .map(|text| Ok(text_record(text)))
                    .collect::<Vec<_>>(),
                Err(err) => vec![Err(ctxpack::CtxpackError::External(err.to_string()))],
            }
        });

        let mut writer = BufWriter::new(File::create(path)?);

        let mut count: usize = 0;
        for example in options.pack(tokenizer, records)? {
            let example = example?;
            write_record(&mut writer, &example)?;
            count += 1;
        }
        writer.flush()?;

        Ok(count)
    }
}

/// Wrap one text row as a `{"text": ...}` record.
fn text_record(text: String) -> Record {
    let mut record = Record::new();
    record.insert("text".to_string(), serde_json::Value::from(text));
    record
}
