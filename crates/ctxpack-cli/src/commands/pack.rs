use std::io::{BufRead, Write};

use ctxpack::{
    PackOptions,
    packer::DEFAULT_EOS_TOKEN,
    tokenize::{HfSampleTokenizer, SampleTokenizer},
};
use ctxpack_data::records::{read_records, write_record};

use crate::{
    input_output::{InputArgs, OutputArgs},
    logging::LogArgs,
};

/// Args for the pack command.
#[derive(clap::Args, Debug)]
pub struct PackArgs {
    /// Path to a `tokenizer.json` file.
    #[arg(long)]
    tokenizer: String,

    /// Tokens per packed example.
    #[arg(long)]
    context_length: usize,

    /// End-of-sequence marker id appended after each document.
    #[arg(long, default_value_t = DEFAULT_EOS_TOKEN)]
    eos_token: u32,

    /// Key of the text field in input records.
    #[arg(long, default_value = "text")]
    text_key: String,

    #[command(flatten)]
    logging: LogArgs,

    #[command(flatten)]
    input: InputArgs,

    #[command(flatten)]
    output: OutputArgs,
}

impl PackArgs {
    /// Run the pack command.
    pub fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.logging.setup_logging(3)?;

        let tokenizer = HfSampleTokenizer::from_file(&self.tokenizer)?;

        let reader = self.input.open_reader()?;
        let mut writer = self.output.open_writer()?;

        let options = PackOptions::<u32>::new(self.context_length)
            .with_eos_token(self.eos_token)
            .with_text_key(self.text_key.clone());

        let count = run_pack(options, &tokenizer, reader, &mut *writer)?;

        log::info!(
            "packed {count} examples of {} tokens",
            self.context_length
        );

        Ok(())
    }
}

/// Pack a JSONL record stream into packed-example JSONL.
///
/// Flushes the writer; a failed final flush is an error, not a
/// truncated output file.
fn run_pack<R: BufRead>(
    options: PackOptions<u32>,
    tokenizer: &dyn SampleTokenizer<u32>,
    reader: R,
    writer: &mut dyn Write,
) -> Result<usize, Box<dyn std::error::Error>> {
    let mut count: usize = 0;
    for example in options.pack(tokenizer, read_records(reader))? {
        let example = example?;
        write_record(writer, &example)?;
        count += 1;
    }

    writer.flush()?;

    Ok(count)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use ctxpack::{CPResult, CtxpackError};

    use super::*;

    /// Maps each character to its base-36 ordinal: `'a' -> 10`, ...
    struct OrdinalTokenizer;

    impl SampleTokenizer<u32> for OrdinalTokenizer {
        fn try_tokenize(
            &self,
            text: &str,
        ) -> CPResult<Vec<u32>> {
            text.chars()
                .map(|c| {
                    c.to_digit(36)
                        .ok_or_else(|| CtxpackError::Tokenizer(format!("non-ordinal char {c:?}")))
                })
                .collect()
        }
    }

    /// Accepts writes, fails on flush.
    struct FlushFailWriter;

    impl Write for FlushFailWriter {
        fn write(
            &mut self,
            buf: &[u8],
        ) -> std::io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::other("device full"))
        }
    }

    #[test]
    fn test_run_pack_writes_examples() {
        let input = "{\"text\": \"ab\"}\n{\"text\": \"cd\"}\n";

        let mut out = Vec::new();
        let count = run_pack(
            PackOptions::new(3),
            &OrdinalTokenizer,
            Cursor::new(input),
            &mut out,
        )
        .unwrap();

        assert_eq!(count, 2);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"input_ids\":[10,11,2]"));
        assert!(lines[1].contains("\"input_ids\":[12,13,2]"));
    }

    #[test]
    fn test_run_pack_surfaces_flush_errors() {
        let input = "{\"text\": \"ab\"}\n";

        let result = run_pack(
            PackOptions::new(3),
            &OrdinalTokenizer,
            Cursor::new(input),
            &mut FlushFailWriter,
        );

        assert!(result.is_err());
    }
}
