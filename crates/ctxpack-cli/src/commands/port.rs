use std::io::{BufRead, Write};

use ctxpack::Record;
use ctxpack_data::{
    chat::{DEFAULT_LANGUAGE, PortOptions},
    records::{read_records, write_record},
};

use crate::{
    input_output::{InputArgs, OutputArgs},
    logging::LogArgs,
};

/// Args for the port command.
#[derive(clap::Args, Debug)]
pub struct PortArgs {
    /// Keep only records in this language.
    #[arg(long, default_value = DEFAULT_LANGUAGE)]
    language: String,

    /// Records per parallel batch.
    #[arg(long, default_value = "1024")]
    batch_size: usize,

    #[command(flatten)]
    logging: LogArgs,

    #[command(flatten)]
    input: InputArgs,

    #[command(flatten)]
    output: OutputArgs,
}

impl PortArgs {
    /// Run the port command.
    pub fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.logging.setup_logging(3)?;

        let options = PortOptions::new().with_language(self.language.clone());

        let reader = self.input.open_reader()?;
        let mut writer = self.output.open_writer()?;

        let (kept, total) = run_port(&options, self.batch_size, reader, &mut *writer)?;

        log::info!("kept {kept} {} records of {total} read", self.language);

        Ok(())
    }
}

/// Port a JSONL record stream batch-by-batch.
///
/// Flushes the writer; a failed final flush is an error, not a
/// truncated output file.
///
/// ## Returns
/// A `(kept, total)` pair: records written and records read.
fn run_port<R: BufRead>(
    options: &PortOptions,
    batch_size: usize,
    reader: R,
    writer: &mut dyn Write,
) -> Result<(usize, usize), Box<dyn std::error::Error>> {
    let mut total: usize = 0;
    let mut kept: usize = 0;

    let mut batch = Vec::with_capacity(batch_size);
    for record in read_records(reader) {
        batch.push(record?);

        if batch.len() == batch_size {
            total += batch_size;
            kept += port_batch_to(options, &mut batch, writer)?;
        }
    }

    total += batch.len();
    kept += port_batch_to(options, &mut batch, writer)?;

    writer.flush()?;

    Ok((kept, total))
}

/// Port one buffered batch and write the kept records.
fn port_batch_to(
    options: &PortOptions,
    batch: &mut Vec<Record>,
    writer: &mut dyn Write,
) -> Result<usize, Box<dyn std::error::Error>> {
    let ported = options.port_batch(std::mem::take(batch))?;

    for record in &ported {
        write_record(writer, record)?;
    }

    Ok(ported.len())
}
