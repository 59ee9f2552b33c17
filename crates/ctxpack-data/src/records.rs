//! # JSONL Sample Records

use std::io::{BufRead, Write};

use ctxpack::{CPResult, CtxpackError, Record};

/// An iterator over JSONL [`Record`]s from a buffered reader.
///
/// Terminates at end-of-file; a malformed line is surfaced as an error,
/// after which the iterator fuses.
pub struct RecordReader<R: BufRead> {
    reader: R,
    done: bool,
}

impl<R: BufRead> RecordReader<R> {
    /// Wrap a buffered reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            done: false,
        }
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = CPResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match jsonl::read(&mut self.reader) {
            Ok(record) => Some(Ok(record)),
            Err(jsonl::ReadError::Eof) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(CtxpackError::External(err.to_string())))
            }
        }
    }
}

/// Read all JSONL records from a buffered reader.
pub fn read_records<R: BufRead>(reader: R) -> RecordReader<R> {
    RecordReader::new(reader)
}

/// Write one value as a JSONL line.
pub fn write_record<W, T>(
    writer: &mut W,
    value: &T,
) -> CPResult<()>
where
    W: Write + ?Sized,
    T: serde::Serialize,
{
    serde_json::to_writer(&mut *writer, value)?;
    writer.write_all(b"\n")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn test_read_records() {
        let text = "{\"text\": \"hello\"}\n{\"text\": \"world\", \"language\": \"Italian\"}\n";

        let records: Vec<Record> = read_records(Cursor::new(text))
            .collect::<CPResult<Vec<_>>>()
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("text").unwrap(), "hello");
        assert_eq!(records[1].get("language").unwrap(), "Italian");
    }

    #[test]
    fn test_empty_input() {
        let records: Vec<CPResult<Record>> = read_records(Cursor::new("")).collect();
        assert!(records.is_empty());
    }

    #[test]
    fn test_malformed_line_fuses() {
        let text = "{\"text\": \"ok\"}\nnot json\n{\"text\": \"unreached\"}\n";
        let mut reader = read_records(Cursor::new(text));

        assert!(reader.next().unwrap().is_ok());
        assert!(reader.next().unwrap().is_err());
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_write_read_round_trip() {
        let mut record = Record::new();
        record.insert("text".to_string(), serde_json::json!("ciao"));

        let mut buffer = Vec::new();
        write_record(&mut buffer, &record).unwrap();

        let back: Vec<Record> = read_records(Cursor::new(buffer))
            .collect::<CPResult<Vec<_>>>()
            .unwrap();

        assert_eq!(back, vec![record]);
    }
}
