use anyhow::{bail, Context, Result};
use bio::io::fasta;
use std::io::Read;

/// Reads the query sequence from the first record of a FASTA file.
///
/// Only one query is submitted per run, so any further records are ignored with a warning.
///
/// # Errors
///
/// This function will return an error if:
/// * The file cannot be opened or is not valid FASTA.
/// * The file contains no records, or the first record has an empty sequence.
/// * The sequence is not valid UTF-8.
pub fn read_fasta_sequence(path: &str) -> Result<String> {
    let file = std::fs::File::open(path).with_context(|| format!("Unable to open file {path}"))?;
    read_first_record(file).with_context(|| format!("Unable to read a sequence from {path}"))
}

fn read_first_record<R: Read>(reader: R) -> Result<String> {
    let mut records = fasta::Reader::new(reader).records();

    let Some(first) = records.next() else {
        bail!("no FASTA records found");
    };
    let first = first.context("Invalid FASTA record")?;

    let remaining = records.count();
    if remaining > 0 {
        warn!(
            "Ignoring {remaining} further record(s); only '{}' will be submitted",
            first.id()
        );
    }

    let sequence = String::from_utf8(first.seq().to_vec())?;
    if sequence.is_empty() {
        bail!("record '{}' has an empty sequence", first.id());
    }

    Ok(sequence)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_multiline_record() {
        let data = b">query some description\nMKVLA\nGHKLE\n";
        assert_eq!(read_first_record(&data[..]).unwrap(), "MKVLAGHKLE");
    }

    #[test]
    fn only_first_record_is_used() {
        let data = b">a\nMKV\n>b\nLLL\n";
        assert_eq!(read_first_record(&data[..]).unwrap(), "MKV");
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(read_first_record(&b""[..]).is_err());
    }

    #[test]
    fn empty_sequence_is_an_error() {
        let err = read_first_record(&b">empty\n"[..]).unwrap_err();
        assert!(err.to_string().contains("empty sequence"));
    }
}
