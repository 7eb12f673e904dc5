//! Parses a query file (FASTA or FASTQ, auto-detected from the first
//! record's leading sigil) into ordered `(id, sequence)` records.

use std::io;
use std::path::Path;

/// One query record: its identifier (the header line with the
/// leading sigil and everything after the first whitespace run
/// stripped) and its raw base string.
pub struct Record {
  /// The record identifier.
  pub id: String,
  /// The raw, undecoded base string (used both to derive the pattern
  /// length and to feed the minimiser stream).
  pub sequence: String,
}

/// Reads every record from `path`.
pub fn read_records(path: &Path) -> io::Result<Vec<Record>> {
  let contents = std::fs::read_to_string(path)?;
  let mut lines = contents.lines().peekable();

  let mut records = Vec::new();
  while let Some(line) = lines.next() {
    if let Some(rest) = line.strip_prefix('>') {
      let id = first_token(rest);
      let mut sequence = String::new();
      while let Some(&next) = lines.peek() {
        if next.starts_with('>') {
          break;
        }
        sequence.push_str(lines.next().unwrap().trim_end());
      }
      records.push(Record { id, sequence });
    } else if let Some(rest) = line.strip_prefix('@') {
      let id = first_token(rest);
      let sequence = lines.next().unwrap_or_default().trim_end().to_string();
      lines.next(); // '+' separator line
      lines.next(); // quality line, same length as sequence
      records.push(Record { id, sequence });
    }
  }
  Ok(records)
}

fn first_token(rest: &str) -> String {
  rest.split_whitespace().next().unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_fasta_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("q.fa");
    std::fs::write(&path, ">r1 desc\nACGT\nACGT\n>r2\nTTTT\n").unwrap();

    let records = read_records(&path).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, "r1");
    assert_eq!(records[0].sequence, "ACGTACGT");
    assert_eq!(records[1].id, "r2");
    assert_eq!(records[1].sequence, "TTTT");
  }

  #[test]
  fn parses_fastq_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("q.fq");
    std::fs::write(&path, "@r1\nACGTACGT\n+\nIIIIIIII\n@r2\nTTTT\n+\nIIII\n").unwrap();

    let records = read_records(&path).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, "r1");
    assert_eq!(records[0].sequence, "ACGTACGT");
    assert_eq!(records[1].sequence, "TTTT");
  }
}
