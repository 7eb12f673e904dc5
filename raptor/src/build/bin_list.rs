//! Parses a bin-list file: one technical bin per line, each a
//! whitespace-separated list of file paths. Empty lines are ignored.
//! In SOCKS mode the first token on a line is a colour name followed
//! by `:`; it is stripped and otherwise ignored by the core.

use std::path::PathBuf;

/// One technical bin's contributing files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bin {
  /// The files contributing to this technical bin, in file order.
  pub files: Vec<PathBuf>,
}

/// Parses the contents of a bin-list file into its bins, in line
/// order (which becomes technical bin index order).
///
/// `socks` selects SOCKS mode: when `true`, each line's leading colour
/// token (a bare word immediately followed by `:`) is stripped before
/// the remaining tokens are read as file paths. Stripping never
/// happens when `socks` is `false`, so a non-SOCKS bin-list's first
/// path is never mistaken for a colour token.
pub fn parse(contents: &str, socks: bool) -> Vec<Bin> {
  contents
    .lines()
    .map(str::trim)
    .filter(|line| !line.is_empty())
    .map(|line| parse_line(line, socks))
    .collect()
}

fn parse_line(line: &str, socks: bool) -> Bin {
  let mut tokens = line.split_whitespace().peekable();

  if socks {
    if let Some(first) = tokens.peek() {
      if is_socks_color_token(first) {
        tokens.next();
      }
    }
  }

  Bin {
    files: tokens.map(PathBuf::from).collect(),
  }
}

/// A SOCKS colour token is a bare word (no path separators or
/// extension-like dot) immediately followed by `:` with no space.
fn is_socks_color_token(token: &str) -> bool {
  match token.strip_suffix(':') {
    Some(name) => !name.is_empty() && !name.contains(['/', '\\', '.']),
    None => false,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_plain_bins() {
    let bins = parse("a.fa b.fa\nc.fa\n\nd.fa e.fa f.fa\n", false);
    assert_eq!(bins.len(), 3);
    assert_eq!(bins[0].files, vec![PathBuf::from("a.fa"), PathBuf::from("b.fa")]);
    assert_eq!(bins[1].files, vec![PathBuf::from("c.fa")]);
  }

  #[test]
  fn strips_socks_color_token_when_socks_mode_is_on() {
    let bins = parse("red: a.fa b.fa\nblue: c.fa\n", true);
    assert_eq!(bins[0].files, vec![PathBuf::from("a.fa"), PathBuf::from("b.fa")]);
    assert_eq!(bins[1].files, vec![PathBuf::from("c.fa")]);
  }

  #[test]
  fn does_not_strip_a_color_token_when_socks_mode_is_off() {
    // Without --socks, a leading "name:" token is just a path to keep,
    // not a colour token to drop.
    let bins = parse("red: a.fa\n", false);
    assert_eq!(bins[0].files, vec![PathBuf::from("red:"), PathBuf::from("a.fa")]);
  }

  #[test]
  fn does_not_strip_paths_that_merely_contain_a_colon_like_token() {
    // A path is never mistaken for a colour token: it contains '/' or '.'.
    let bins = parse("dir/a.fa\n", true);
    assert_eq!(bins[0].files, vec![PathBuf::from("dir/a.fa")]);
  }

  #[test]
  fn ignores_blank_lines() {
    let bins = parse("\n\na.fa\n\n\nb.fa\n", false);
    assert_eq!(bins.len(), 2);
  }
}
