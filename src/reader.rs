// reader.rs
//
// Line streaming over possibly gzip-compressed text files. Whether a file is
// compressed is decided by its leading magic bytes, not its extension, so a
// plain-text file with a `.gz` name and a gzipped file with no extension both
// read correctly.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;

use crate::error::{Error, Result};
use crate::text::strip_back;

/// Size of the fixed read chunks used on both the raw and decoded layers.
pub const READ_CHUNK_SIZE: usize = 512;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Open a file for buffered reading, transparently decoding gzip.
pub fn open_maybe_gzip(path: &Path) -> Result<Box<dyn BufRead>> {
    let io_err = |source| Error::Io { path: path.to_path_buf(), source };

    let file = File::open(path).map_err(io_err)?;
    let mut raw = BufReader::with_capacity(READ_CHUNK_SIZE, file);
    let magic = raw.fill_buf().map_err(io_err)?;

    if magic.len() >= 2 && magic[..2] == GZIP_MAGIC {
        Ok(Box::new(BufReader::with_capacity(
            READ_CHUNK_SIZE,
            MultiGzDecoder::new(raw),
        )))
    } else {
        Ok(Box::new(raw))
    }
}

/// A lazy, forward-only sequence of logical lines from a text file.
///
/// Lines are split on `'\n'`; the terminator and any trailing `'\r'` are
/// stripped. A file that ends with a terminator yields one final empty line
/// after it, a file that ends mid-line does not, and a completely empty file
/// yields exactly one empty line. Restarting requires reopening the file.
pub struct LineSource {
    path: PathBuf,
    reader: Box<dyn BufRead>,
    pending_final_empty: bool,
    done: bool,
}

impl LineSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let reader = open_maybe_gzip(&path)?;
        Ok(Self {
            path,
            reader,
            pending_final_empty: true,
            done: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The next logical line, or `None` once the stream is exhausted.
    ///
    /// Bytes that are not valid UTF-8 are carried through lossily; they are
    /// treated as opaque field content, never as an error.
    pub fn next_line(&mut self) -> io::Result<Option<String>> {
        if self.done {
            return Ok(None);
        }

        let mut buf = Vec::new();
        let n = self.reader.read_until(b'\n', &mut buf)?;
        if n == 0 {
            self.done = true;
            if self.pending_final_empty {
                return Ok(Some(String::new()));
            }
            return Ok(None);
        }

        let terminated = buf.last() == Some(&b'\n');
        if terminated {
            buf.pop();
        }
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
        self.pending_final_empty = terminated;

        Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
    }
}

impl Iterator for LineSource {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_line().transpose()
    }
}

/// Collect every logical line of a file.
pub fn read_all_lines(path: &Path) -> Result<Vec<String>> {
    let mut source = LineSource::open(path)?;
    let mut lines = Vec::new();
    while let Some(line) = source
        .next_line()
        .map_err(|source| Error::Io { path: path.to_path_buf(), source })?
    {
        lines.push(line);
    }
    Ok(lines)
}

/// Count the lines that are non-empty after trailing-whitespace stripping.
pub fn count_nonempty_lines(path: &Path) -> Result<u64> {
    let mut source = LineSource::open(path)?;
    let mut count = 0u64;
    while let Some(line) = source
        .next_line()
        .map_err(|source| Error::Io { path: path.to_path_buf(), source })?
    {
        if !strip_back(&line).is_empty() {
            count += 1;
        }
    }
    Ok(count)
}

/// Resolve a path given as a base plus one of several possible extensions.
///
/// Returns the first `base + ext` that exists, trying extensions in the order
/// given, or `None` if no candidate exists.
pub fn resolve_with_extensions(base: &Path, extensions: &[&str]) -> Option<PathBuf> {
    for ext in extensions {
        let candidate = PathBuf::from(format!("{}{}", base.display(), ext));
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    use flate2::write::GzEncoder;
    use flate2::Compression;
    use tempfile::TempDir;

    fn write_plain(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn write_gz(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all(content).unwrap();
        encoder.finish().unwrap();
        path
    }

    fn lines_of(path: &Path) -> Vec<String> {
        read_all_lines(path).unwrap()
    }

    #[test]
    fn basic_file_with_trailing_newline() {
        let dir = TempDir::new().unwrap();
        let content = b"line 1\nline 2\nline 3\n";
        for path in [
            write_plain(&dir, "plain.txt", content),
            write_gz(&dir, "compressed.txt.gz", content),
        ] {
            let lines = lines_of(&path);
            assert_eq!(lines, vec!["line 1", "line 2", "line 3", ""]);
        }
    }

    #[test]
    fn basic_file_without_trailing_newline() {
        let dir = TempDir::new().unwrap();
        let content = b"line 1\nline 2\nline 3";
        for path in [
            write_plain(&dir, "plain.txt", content),
            write_gz(&dir, "compressed.txt.gz", content),
        ] {
            let lines = lines_of(&path);
            assert_eq!(lines, vec!["line 1", "line 2", "line 3"]);
        }
    }

    #[test]
    fn crlf_terminators_are_stripped() {
        let dir = TempDir::new().unwrap();
        let path = write_plain(&dir, "crlf.txt", b"line 1\r\nline 2\r\n");
        assert_eq!(lines_of(&path), vec!["line 1", "line 2", ""]);
    }

    #[test]
    fn lines_around_the_chunk_boundary() {
        let dir = TempDir::new().unwrap();
        for length in [READ_CHUNK_SIZE - 1, READ_CHUNK_SIZE, READ_CHUNK_SIZE + 1] {
            let long = "z".repeat(length);
            let header = format!("Next line has {} z:", length);

            let with_newline = format!("{}\n{}\n", header, long);
            let gz = write_gz(&dir, &format!("{}_newline.gz", length), with_newline.as_bytes());
            assert_eq!(lines_of(&gz), vec![header.clone(), long.clone(), String::new()]);

            let without_newline = format!("{}\n{}", header, long);
            let gz = write_gz(&dir, &format!("{}_no_newline.gz", length), without_newline.as_bytes());
            assert_eq!(lines_of(&gz), vec![header, long]);
        }
    }

    #[test]
    fn very_long_line_spanning_many_chunks() {
        let dir = TempDir::new().unwrap();
        let long = "z".repeat(8192);

        let gz = write_gz(&dir, "long_newline.gz", format!("Next line has 8192 z:\n{}\n", long).as_bytes());
        assert_eq!(lines_of(&gz), vec!["Next line has 8192 z:".to_owned(), long.clone(), String::new()]);

        let gz = write_gz(&dir, "long_no_newline.gz", format!("Next line has 8192 z:\n{}", long).as_bytes());
        assert_eq!(lines_of(&gz), vec!["Next line has 8192 z:".to_owned(), long]);
    }

    #[test]
    fn empty_file_yields_one_empty_line() {
        let dir = TempDir::new().unwrap();
        for path in [write_plain(&dir, "empty", b""), write_gz(&dir, "empty.gz", b"")] {
            assert_eq!(lines_of(&path), vec![""]);
        }
    }

    #[test]
    fn newline_only_file_yields_empty_lines() {
        let dir = TempDir::new().unwrap();
        let path = write_plain(&dir, "newlines", b"\n\n");
        assert_eq!(lines_of(&path), vec!["", "", ""]);
    }

    #[test]
    fn open_fails_for_missing_file() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("does_not_exist");
        assert!(matches!(LineSource::open(&missing), Err(Error::Io { .. })));
    }

    #[test]
    fn count_nonempty_lines_cases() {
        let dir = TempDir::new().unwrap();

        let empty = write_gz(&dir, "empty.gz", b"");
        assert_eq!(count_nonempty_lines(&empty).unwrap(), 0);

        let newlines = write_gz(&dir, "newlines.gz", b"\n\n");
        assert_eq!(count_nonempty_lines(&newlines).unwrap(), 0);

        let with_newline = write_gz(&dir, "three.gz", b"line 1\nline 2\nline 3\n");
        assert_eq!(count_nonempty_lines(&with_newline).unwrap(), 3);

        let without_newline = write_gz(&dir, "three_bare.gz", b"line 1\nline 2\nline 3");
        assert_eq!(count_nonempty_lines(&without_newline).unwrap(), 3);
    }

    #[test]
    fn resolve_with_extensions_picks_first_match() {
        let dir = TempDir::new().unwrap();
        write_plain(&dir, "test.hap", b"");
        write_plain(&dir, "test.samples", b"");
        let base = dir.path().join("test");

        assert_eq!(resolve_with_extensions(&base, &[".not_exist"]), None);
        assert_eq!(resolve_with_extensions(&base, &[]), None);
        assert_eq!(
            resolve_with_extensions(&base, &[".hap", ".samples"]),
            Some(dir.path().join("test.hap"))
        );
        assert_eq!(
            resolve_with_extensions(&base, &[".samples", ".hap"]),
            Some(dir.path().join("test.samples"))
        );
    }
}
