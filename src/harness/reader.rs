use std::io::{BufRead, ErrorKind};

use super::error::HarnessError;

/// The initial capacity of the line buffer. It doubles whenever a line does not fit.
pub const INITIAL_CAPACITY: usize = 128;

/// Reads lines of arbitrary length from a buffered byte stream.
pub struct LineReader<R: BufRead> {
    inner: R,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(inner: R) -> LineReader<R> {
        LineReader { inner }
    }

    /// Read the next line without its terminator. A `\r` before the `\n` is removed as well.
    ///
    /// Returns `None` only when the stream ends before any byte is read, so
    /// that a final line without a terminator is still returned.
    pub fn read_line(&mut self) -> Result<Option<String>, HarnessError> {
        let mut line = Vec::new();
        grow(&mut line, INITIAL_CAPACITY)?;

        let mut read_any = false;
        loop {
            let available = match self.inner.fill_buf() {
                Ok(b) => b,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(HarnessError::Read(e)),
            };

            if available.is_empty() {
                break;
            }
            read_any = true;

            let (used, done) = match available.iter().position(|c| *c == b'\n') {
                Some(i) => {
                    grow(&mut line, i)?;
                    line.extend_from_slice(&available[..i]);
                    (i + 1, true)
                }
                None => {
                    grow(&mut line, available.len())?;
                    line.extend_from_slice(available);
                    (available.len(), false)
                }
            };

            self.inner.consume(used);

            if done {
                break;
            }
        }

        if !read_any {
            return Ok(None);
        }

        if line.last() == Some(&b'\r') {
            line.pop();
        }

        Ok(Some(String::from_utf8(line)?))
    }
}

impl<R: BufRead> Iterator for LineReader<R> {
    type Item = Result<String, HarnessError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_line().transpose()
    }
}

/// Make room for `additional` bytes, doubling the capacity until they fit.
fn grow(line: &mut Vec<u8>, additional: usize) -> Result<(), HarnessError> {
    let needed = line
        .len()
        .checked_add(additional)
        .ok_or(HarnessError::OutOfMemory)?;
    if needed <= line.capacity() {
        return Ok(());
    }

    let mut capacity = line.capacity().max(INITIAL_CAPACITY);
    while capacity < needed {
        capacity = capacity.checked_mul(2).ok_or(HarnessError::OutOfMemory)?;
    }

    line.try_reserve_exact(capacity - line.len())
        .map_err(|_| HarnessError::OutOfMemory)
}

#[cfg(test)]
mod test {
    use std::io::{BufReader, Cursor};

    use crate::harness::error::HarnessError;

    use super::{LineReader, INITIAL_CAPACITY};

    #[test]
    fn final_line_without_terminator() {
        let mut r = LineReader::new(Cursor::new("abc\ndef"));
        assert_eq!(r.read_line().unwrap().as_deref(), Some("abc"));
        assert_eq!(r.read_line().unwrap().as_deref(), Some("def"));
        assert_eq!(r.read_line().unwrap(), None);
    }

    #[test]
    fn empty_stream() {
        let mut r = LineReader::new(Cursor::new(""));
        assert_eq!(r.read_line().unwrap(), None);
    }

    #[test]
    fn crlf_and_empty_lines() {
        let r = LineReader::new(Cursor::new("a\r\n\nb\n"));
        let lines: Vec<String> = r.map(|l| l.unwrap()).collect();
        assert_eq!(lines, vec!["a", "", "b"]);
    }

    #[test]
    fn long_line_across_buffer_boundaries() {
        let long = "x".repeat(INITIAL_CAPACITY * 5 + 3);
        let data = format!("{}\nshort\n", long);
        // a tiny buffer forces the line to be assembled from many chunks
        let mut r = LineReader::new(BufReader::with_capacity(7, Cursor::new(data)));
        assert_eq!(r.read_line().unwrap(), Some(long));
        assert_eq!(r.read_line().unwrap().as_deref(), Some("short"));
        assert_eq!(r.read_line().unwrap(), None);
    }

    #[test]
    fn invalid_utf8() {
        let mut r = LineReader::new(Cursor::new(vec![b'a', 0xff, b'\n']));
        assert!(matches!(r.read_line(), Err(HarnessError::Encoding(_))));
    }
}
