//! Streaming reads of the delimited source files.
//!
//! [`SourceRows`] pulls one line at a time from any [`std::io::Read`], so the fact file is never
//! held in memory. Each line is split on its own: quotes are ordinary characters, and a blank line
//! is a malformed row rather than being skipped. Malformed rows come out as
//! `Err(PipelineError::RowParse(..))`; wrap the iterator in [`SourceRows::skip_malformed`] to
//! report and drop them while still propagating fatal stream errors.

use std::fs::File;
use std::io::{BufRead, BufReader, Read, Split};
use std::marker::PhantomData;
use std::path::Path;

use crate::error::{IoAction, PipelineError, PipelineResult, RowParseError};

use super::parser::{parse_line, FromRow};

/// Lazy sequence of parsed records from one source file.
pub struct SourceRows<T, R> {
    lines: Split<BufReader<R>>,
    line: u64,
    skip_header: bool,
    done: bool,
    _record: PhantomData<fn() -> T>,
}

impl<T: FromRow> SourceRows<T, File> {
    /// Open a source file for streaming.
    ///
    /// The header line is skipped when `T::KIND` has one (the fact file); every line of a
    /// header-less file (the dimension file) is treated as data.
    pub fn from_path(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PipelineError::MissingSource {
                path: path.to_path_buf(),
            });
        }
        let file = File::open(path).map_err(|e| PipelineError::io(IoAction::Read, path, e))?;
        Ok(Self::from_reader(file))
    }
}

impl<T: FromRow, R: Read> SourceRows<T, R> {
    /// Stream records from an arbitrary reader.
    pub fn from_reader(reader: R) -> Self {
        Self {
            lines: BufReader::new(reader).split(b'\n'),
            line: 0,
            skip_header: T::KIND.has_header(),
            done: false,
            _record: PhantomData,
        }
    }

    /// Drop malformed rows, handing each one to `on_skip`.
    ///
    /// Fatal errors (I/O while reading the stream) still come through as `Err`.
    pub fn skip_malformed<F>(self, on_skip: F) -> SkipMalformed<Self, F>
    where
        F: FnMut(RowParseError),
    {
        SkipMalformed {
            inner: self,
            on_skip,
        }
    }
}

impl<T: FromRow, R: Read> Iterator for SourceRows<T, R> {
    type Item = PipelineResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }
            let bytes = match self.lines.next()? {
                Ok(bytes) => bytes,
                Err(err) => {
                    self.done = true;
                    return Some(Err(PipelineError::Csv(csv::Error::from(err))));
                }
            };
            self.line += 1;
            if self.skip_header {
                self.skip_header = false;
                continue;
            }

            let bytes = bytes.strip_suffix(b"\r").unwrap_or(&bytes[..]);
            // Source extracts are not guaranteed to be valid UTF-8.
            let raw = String::from_utf8_lossy(bytes);
            return Some(parse_line::<T>(self.line, &raw).map_err(PipelineError::from));
        }
    }
}

/// Iterator adapter returned by [`SourceRows::skip_malformed`].
pub struct SkipMalformed<I, F> {
    inner: I,
    on_skip: F,
}

impl<T, I, F> Iterator for SkipMalformed<I, F>
where
    I: Iterator<Item = PipelineResult<T>>,
    F: FnMut(RowParseError),
{
    type Item = PipelineResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.inner.next()? {
                Err(PipelineError::RowParse(err)) => (self.on_skip)(err),
                other => return Some(other),
            }
        }
    }
}
