//! Resumable single-stream downloads.
//!
//! Bytes received so far live in `<destination>.part`. The size of that file is
//! the resume offset: every byte in it was written contiguously from offset 0.
//! Only after the body has been fully written and synced is the part file
//! renamed onto the destination, so the destination is either absent or complete.

use crate::core::config::Config;
use crate::core::progress::ProgressSink;
use crate::error::{Result, VolfetchError};
use crate::utils::fs;
use reqwest::blocking::{Client, Response};
use reqwest::header::{CONTENT_RANGE, RANGE};
use reqwest::StatusCode;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

pub const PART_SUFFIX: &str = ".part";

/// Path of the partial artifact that backs `destination` while it downloads.
pub fn part_path(destination: &Path) -> PathBuf {
    fs::with_appended_suffix(destination, PART_SUFFIX)
}

/// Total length from a `Content-Range` value such as `bytes 4000000-9999999/10000000`.
/// Returns `None` for an unknown (`*`) or malformed total.
pub fn parse_content_range_total(value: &str) -> Option<u64> {
    let (_, total) = value.rsplit_once('/')?;
    total.trim().parse().ok()
}

/// Expected size of the finished file. A `Content-Range` header wins when present,
/// even if its total cannot be parsed; otherwise the body length plus the offset.
pub fn expected_total(
    content_range: Option<&str>,
    content_length: Option<u64>,
    offset: u64,
) -> Option<u64> {
    match content_range {
        Some(value) => parse_content_range_total(value),
        None => content_length.and_then(|len| len.checked_add(offset)),
    }
}

/// Splits a reader into chunks of at most `chunk_size` bytes.
/// The final chunk may be empty when the input ends on a chunk boundary.
pub struct Chunks<R> {
    reader: R,
    chunk_size: usize,
    done: bool,
}

impl<R: Read> Chunks<R> {
    pub fn new(reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            chunk_size: chunk_size.max(1),
            done: false,
        }
    }
}

impl<R: Read> Iterator for Chunks<R> {
    type Item = io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut buf = vec![0u8; self.chunk_size];
        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => {
                    self.done = true;
                    break;
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
        buf.truncate(filled);
        Some(Ok(buf))
    }
}

/// Writes every nonempty chunk and reports it to `progress`. Empty chunks are
/// skipped rather than treated as end of stream. Returns the bytes written.
pub fn write_chunks<I, C, W>(
    chunks: I,
    writer: &mut W,
    progress: &mut dyn ProgressSink,
) -> Result<u64>
where
    I: IntoIterator<Item = io::Result<C>>,
    C: AsRef<[u8]>,
    W: Write,
{
    let mut written = 0u64;
    for chunk in chunks {
        let chunk = chunk?;
        let bytes = chunk.as_ref();
        if bytes.is_empty() {
            continue;
        }
        writer.write_all(bytes)?;
        written += bytes.len() as u64;
        progress.advance(bytes.len() as u64);
    }
    Ok(written)
}

/// Streams `reader` into the part file and syncs it to disk. The progress sink is
/// finished whether or not the transfer succeeds.
pub fn write_part<R: Read>(
    reader: R,
    part: &Path,
    append: bool,
    chunk_size: usize,
    progress: &mut dyn ProgressSink,
) -> Result<u64> {
    let result = stream_to_part(reader, part, append, chunk_size, progress);
    progress.finish();
    result
}

fn stream_to_part<R: Read>(
    reader: R,
    part: &Path,
    append: bool,
    chunk_size: usize,
    progress: &mut dyn ProgressSink,
) -> Result<u64> {
    let file = fs::open_for_write(part, append)?;
    let mut writer = BufWriter::with_capacity(chunk_size, file);
    let written = write_chunks(Chunks::new(reader, chunk_size), &mut writer, progress)?;
    fs::sync_and_close(writer)?;
    Ok(written)
}

/// What a completed fetch did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    pub destination: PathBuf,
    /// Offset the body was appended at; zero for a fresh or restarted transfer.
    pub resumed_from: u64,
    pub bytes_written: u64,
    pub total: Option<u64>,
    /// The source ignored the range request and the transfer started over.
    pub restarted: bool,
}

impl FetchOutcome {
    pub fn final_len(&self) -> u64 {
        self.resumed_from + self.bytes_written
    }
}

pub struct Fetcher {
    client: Client,
    chunk_size: usize,
}

impl Fetcher {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(config.connect_timeout())
            .timeout(config.read_timeout())
            .build()?;

        Ok(Self {
            client,
            chunk_size: config.chunk_size,
        })
    }

    /// Downloads `source` to `destination`, resuming from an existing part file.
    pub fn fetch(
        &self,
        source: &str,
        destination: &Path,
        progress: &mut dyn ProgressSink,
    ) -> Result<FetchOutcome> {
        let part = part_path(destination);
        if let Some(parent) = part.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::ensure_dir_exists(parent)?;
        }

        let mut offset = fs::existing_len(&part)?;
        let mut restarted = false;
        let mut response = self.request(source, offset)?;

        if offset > 0 && is_range_ignored(response.status()) {
            tracing::warn!(
                url = source,
                offset,
                status = response.status().as_u16(),
                "source ignored range request, restarting from zero"
            );
            drop(response);
            fs::remove_file_if_exists(&part)?;
            offset = 0;
            restarted = true;
            response = self.request(source, 0)?;
        }

        let status = response.status();
        if !status.is_success() {
            return Err(VolfetchError::HttpStatus {
                url: source.to_string(),
                status: status.as_u16(),
            });
        }

        let content_range = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let total = expected_total(content_range.as_deref(), response.content_length(), offset);

        tracing::info!(
            url = source,
            destination = %destination.display(),
            offset,
            total = ?total,
            "starting transfer"
        );

        let label = destination
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        progress.begin(&label, total, offset);

        let written = write_part(&mut response, &part, offset > 0, self.chunk_size, progress)?;

        fs::atomic_rename(&part, destination)?;

        let outcome = FetchOutcome {
            destination: destination.to_path_buf(),
            resumed_from: offset,
            bytes_written: written,
            total,
            restarted,
        };
        tracing::info!(
            destination = %destination.display(),
            bytes = outcome.final_len(),
            "transfer complete"
        );
        Ok(outcome)
    }

    fn request(&self, source: &str, offset: u64) -> Result<Response> {
        let mut request = self.client.get(source);
        if offset > 0 {
            request = request.header(RANGE, format!("bytes={offset}-"));
        }
        Ok(request.send()?)
    }
}

/// A success status other than 206 in reply to a range request means the
/// source sent the whole body from the start.
fn is_range_ignored(status: StatusCode) -> bool {
    status.is_success() && status != StatusCode::PARTIAL_CONTENT
}
