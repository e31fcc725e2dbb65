//! Child process output handling: line decoding, structured output
//! extraction and labelled console forwarding.
//!
//! The pipeline for a pack tool's stdout is
//! `FramedRead<_, LineDecoder>` → [`JsonExtractor`] → [`LinePrefixer`] → sink;
//! stderr skips the extractor.

pub mod extract;
pub mod lines;
pub mod prefix;

use std::io;

use futures::StreamExt;
use serde::de::DeserializeOwned;
use tokio::io::AsyncRead;
use tokio_util::codec::FramedRead;

pub use extract::{scan, ExtractState, JsonExtractor, ScanStatus};
pub use lines::LineDecoder;
pub use prefix::{ColorRegistry, LinePrefixer, MemorySink, OutputSink, StderrSink};

/// Forward every line of `reader` through `prefixer`. Returns the line count.
pub async fn forward_lines<R>(reader: R, prefixer: &LinePrefixer) -> io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut lines = FramedRead::new(reader, LineDecoder::new());
    let mut count = 0;
    while let Some(line) = lines.next().await {
        prefixer.emit_bytes(&line?);
        count += 1;
    }
    Ok(count)
}

/// Forward the text lines of `reader` through `prefixer` while capturing the
/// embedded JSON document, if any.
pub async fn extract_lines<R, T>(reader: R, prefixer: &LinePrefixer) -> io::Result<Option<T>>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let mut lines = FramedRead::new(reader, LineDecoder::new());
    let mut extractor = JsonExtractor::<T>::new();

    while let Some(line) = lines.next().await {
        let line = line?;
        for text in extractor.push_line(&String::from_utf8_lossy(&line)) {
            prefixer.emit(&text);
        }
    }
    for text in extractor.finish() {
        prefixer.emit(&text);
    }

    Ok(extractor.into_value())
}
