//! Message sources feeding the consumer.

use std::path::Path;

use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::error::Result;

/// Pull-based stream of raw order messages
#[async_trait]
pub trait MessageSource: Send {
    /// Next message payload, or `None` once the source is exhausted.
    async fn next_message(&mut self) -> Result<Option<Vec<u8>>>;
}

/// One JSON document per line. Blank lines are skipped.
pub struct JsonLinesSource<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R> JsonLinesSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
        }
    }
}

impl JsonLinesSource<BufReader<File>> {
    /// Open a JSON-lines file.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path).await?;
        Ok(Self::new(BufReader::new(file)))
    }
}

fn trim_line(line: &[u8]) -> &[u8] {
    let start = line
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(line.len());
    let end = line
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &line[start..end]
}

#[async_trait]
impl<R> MessageSource for JsonLinesSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn next_message(&mut self) -> Result<Option<Vec<u8>>> {
        loop {
            self.buf.clear();
            if self.reader.read_until(b'\n', &mut self.buf).await? == 0 {
                return Ok(None);
            }

            let line = trim_line(&self.buf);
            if !line.is_empty() {
                return Ok(Some(line.to_vec()));
            }
        }
    }
}

/// In-process publishers push payloads through a channel.
#[async_trait]
impl MessageSource for mpsc::Receiver<Vec<u8>> {
    async fn next_message(&mut self) -> Result<Option<Vec<u8>>> {
        Ok(self.recv().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_json_lines_skips_blank_lines() {
        let input: &[u8] = b"{\"a\":1}\n\n   \r\n{\"b\":2}\r\n{\"c\":3}";
        let mut source = JsonLinesSource::new(input);

        assert_eq!(source.next_message().await.unwrap().unwrap(), b"{\"a\":1}");
        assert_eq!(source.next_message().await.unwrap().unwrap(), b"{\"b\":2}");
        assert_eq!(source.next_message().await.unwrap().unwrap(), b"{\"c\":3}");
        assert!(source.next_message().await.unwrap().is_none());
        assert!(source.next_message().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_json_lines_passes_invalid_utf8_through() {
        let input: &[u8] = b"\xff\xfe\n";
        let mut source = JsonLinesSource::new(input);

        assert_eq!(source.next_message().await.unwrap().unwrap(), b"\xff\xfe");
    }

    #[tokio::test]
    async fn test_open_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.jsonl");
        std::fs::write(&path, "{}\n{}\n").unwrap();

        let mut source = JsonLinesSource::open(&path).await.unwrap();
        let mut count = 0;
        while source.next_message().await.unwrap().is_some() {
            count += 1;
        }
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_channel_source_ends_when_senders_drop() {
        let (tx, mut rx) = mpsc::channel(4);
        tx.send(b"one".to_vec()).await.unwrap();
        drop(tx);

        assert_eq!(rx.next_message().await.unwrap().unwrap(), b"one");
        assert!(rx.next_message().await.unwrap().is_none());
    }

    #[test]
    fn test_trim_line() {
        assert_eq!(trim_line(b"  x \r\n"), b"x");
        assert_eq!(trim_line(b" \t\r\n"), b"");
        assert_eq!(trim_line(b""), b"");
    }
}
