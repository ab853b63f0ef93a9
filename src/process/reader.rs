//! @ai:module:intent Background draining of one child output stream into a pollable queue
//! @ai:module:layer infrastructure
//! @ai:module:public_api NonBlockingReader
//! @ai:module:stateless false

use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const CHUNK_SIZE: usize = 8 * 1024;

/// @ai:intent Non-blocking "everything available so far" view over a blocking byte stream
///
/// A dedicated task reads the stream until end-of-stream and pushes every chunk
/// onto an unbounded queue, so a full pipe buffer on one stream can never stall
/// the other stream or the control loop. Chunks are handed out exactly once.
pub struct NonBlockingReader {
    name: &'static str,
    receiver: mpsc::UnboundedReceiver<Vec<u8>>,
    worker: Option<JoinHandle<()>>,
}

impl NonBlockingReader {
    /// @ai:intent Start the background read loop on `stream`
    /// @ai:pre called from within a tokio runtime
    /// @ai:effects io
    pub fn attach<R>(name: &'static str, stream: R) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (sender, receiver) = mpsc::unbounded_channel();
        let worker = tokio::spawn(read_loop(name, stream, sender));
        Self {
            name,
            receiver,
            worker: Some(worker),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// @ai:intent Remove and return every chunk queued since the previous call
    /// @ai:effects pure
    pub fn drain_available(&mut self) -> Vec<Vec<u8>> {
        let mut chunks = Vec::new();
        while let Ok(chunk) = self.receiver.try_recv() {
            chunks.push(chunk);
        }
        chunks
    }

    /// @ai:intent Whether the read loop has observed end-of-stream
    pub fn is_finished(&self) -> bool {
        self.worker.as_ref().map_or(true, |w| w.is_finished())
    }

    /// @ai:intent Wait up to `grace` for the read loop to reach end-of-stream
    /// @ai:post queued chunks stay available to `drain_available` either way
    /// @ai:effects io
    pub async fn wait_for_eof(&mut self, grace: Duration) -> bool {
        let Some(worker) = self.worker.as_mut() else {
            return true;
        };
        match tokio::time::timeout(grace, worker).await {
            Ok(_) => {
                self.worker = None;
                true
            }
            Err(_) => {
                // A grandchild may still hold the pipe open.
                tracing::debug!(
                    "{} did not reach end-of-stream within {:?}",
                    self.name,
                    grace
                );
                false
            }
        }
    }
}

impl Drop for NonBlockingReader {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.abort();
        }
    }
}

async fn read_loop<R>(name: &'static str, mut stream: R, sender: mpsc::UnboundedSender<Vec<u8>>)
where
    R: AsyncRead + Unpin,
{
    let mut buffer = vec![0u8; CHUNK_SIZE];
    loop {
        match stream.read(&mut buffer).await {
            Ok(0) => break,
            Ok(n) => {
                if sender.send(buffer[..n].to_vec()).is_err() {
                    break;
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                tracing::debug!("Read error on {}, treating as end-of-stream: {}", name, e);
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::{AsyncWriteExt, ReadBuf};

    struct FailingStream;

    impl AsyncRead for FailingStream {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<std::io::Result<()>> {
            Poll::Ready(Err(std::io::Error::other("broken pipe")))
        }
    }

    #[tokio::test]
    async fn test_drain_on_empty_stream_returns_nothing() {
        let (_writer, reader) = tokio::io::duplex(64);
        let mut reader = NonBlockingReader::attach("stdout", reader);
        assert!(reader.drain_available().is_empty());
        assert!(!reader.is_finished());
    }

    #[tokio::test]
    async fn test_concatenated_chunks_equal_written_bytes() {
        let (mut writer, reader) = tokio::io::duplex(16);
        let mut reader = NonBlockingReader::attach("stdout", reader);

        let payload: Vec<u8> = (0..50_000u32).map(|i| (i % 251) as u8).collect();
        let expected = payload.clone();
        let write = tokio::spawn(async move {
            writer.write_all(&payload).await.unwrap();
        });

        let mut collected = Vec::new();
        while !write.is_finished() {
            for chunk in reader.drain_available() {
                collected.extend(chunk);
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        write.await.unwrap();

        assert!(reader.wait_for_eof(Duration::from_secs(1)).await);
        for chunk in reader.drain_available() {
            collected.extend(chunk);
        }
        assert_eq!(collected, expected);
    }

    #[tokio::test]
    async fn test_second_drain_without_new_data_is_empty() {
        let (mut writer, reader) = tokio::io::duplex(64);
        let mut reader = NonBlockingReader::attach("stderr", reader);
        writer.write_all(b"hello").await.unwrap();
        drop(writer);

        assert!(reader.wait_for_eof(Duration::from_secs(1)).await);
        let first: Vec<u8> = reader.drain_available().concat();
        assert_eq!(first, b"hello");
        assert!(reader.drain_available().is_empty());
    }

    #[tokio::test]
    async fn test_read_error_is_treated_as_eof() {
        let mut reader = NonBlockingReader::attach("stdout", FailingStream);
        assert!(reader.wait_for_eof(Duration::from_secs(1)).await);
        assert!(reader.is_finished());
        assert!(reader.drain_available().is_empty());
    }

    #[tokio::test]
    async fn test_wait_for_eof_times_out_on_open_stream() {
        let (_writer, reader) = tokio::io::duplex(64);
        let mut reader = NonBlockingReader::attach("stdout", reader);
        assert!(!reader.wait_for_eof(Duration::from_millis(20)).await);
    }
}
