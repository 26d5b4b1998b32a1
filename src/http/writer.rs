use bytes::Bytes;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

/// Writes a preamble and an optional in-memory body, resuming after short
/// writes until everything is on the wire.
pub struct ResponseWriter {
    parts: [Bytes; 2],
    written: usize,
}

impl ResponseWriter {
    pub fn new(head: Bytes) -> Self {
        Self::with_body(head, Bytes::new())
    }

    pub fn with_body(head: Bytes, body: Bytes) -> Self {
        Self {
            parts: [head, body],
            written: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.parts.iter().map(Bytes::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub async fn write_to_stream(&mut self, stream: &mut TcpStream) -> anyhow::Result<()> {
        let total = self.len();

        while self.written < total {
            let (part, offset) = self.cursor();
            let n = stream.write(&self.parts[part][offset..]).await?;

            if n == 0 {
                return Err(anyhow::anyhow!("connection closed while writing"));
            }

            self.written += n;
        }

        stream.flush().await?;
        Ok(())
    }

    fn cursor(&self) -> (usize, usize) {
        let head = self.parts[0].len();
        if self.written < head {
            (0, self.written)
        } else {
            (1, self.written - head)
        }
    }
}
