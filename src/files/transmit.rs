use std::fs::File;
use std::future::Future;
use std::io;
use std::time::Duration;

use tokio::net::TcpStream;

/// Largest slice handed to a single `sendfile(2)` call.
#[cfg(target_os = "linux")]
const SENDFILE_CHUNK: u64 = 1024 * 1024;

/// Sends exactly `length` bytes of `file` to `stream` with `sendfile(2)`.
///
/// Partial transfers are expected on non-blocking sockets and are simply
/// continued from the new offset. `idle` bounds each wait for the socket to
/// accept more data, not the transfer as a whole, so a slow reader that keeps
/// draining is never cut off. Returns the number of bytes sent, or an error
/// if the socket fails, stalls past `idle` or the file ends early.
#[cfg(target_os = "linux")]
pub async fn send_file(
    stream: &mut TcpStream,
    file: &File,
    length: u64,
    idle: Option<Duration>,
) -> io::Result<u64> {
    use std::os::fd::AsRawFd;
    use tokio::io::Interest;

    let socket_fd = stream.as_raw_fd();
    let file_fd = file.as_raw_fd();
    let mut offset: libc::off_t = 0;
    let mut sent: u64 = 0;

    while sent < length {
        let count = (length - sent).min(SENDFILE_CHUNK) as usize;
        stall_limit(idle, stream.writable()).await?;

        let result = stream.try_io(Interest::WRITABLE, || {
            // SAFETY: both descriptors are open for the duration of the call
            // and `offset` is a valid, exclusively borrowed off_t.
            let n = unsafe { libc::sendfile(socket_fd, file_fd, &mut offset, count) };
            if n < 0 {
                Err(io::Error::last_os_error())
            } else {
                Ok(n as u64)
            }
        });

        match result {
            Ok(0) => return Err(short_file(sent, length)),
            Ok(n) => {
                sent += n;
                if n < count as u64 {
                    tracing::trace!(sent, length, "partial sendfile, continuing");
                }
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => continue,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    Ok(sent)
}

/// Buffered fallback where `sendfile(2)` with Linux semantics is unavailable.
#[cfg(not(target_os = "linux"))]
pub async fn send_file(
    stream: &mut TcpStream,
    file: &File,
    length: u64,
    idle: Option<Duration>,
) -> io::Result<u64> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let mut file = tokio::fs::File::from_std(file.try_clone()?).take(length);
    let mut buf = vec![0u8; 64 * 1024];
    let mut sent: u64 = 0;

    while sent < length {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            return Err(short_file(sent, length));
        }
        stall_limit(idle, stream.write_all(&buf[..n])).await?;
        sent += n as u64;
    }

    Ok(sent)
}

/// Fails with `TimedOut` if a single socket wait outlasts `idle`.
async fn stall_limit<T, F>(idle: Option<Duration>, fut: F) -> io::Result<T>
where
    F: Future<Output = io::Result<T>>,
{
    match idle {
        Some(idle) => tokio::time::timeout(idle, fut)
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "peer stopped reading"))?,
        None => fut.await,
    }
}

fn short_file(sent: u64, length: u64) -> io::Error {
    io::Error::new(
        io::ErrorKind::UnexpectedEof,
        format!("file ended after {} of {} bytes", sent, length),
    )
}
