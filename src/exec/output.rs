// src/exec/output.rs

//! Build tool output plumbing.
//!
//! stdout and stderr are merged line by line into a single stream that is:
//! - logged at debug level,
//! - optionally appended to the app's log file,
//! - kept as a short tail for failure diagnostics.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tokio::fs::OpenOptions;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::Child;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Number of trailing output lines kept for diagnostics.
pub const TAIL_LINES: usize = 50;

/// Handle to the background tasks draining a child's output.
#[derive(Debug)]
pub struct OutputCapture {
    tail: Arc<Mutex<VecDeque<String>>>,
    writer: JoinHandle<()>,
}

impl OutputCapture {
    /// Take the child's stdout/stderr pipes and start draining them.
    pub fn attach(child: &mut Child, app: &str, log_path: Option<PathBuf>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel::<String>();

        if let Some(stdout) = child.stdout.take() {
            spawn_reader(stdout, tx.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_reader(stderr, tx.clone());
        }
        drop(tx);

        let tail = Arc::new(Mutex::new(VecDeque::with_capacity(TAIL_LINES)));
        let writer = tokio::spawn(write_lines(app.to_string(), rx, log_path, Arc::clone(&tail)));

        Self { tail, writer }
    }

    /// Wait for both pipes to close, then return the captured tail.
    pub async fn finish(self) -> Vec<String> {
        let Self { tail, writer } = self;
        if let Err(e) = writer.await {
            warn!(error = %e, "output writer task failed");
        }
        let tail = tail.lock().unwrap_or_else(|e| e.into_inner());
        tail.iter().cloned().collect()
    }

    pub fn tail(&self) -> Vec<String> {
        let tail = self.tail.lock().unwrap_or_else(|e| e.into_inner());
        tail.iter().cloned().collect()
    }
}

/// Drain `pipe` until EOF, forwarding each line.
///
/// The pipe must stay open for the child's whole life: a reader that gave up
/// early would kill the tool with SIGPIPE on its next write. Lines are
/// decoded lossily and a closed receiver only stops the forwarding.
fn spawn_reader<R>(pipe: R, tx: mpsc::UnboundedSender<String>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(pipe);
        let mut buf = Vec::new();
        let mut forward = true;
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    if forward && tx.send(decode_line(&buf)).is_err() {
                        forward = false;
                    }
                }
                Err(e) => {
                    debug!(error = %e, "reading build tool output failed");
                    break;
                }
            }
        }
    });
}

fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

async fn write_lines(
    app: String,
    mut rx: mpsc::UnboundedReceiver<String>,
    log_path: Option<PathBuf>,
    tail: Arc<Mutex<VecDeque<String>>>,
) {
    let mut log_file = match log_path {
        Some(path) => match OpenOptions::new().create(true).append(true).open(&path).await {
            Ok(file) => Some(file),
            Err(e) => {
                warn!(app = %app, path = ?path, error = %e, "cannot open build log; output will not be teed");
                None
            }
        },
        None => None,
    };

    while let Some(line) = rx.recv().await {
        debug!(app = %app, "build: {}", line);

        if let Some(file) = log_file.as_mut() {
            let write = async {
                file.write_all(line.as_bytes()).await?;
                file.write_all(b"\n").await
            };
            if let Err(e) = write.await {
                warn!(app = %app, error = %e, "writing build log failed; disabling tee");
                log_file = None;
            }
        }

        let mut buf = tail.lock().unwrap_or_else(|e| e.into_inner());
        if buf.len() == TAIL_LINES {
            buf.pop_front();
        }
        buf.push_back(line);
    }

    if let Some(mut file) = log_file {
        let _ = file.flush().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_are_decoded_lossily() {
        assert_eq!(decode_line(b"compiling caf\xe9.js\n"), "compiling caf\u{FFFD}.js");
        assert_eq!(decode_line(b"done\r\n"), "done");
        assert_eq!(decode_line(b"no newline"), "no newline");
    }
}
