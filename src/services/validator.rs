//! Launching the external validator and relaying its output.
//!
//! Every run is started the same way, `<java> -jar <validator-jar> <payload> <args...>`,
//! and reports through one bounded channel:
//!
//! - one reader task per pipe pushes what it reads as it arrives; sanitized
//!   [`ValidatorEvent`] lines when streaming, raw chunks for a buffered run
//! - a supervisor task waits for both readers, then for the process, and
//!   sends a final failure item when the run did not succeed
//!
//! The channel closes once the run is over and the payload file is gone.
//! Cancelling the run's token stops the readers and kills the process.

use std::io;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument, Span};
use uuid::Uuid;

use crate::{
    config::Config,
    error::AppError,
    libraries::sanitize::{strip_ansi, strip_ansi_bytes},
    models::{OutputLine, OutputStream, ValidatorEvent},
    services::artifact::PayloadArtifact,
};

/// Lines (or chunks) held between the pipe readers and the consumer.
const DELIVERY_CAPACITY: usize = 1;

/// Read size for buffered runs.
const CHUNK_SIZE: usize = 8 * 1024;

#[derive(Debug, Clone)]
pub struct ValidatorCli {
    java_path: String,
    validator_jar: String,
    timeout: Option<Duration>,
}

/// A spawned validator with both pipes taken.
struct Launched {
    child: Child,
    stdout: ChildStdout,
    stderr: ChildStderr,
    span: Span,
}

/// Channel item of a buffered run.
enum Captured {
    Output(Vec<u8>),
    Failed(AppError),
}

impl From<AppError> for Captured {
    fn from(err: AppError) -> Self {
        Captured::Failed(err)
    }
}

enum Outcome {
    Exited(io::Result<ExitStatus>),
    Cancelled,
    TimedOut,
}

impl ValidatorCli {
    pub fn new(config: &Config) -> Self {
        Self {
            java_path: config.java_path.clone(),
            validator_jar: config.validator_jar.clone(),
            timeout: config.validator_timeout(),
        }
    }

    /// Build the validator invocation. The argument order is part of the
    /// validator's command-line contract.
    pub fn command(&self, artifact: &Path, args: &[String]) -> Command {
        let mut command = Command::new(&self.java_path);
        command
            .arg("-jar")
            .arg(&self.validator_jar)
            .arg(artifact)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }

    /// Start the validator and return the receiving end of its output channel.
    ///
    /// Spawn failures are returned here, before any output is produced. The
    /// artifact is owned by the run and removed once the process has exited.
    pub fn spawn_streaming(
        &self,
        artifact: PayloadArtifact,
        args: &[String],
        cancel: CancellationToken,
    ) -> Result<mpsc::Receiver<ValidatorEvent>, AppError> {
        let run = self.launch(artifact.path(), args)?;
        let (events, receiver) = mpsc::channel(DELIVERY_CAPACITY);

        let readers = [
            tokio::spawn(
                relay_lines(run.stdout, OutputStream::Stdout, events.clone(), cancel.clone())
                    .instrument(run.span.clone()),
            ),
            tokio::spawn(
                relay_lines(run.stderr, OutputStream::Stderr, events.clone(), cancel.clone())
                    .instrument(run.span.clone()),
            ),
        ];

        tokio::spawn(
            supervise(run.child, artifact, readers, events, cancel, self.timeout)
                .instrument(run.span),
        );

        Ok(receiver)
    }

    /// Run the validator to completion and return its combined output with
    /// color codes removed.
    ///
    /// Bytes from both pipes are kept exactly as written, in arrival order.
    /// A failed run yields only the error; its partial output is dropped.
    pub async fn run_buffered(
        &self,
        artifact: PayloadArtifact,
        args: &[String],
        cancel: CancellationToken,
    ) -> Result<Vec<u8>, AppError> {
        let run = self.launch(artifact.path(), args)?;
        let (chunks, mut receiver) = mpsc::channel(DELIVERY_CAPACITY);

        let readers = [
            tokio::spawn(
                relay_chunks(run.stdout, OutputStream::Stdout, chunks.clone(), cancel.clone())
                    .instrument(run.span.clone()),
            ),
            tokio::spawn(
                relay_chunks(run.stderr, OutputStream::Stderr, chunks.clone(), cancel.clone())
                    .instrument(run.span.clone()),
            ),
        ];

        tokio::spawn(
            supervise(run.child, artifact, readers, chunks, cancel, self.timeout)
                .instrument(run.span),
        );

        let mut output = Vec::new();
        let mut failure = None;

        while let Some(captured) = receiver.recv().await {
            match captured {
                Captured::Output(bytes) => output.extend_from_slice(&bytes),
                Captured::Failed(err) => failure = Some(err),
            }
        }

        match failure {
            Some(err) => {
                debug!("Discarding {} bytes of output from failed run", output.len());
                Err(err)
            }
            None => Ok(strip_ansi_bytes(&output).into_owned()),
        }
    }

    fn launch(&self, artifact: &Path, args: &[String]) -> Result<Launched, AppError> {
        let run_id = Uuid::new_v4();
        let mut command = self.command(artifact, args);

        info!(%run_id, "Starting validator: {}", describe(&command));

        let mut child = command.spawn().map_err(|e| {
            error!(%run_id, "Failed to start validator: {}", e);
            AppError::Launch(e)
        })?;

        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            return Err(AppError::Launch(io::Error::other(
                "validator output pipes were not captured",
            )));
        };

        Ok(Launched {
            child,
            stdout,
            stderr,
            span: info_span!("validator_run", %run_id),
        })
    }
}

/// Forward one pipe to the delivery channel, a line at a time.
async fn relay_lines<R>(
    pipe: R,
    stream: OutputStream,
    events: mpsc::Sender<ValidatorEvent>,
    cancel: CancellationToken,
) where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(pipe);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let read = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            read = reader.read_until(b'\n', &mut buf) => read,
        };

        match read {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                warn!("Failed to read validator {}: {}", stream, e);
                break;
            }
        }

        let text = String::from_utf8_lossy(trim_line_ending(&buf));
        let line = OutputLine::new(stream, strip_ansi(&text));

        // Once cancellation is observed the line is dropped, never delivered late.
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            sent = events.send(ValidatorEvent::Line(line)) => {
                if sent.is_err() {
                    break;
                }
            }
        }
    }

    debug!("Validator {} closed", stream);
}

/// Forward one pipe to the delivery channel as raw chunks, unframed.
async fn relay_chunks<R>(
    mut pipe: R,
    stream: OutputStream,
    chunks: mpsc::Sender<Captured>,
    cancel: CancellationToken,
) where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0; CHUNK_SIZE];

    loop {
        let read = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            read = pipe.read(&mut buf) => read,
        };

        let n = match read {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                warn!("Failed to read validator {}: {}", stream, e);
                break;
            }
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            sent = chunks.send(Captured::Output(buf[..n].to_vec())) => {
                if sent.is_err() {
                    break;
                }
            }
        }
    }

    debug!("Validator {} closed", stream);
}

async fn supervise<E>(
    mut child: Child,
    artifact: PayloadArtifact,
    readers: [JoinHandle<()>; 2],
    events: mpsc::Sender<E>,
    cancel: CancellationToken,
    timeout: Option<Duration>,
) where
    E: From<AppError>,
{
    let outcome = {
        let finished = async {
            // Both pipes are drained before the exit status is collected.
            for reader in readers {
                if let Err(e) = reader.await {
                    warn!("Output reader stopped abnormally: {}", e);
                }
            }
            child.wait().await
        };

        tokio::select! {
            status = finished => Outcome::Exited(status),
            _ = cancel.cancelled() => Outcome::Cancelled,
            _ = deadline(timeout) => Outcome::TimedOut,
        }
    };

    let failure = match outcome {
        Outcome::Exited(Ok(status)) if status.success() => {
            info!("Validator completed successfully");
            None
        }
        Outcome::Exited(Ok(status)) => {
            warn!("Validator failed: {}", status);
            Some(AppError::Exit(status.to_string()))
        }
        Outcome::Exited(Err(e)) => {
            error!("Failed to wait for validator: {}", e);
            Some(AppError::Exit(e.to_string()))
        }
        Outcome::Cancelled => {
            info!("Validation cancelled, stopping validator");
            kill(&mut child).await;
            None
        }
        Outcome::TimedOut => {
            let secs = timeout.map(|limit| limit.as_secs()).unwrap_or_default();
            warn!("Validator still running after {}s, stopping it", secs);
            cancel.cancel();
            kill(&mut child).await;
            Some(AppError::TimedOut(secs))
        }
    };

    // The payload file is gone before the consumer can see the run end.
    drop(artifact);

    if let Some(err) = failure {
        // Nobody is listening once the client has left.
        let _ = events.send(E::from(err)).await;
    }
}

async fn kill(child: &mut Child) {
    if let Err(e) = child.kill().await {
        warn!("Failed to kill validator: {}", e);
    }
}

async fn deadline(timeout: Option<Duration>) {
    match timeout {
        Some(limit) => tokio::time::sleep(limit).await,
        None => std::future::pending().await,
    }
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn describe(command: &Command) -> String {
    let command = command.as_std();
    std::iter::once(command.get_program())
        .chain(command.get_args())
        .map(|part| part.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}
