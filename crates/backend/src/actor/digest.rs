use std::{io, path::PathBuf, sync::Arc};

use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::{
  domain::{
    config::DigestConfig,
    line::{LineSet, chunk_text},
  },
  transport::{DeliveryError, Notifier, format_digest_chunk, format_failure},
};

#[derive(Debug, thiserror::Error)]
pub enum DigestError {
  #[error("Failed to read {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
  #[error("Failed to send report chunk {index} of {total}: {source}")]
  Send {
    index: usize,
    total: usize,
    #[source]
    source: DeliveryError,
  },
  #[error("Failed to truncate {path}: {source}")]
  Truncate {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// What one digest cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
  /// No recipient registered yet; nothing was read or changed
  NoRecipient,
  /// The watched file does not exist
  MissingFile,
  /// The file held nothing that was not reported before
  NothingNew,
  /// A report of `lines` lines was sent in `chunks` messages and the file truncated
  Flushed { lines: usize, chunks: usize },
}

/// Periodic batched report of the watched file.
///
/// Each cycle reads the file, picks the lines not yet reported, sends them as
/// one report split into chunks, and then truncates the file. Seen-state is
/// staged during the cycle and only committed once every chunk was delivered,
/// so a failed send leaves both the file and the seen-set as they were and the
/// next cycle tries again.
pub struct DigestTask {
  path: PathBuf,
  notifier: Arc<dyn Notifier>,
  config: DigestConfig,
  seen: LineSet,
}

impl DigestTask {
  pub fn new(path: PathBuf, notifier: Arc<dyn Notifier>, config: DigestConfig) -> Self {
    Self {
      path,
      notifier,
      config,
      seen: LineSet::new(),
    }
  }

  /// Lines already included in a delivered report
  #[cfg(test)]
  pub fn seen(&self) -> &LineSet {
    &self.seen
  }

  /// Run the digest loop until cancelled.
  pub async fn run(mut self, cancel: CancellationToken) {
    let period = self.config.interval();
    let mut timer = interval(period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // Skip the immediate tick
    timer.tick().await;

    info!(path = %self.path.display(), interval_secs = period.as_secs(), "Digest task started");

    loop {
      tokio::select! {
          biased;

          _ = cancel.cancelled() => {
              info!("Digest task shutting down (cancelled)");
              break;
          }

          _ = timer.tick() => {
              self.tick().await;
          }
      }
    }

    info!(retained = self.seen.len(), "Digest task stopped");
  }

  /// One cycle with failures logged and optionally reported.
  pub async fn tick(&mut self) -> Option<CycleOutcome> {
    match self.run_cycle().await {
      Ok(outcome) => {
        match &outcome {
          CycleOutcome::Flushed { lines, chunks } => info!(lines, chunks, "Report sent, watched file truncated"),
          CycleOutcome::MissingFile => warn!(path = %self.path.display(), "Watched file not found, skipping report"),
          CycleOutcome::NoRecipient => debug!("No recipient registered, skipping report"),
          CycleOutcome::NothingNew => debug!("Nothing new to report"),
        }
        Some(outcome)
      }
      Err(e) => {
        warn!(error = %e, "Report cycle failed");
        if self.config.report_errors
          && self.notifier.is_ready()
          && let Err(send_err) = self.notifier.notify(&format_failure(&e)).await
        {
          warn!(error = %send_err, "Failed to send report failure notice");
        }
        None
      }
    }
  }

  /// Read, diff, send, commit, truncate.
  pub async fn run_cycle(&mut self) -> Result<CycleOutcome, DigestError> {
    if !self.notifier.is_ready() {
      return Ok(CycleOutcome::NoRecipient);
    }

    let bytes = match tokio::fs::read(&self.path).await {
      Ok(bytes) => bytes,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(CycleOutcome::MissingFile),
      Err(source) => {
        return Err(DigestError::Read {
          path: self.path.clone(),
          source,
        });
      }
    };
    let content = String::from_utf8_lossy(&bytes);

    let mut staged = self.seen.clone();
    let fresh = staged.diff_new(content.lines());
    if fresh.is_empty() {
      return Ok(CycleOutcome::NothingNew);
    }

    let report = fresh.join("\n");
    let chunks = chunk_text(&report, self.config.chunk_size);
    let total = chunks.len();

    for (i, chunk) in chunks.iter().enumerate() {
      trace!(index = i + 1, total, chars = chunk.chars().count(), "Sending report chunk");
      self
        .notifier
        .notify(&format_digest_chunk(chunk))
        .await
        .map_err(|source| DigestError::Send {
          index: i + 1,
          total,
          source,
        })?;
    }

    if self.config.retain_seen {
      self.seen = staged;
    } else {
      self.seen.clear();
    }

    self.truncate_reported(&bytes).await?;

    Ok(CycleOutcome::Flushed {
      lines: fresh.len(),
      chunks: total,
    })
  }

  /// Empty the file of the `reported` content while keeping anything the
  /// writer appended since it was read.
  ///
  /// If the file no longer starts with `reported` it was rewritten by someone
  /// else; it is left as is and the seen-set filters the old lines next cycle.
  async fn truncate_reported(&self, reported: &[u8]) -> Result<(), DigestError> {
    let truncate_err = |source: io::Error| DigestError::Truncate {
      path: self.path.clone(),
      source,
    };

    let current = match tokio::fs::read(&self.path).await {
      Ok(current) => current,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
      Err(source) => return Err(truncate_err(source)),
    };

    if !current.starts_with(reported) {
      warn!(path = %self.path.display(), "Watched file was rewritten during the report, leaving it untouched");
      return Ok(());
    }

    let tail = &current[reported.len()..];
    if !tail.is_empty() {
      debug!(kept_bytes = tail.len(), "Keeping lines appended during the report");
    }
    tokio::fs::write(&self.path, tail).await.map_err(truncate_err)
  }
}
