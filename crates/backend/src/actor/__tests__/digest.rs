#[cfg(test)]
mod tests {
  use std::{io::Write, path::PathBuf, sync::Arc, time::Duration};

  use async_trait::async_trait;
  use pretty_assertions::assert_eq;
  use tokio_util::sync::CancellationToken;

  use crate::{
    actor::{
      __tests__::helpers::{RecordingNotifier, WatchTestContext, assert_quiet, next_message},
      digest::{CycleOutcome, DigestError, DigestTask},
    },
    domain::config::DigestConfig,
    transport::{DeliveryError, Notifier, format_digest_chunk},
  };

  /// Notifier that changes the watched file while a report is being sent,
  /// the way the external writer can between read and truncate.
  struct WritingNotifier {
    path: PathBuf,
    text: &'static str,
    replace: bool,
  }

  #[async_trait]
  impl Notifier for WritingNotifier {
    fn name(&self) -> &str {
      "writing"
    }

    async fn notify(&self, _text: &str) -> Result<(), DeliveryError> {
      if self.replace {
        std::fs::write(&self.path, self.text).unwrap();
      } else {
        let mut file = std::fs::OpenOptions::new().append(true).open(&self.path).unwrap();
        file.write_all(self.text.as_bytes()).unwrap();
      }
      Ok(())
    }
  }

  fn digest_for(ctx: &WatchTestContext, notifier: Arc<RecordingNotifier>, config: DigestConfig) -> DigestTask {
    DigestTask::new(ctx.file.clone(), notifier, config)
  }

  #[tokio::test]
  async fn test_flush_sends_unique_lines_and_truncates() {
    let ctx = WatchTestContext::new();
    let (notifier, _rx) = RecordingNotifier::new();
    let mut digest = digest_for(&ctx, notifier.clone(), DigestConfig::default());

    ctx.write("x\ny\nx\n").await;
    let outcome = digest.run_cycle().await.unwrap();

    assert_eq!(outcome, CycleOutcome::Flushed { lines: 2, chunks: 1 });
    assert_eq!(notifier.sent(), vec![format_digest_chunk("x\ny")]);
    assert_eq!(notifier.sent()[0], "<b>Daily report:</b>\n<pre>x\ny</pre>");
    assert_eq!(ctx.read().await, "");
    assert_eq!(digest.seen().iter().collect::<Vec<_>>(), vec!["x", "y"]);
  }

  #[tokio::test]
  async fn test_failed_send_keeps_file_and_retries() {
    let ctx = WatchTestContext::new();
    let (notifier, _rx) = RecordingNotifier::new();
    let mut digest = digest_for(&ctx, notifier.clone(), DigestConfig::default());

    ctx.write("p\nq\n").await;
    notifier.set_failing(true);
    let err = digest.run_cycle().await.unwrap_err();
    assert!(matches!(err, DigestError::Send { index: 1, total: 1, .. }));
    assert_eq!(ctx.read().await, "p\nq\n");
    assert!(digest.seen().is_empty());

    notifier.set_failing(false);
    let outcome = digest.run_cycle().await.unwrap();
    assert_eq!(outcome, CycleOutcome::Flushed { lines: 2, chunks: 1 });
    assert_eq!(notifier.sent(), vec![format_digest_chunk("p\nq")]);
    assert_eq!(notifier.attempts(), 2);
    assert_eq!(ctx.read().await, "");
  }

  #[tokio::test]
  async fn test_lines_appended_during_report_survive_truncation() {
    let ctx = WatchTestContext::new();
    let notifier = Arc::new(WritingNotifier {
      path: ctx.file.clone(),
      text: "late\n",
      replace: false,
    });
    let mut digest = DigestTask::new(ctx.file.clone(), notifier, DigestConfig::default());

    ctx.write("early\n").await;
    let outcome = digest.run_cycle().await.unwrap();
    assert_eq!(outcome, CycleOutcome::Flushed { lines: 1, chunks: 1 });
    assert_eq!(ctx.read().await, "late\n");
    assert!(!digest.seen().contains("late"));

    // The kept tail goes into the next report
    let outcome = digest.run_cycle().await.unwrap();
    assert_eq!(outcome, CycleOutcome::Flushed { lines: 1, chunks: 1 });
    assert!(digest.seen().contains("late"));
  }

  #[tokio::test]
  async fn test_file_rewritten_during_report_is_left_alone() {
    let ctx = WatchTestContext::new();
    let notifier = Arc::new(WritingNotifier {
      path: ctx.file.clone(),
      text: "fresh\n",
      replace: true,
    });
    let mut digest = DigestTask::new(ctx.file.clone(), notifier, DigestConfig::default());

    ctx.write("old\n").await;
    digest.run_cycle().await.unwrap();
    assert_eq!(ctx.read().await, "fresh\n");
  }

  #[tokio::test]
  async fn test_reported_lines_never_reappear() {
    let ctx = WatchTestContext::new();
    let (notifier, _rx) = RecordingNotifier::new();
    let mut digest = digest_for(&ctx, notifier.clone(), DigestConfig::default());

    ctx.write("x\n").await;
    digest.run_cycle().await.unwrap();

    ctx.write("x\nz\n").await;
    let outcome = digest.run_cycle().await.unwrap();
    assert_eq!(outcome, CycleOutcome::Flushed { lines: 1, chunks: 1 });
    assert_eq!(notifier.sent().last().unwrap(), &format_digest_chunk("z"));

    // Only already reported lines: file is left alone
    ctx.write("x\nz\n").await;
    assert_eq!(digest.run_cycle().await.unwrap(), CycleOutcome::NothingNew);
    assert_eq!(ctx.read().await, "x\nz\n");
    assert_eq!(notifier.sent().len(), 2);
  }

  #[tokio::test]
  async fn test_clearing_seen_set_reports_repeats() {
    let ctx = WatchTestContext::new();
    let (notifier, _rx) = RecordingNotifier::new();
    let config = DigestConfig {
      retain_seen: false,
      ..DigestConfig::default()
    };
    let mut digest = digest_for(&ctx, notifier.clone(), config);

    ctx.write("x\n").await;
    digest.run_cycle().await.unwrap();
    assert!(digest.seen().is_empty());

    ctx.write("x\n").await;
    assert_eq!(
      digest.run_cycle().await.unwrap(),
      CycleOutcome::Flushed { lines: 1, chunks: 1 }
    );
    assert_eq!(notifier.sent(), vec![format_digest_chunk("x"), format_digest_chunk("x")]);
  }

  #[tokio::test]
  async fn test_empty_missing_and_unready() {
    let ctx = WatchTestContext::new();
    let (notifier, _rx) = RecordingNotifier::new();
    let mut digest = digest_for(&ctx, notifier.clone(), DigestConfig::default());

    // Whitespace-only lines are not entries
    ctx.write("\n   \n").await;
    assert_eq!(digest.run_cycle().await.unwrap(), CycleOutcome::NothingNew);
    assert_eq!(ctx.read().await, "\n   \n");

    notifier.set_ready(false);
    ctx.write("waiting\n").await;
    assert_eq!(digest.run_cycle().await.unwrap(), CycleOutcome::NoRecipient);
    assert_eq!(ctx.read().await, "waiting\n");

    notifier.set_ready(true);
    tokio::fs::remove_file(&ctx.file).await.unwrap();
    assert_eq!(digest.run_cycle().await.unwrap(), CycleOutcome::MissingFile);
    assert_eq!(notifier.attempts(), 0);
  }

  #[tokio::test]
  async fn test_long_report_is_chunked() {
    let ctx = WatchTestContext::new();
    let (notifier, _rx) = RecordingNotifier::new();
    let mut digest = digest_for(&ctx, notifier.clone(), DigestConfig::default());

    let first = "a".repeat(2500);
    let second = "b".repeat(2500);
    ctx.write(&format!("{}\n{}\n", first, second)).await;

    // 2500 + 1 + 2500 chars
    let outcome = digest.run_cycle().await.unwrap();
    assert_eq!(outcome, CycleOutcome::Flushed { lines: 2, chunks: 2 });

    let sent = notifier.sent();
    let report = format!("{}\n{}", first, second);
    assert_eq!(sent[0], format_digest_chunk(&report[..4000]));
    assert_eq!(sent[1], format_digest_chunk(&report[4000..]));
  }

  #[tokio::test]
  async fn test_partial_chunk_failure_sends_whole_report_again() {
    let ctx = WatchTestContext::new();
    let (notifier, _rx) = RecordingNotifier::new();
    let config = DigestConfig {
      chunk_size: 3,
      ..DigestConfig::default()
    };
    let mut digest = digest_for(&ctx, notifier.clone(), config);

    ctx.write("ab\ncd\n").await;
    notifier.set_failing(true);
    let err = digest.run_cycle().await.unwrap_err();
    assert!(matches!(err, DigestError::Send { index: 1, total: 2, .. }));

    notifier.set_failing(false);
    digest.run_cycle().await.unwrap();
    assert_eq!(notifier.sent(), vec![format_digest_chunk("ab\n"), format_digest_chunk("cd")]);
  }

  #[tokio::test]
  async fn test_read_error_sends_diagnostic() {
    let ctx = WatchTestContext::new();
    let (notifier, mut rx) = RecordingNotifier::new();
    // A directory in place of the file cannot be read
    let path = ctx.dir.path().join("folder.txt");
    std::fs::create_dir(&path).unwrap();
    let mut digest = DigestTask::new(path, notifier.clone(), DigestConfig::default());

    assert_eq!(digest.tick().await, None);
    let message = next_message(&mut rx, 1).await;
    assert!(message.starts_with("<b>An error occurred:</b>\n<code>Failed to read"));
  }

  #[tokio::test]
  async fn test_diagnostic_can_be_disabled() {
    let ctx = WatchTestContext::new();
    let (notifier, mut rx) = RecordingNotifier::new();
    let path = ctx.dir.path().join("folder.txt");
    std::fs::create_dir(&path).unwrap();
    let config = DigestConfig {
      report_errors: false,
      ..DigestConfig::default()
    };
    let mut digest = DigestTask::new(path, notifier.clone(), config);

    assert_eq!(digest.tick().await, None);
    assert_quiet(&mut rx, 100).await;
    assert_eq!(notifier.attempts(), 0);
  }

  #[tokio::test]
  async fn test_digest_loop_runs_on_interval() {
    let ctx = WatchTestContext::new();
    let (notifier, mut rx) = RecordingNotifier::new();
    let config = DigestConfig {
      interval_secs: 1,
      ..DigestConfig::default()
    };
    let digest = digest_for(&ctx, notifier.clone(), config);
    let cancel = CancellationToken::new();
    let task = tokio::spawn(digest.run(cancel.child_token()));

    ctx.write("tick\n").await;
    assert_eq!(next_message(&mut rx, 3).await, format_digest_chunk("tick"));

    // Truncation follows the send
    let truncated = tokio::time::timeout(Duration::from_secs(2), async {
      while !ctx.read().await.is_empty() {
        tokio::time::sleep(Duration::from_millis(20)).await;
      }
    })
    .await;
    assert!(truncated.is_ok(), "watched file was not truncated");

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(2), task).await.unwrap().unwrap();
  }
}
