//! `/status`: unique entries of every `.txt` file in the watched directory.

use std::{io, path::Path};

use tracing::warn;

use crate::{
  domain::line::{chunk_text, unique_lines},
  transport::escape_html,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStatus {
  pub name: String,
  /// Unique trimmed non-empty lines in first-seen order
  pub lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusReport {
  MissingDirectory,
  NoTextFiles,
  Files(Vec<FileStatus>),
}

/// Scan `dir` for `.txt` files, sorted by name. Unreadable files are skipped.
pub async fn collect_status(dir: &Path) -> io::Result<StatusReport> {
  let mut entries = match tokio::fs::read_dir(dir).await {
    Ok(entries) => entries,
    Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(StatusReport::MissingDirectory),
    Err(e) => return Err(e),
  };

  let mut files = Vec::new();
  while let Some(entry) = entries.next_entry().await? {
    let path = entry.path();
    if path.extension().and_then(|e| e.to_str()) != Some("txt") || !entry.file_type().await?.is_file() {
      continue;
    }

    let name = entry.file_name().to_string_lossy().into_owned();
    match tokio::fs::read(&path).await {
      Ok(bytes) => files.push(FileStatus {
        lines: unique_lines(&String::from_utf8_lossy(&bytes)),
        name,
      }),
      Err(e) => warn!(path = %path.display(), error = %e, "Failed to read file for status"),
    }
  }

  if files.is_empty() {
    return Ok(StatusReport::NoTextFiles);
  }

  files.sort_by(|a, b| a.name.cmp(&b.name));
  Ok(StatusReport::Files(files))
}

/// Chat messages for a status report, one or more per file.
pub fn render_html(report: &StatusReport, chunk_size: usize) -> Vec<String> {
  match report {
    StatusReport::MissingDirectory => vec!["❗ The watched folder does not exist.".to_string()],
    StatusReport::NoTextFiles => vec!["📂 No .txt files found.".to_string()],
    StatusReport::Files(files) => {
      let mut messages = Vec::new();
      for file in files {
        let name = escape_html(&file.name);
        if file.lines.is_empty() {
          messages.push(format!("<b>{}</b> is empty.", name));
          continue;
        }
        let content = file.lines.join("\n");
        for chunk in chunk_text(&content, chunk_size) {
          messages.push(format!("<b>{}:</b>\n<pre>{}</pre>", name, escape_html(chunk)));
        }
      }
      messages
    }
  }
}

/// Terminal rendering for `linewatch status`.
pub fn render_plain(report: &StatusReport) -> String {
  match report {
    StatusReport::MissingDirectory => "The watched folder does not exist.\n".to_string(),
    StatusReport::NoTextFiles => "No .txt files found.\n".to_string(),
    StatusReport::Files(files) => {
      let mut out = String::new();
      for file in files {
        if file.lines.is_empty() {
          out.push_str(&format!("{} is empty.\n", file.name));
          continue;
        }
        out.push_str(&format!("{} ({} unique):\n", file.name, file.lines.len()));
        for line in &file.lines {
          out.push_str("  ");
          out.push_str(line);
          out.push('\n');
        }
      }
      out
    }
  }
}
