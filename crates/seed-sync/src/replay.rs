//! Replay a JSON-lines stream of change events through a [`Reconciler`].

use seed_conf::GatewayConf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use crate::{ChangeEvent, Outcome, Reconciler, Result};

/// Counters for one replay run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
  /// Events that reached the reconciler.
  pub applied: usize,
  /// Malformed lines, malformed payloads, and keys outside the prefix.
  pub skipped: usize,
}

/// Read events from `input`, apply each to `reconciler`, and write one
/// [`Outcome`] per applied event to `output` as a JSON line.
///
/// Bad input lines are logged and skipped; only I/O failures abort the run.
pub async fn replay<R, W>(
  input: R,
  output: &mut W,
  prefix: &str,
  reconciler: &mut Reconciler<GatewayConf>,
) -> Result<ReplayStats>
where
  R: AsyncBufRead + Unpin,
  W: AsyncWrite + Unpin,
{
  let mut stats = ReplayStats::default();
  let mut lines = input.lines();
  let mut line_no = 0usize;

  while let Some(line) = lines.next_line().await? {
    line_no += 1;
    let line = line.trim();
    if line.is_empty() {
      continue;
    }

    let event: ChangeEvent = match serde_json::from_str(line) {
      Ok(event) => event,
      Err(e) => {
        warn!(line = line_no, error = %e, "skipping malformed event");
        stats.skipped += 1;
        continue;
      }
    };

    let msg = match event.into_message(prefix) {
      Ok(Some(msg)) => msg,
      Ok(None) => {
        debug!(line = line_no, "key is not a gateway entity");
        stats.skipped += 1;
        continue;
      }
      Err(e) => {
        warn!(line = line_no, error = %e, "skipping change");
        stats.skipped += 1;
        continue;
      }
    };

    let outcome = Outcome {
      key:      msg.key.clone(),
      version:  msg.version,
      decision: reconciler.apply(msg),
    };
    let mut encoded = serde_json::to_vec(&outcome)?;
    encoded.push(b'\n');
    output.write_all(&encoded).await?;
    stats.applied += 1;
  }

  output.flush().await?;
  Ok(stats)
}
