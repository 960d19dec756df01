//! Nightly run log file.

use std::path::Path;

use tokio::io::AsyncWriteExt;

use ledger_engine::NightlyReport;

/// Append the rendered run log to `path`, creating the file if needed.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be opened or written.
pub async fn append_run_log(path: impl AsRef<Path>, report: &NightlyReport) -> std::io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path.as_ref())
        .await?;
    file.write_all(report.render().as_bytes()).await?;
    file.flush().await
}
