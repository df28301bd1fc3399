//! Disposition sinks

use async_trait::async_trait;

use super::ReportError;
use crate::logic::session::Disposition;

/// Receives the disposition exactly once, when the session ends
#[async_trait]
pub trait DispositionSink: Send + Sync {
    fn name(&self) -> &'static str;

    async fn deliver(&self, disposition: &Disposition) -> Result<(), ReportError>;
}

/// Writes a summary line per session through the log facade
#[derive(Debug, Default)]
pub struct LogSink;

#[async_trait]
impl DispositionSink for LogSink {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn deliver(&self, disposition: &Disposition) -> Result<(), ReportError> {
        log::info!(
            "[DISPOSITION] interview={} state={} weight={:.1} completed={} degraded={}",
            disposition.interview_id,
            disposition.state,
            disposition.total_weight,
            disposition.completed,
            disposition.monitoring_degraded
        );
        for line in disposition.flag_report().lines() {
            log::info!("  {}", line);
        }
        Ok(())
    }
}
