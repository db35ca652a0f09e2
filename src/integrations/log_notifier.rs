use crate::integrations::remote_integration::{CompletionNotice, Notifier, PendingInputNotice};

/// A `Notifier` for headless hosts: every notification becomes a log line.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify_failure(&self, message: &str) {
        warn!("--Notify--: {}", message);
    }

    fn notify_recovery(&self, message: &str) {
        info!("--Notify--: {}", message);
    }

    fn notify_watch_error(&self, message: &str) {
        warn!("--Notify--: {}", message);
    }

    fn notify_completion(&self, notice: &CompletionNotice) {
        info!(
            "--Notify--: {} on {} completed with {}.",
            notice.job_label,
            notice.environment_url,
            notice
                .result
                .as_ref()
                .or_else(|| notice.color.as_ref())
                .map(|s| s.as_str())
                .unwrap_or("an unknown result")
        );
    }

    fn notify_pending_input(&self, notice: &PendingInputNotice) {
        info!(
            "--Notify--: {} on {} is waiting for {} input(s) at {}{}",
            notice.job_label,
            notice.environment_url,
            notice.input_count,
            notice.build_url,
            notice
                .input_message
                .as_ref()
                .map(|m| format!(": {}", m))
                .unwrap_or_default()
        );
    }
}
