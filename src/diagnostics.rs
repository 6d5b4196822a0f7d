//! Logging setup, user-facing warnings and fatal error messages.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Verbosity comes from `RUST_LOG`, defaulting
/// to warnings only so emitted code on stdout stays clean.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// A composition problem that does not stop the run.
pub fn warn(message: impl AsRef<str>) {
    tracing::warn!("{}", message.as_ref());
}

/// Text for a fatal composition error. Logged at debug so `RUST_LOG=debug`
/// shows where the run stopped, then returned for `bail!`.
pub fn error_message(message: impl Into<String>) -> String {
    let message = message.into();
    tracing::debug!(%message, "composition rejected");
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn error_message_passes_text_through() {
        assert_eq!(error_message("no nodes"), "no nodes");
        assert_eq!(
            error_message(format!("root references unknown node: {}", "x")),
            "root references unknown node: x"
        );
    }
}
