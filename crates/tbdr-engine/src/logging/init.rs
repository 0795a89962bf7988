use std::sync::Once;

/// Targets that log per-call detail at info and drown out frame reports.
const QUIET_TARGETS: [&str; 3] = ["wgpu_core", "wgpu_hal", "naga"];

/// Logger configuration.
///
/// `env_filter` uses `env_logger` filter syntax, e.g. `"debug"` or
/// `"tbdr_engine=trace,wgpu_core=warn"`. When unset, `RUST_LOG` is consulted
/// before falling back to [`default_filter`].
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

impl LoggingConfig {
    pub fn with_filter(filter: impl Into<String>) -> Self {
        Self {
            env_filter: Some(filter.into()),
            ..Self::default()
        }
    }

    /// Filter string actually applied, given the value of `RUST_LOG`.
    pub fn resolve_filter(&self, rust_log: Option<&str>) -> String {
        self.env_filter
            .as_deref()
            .or(rust_log)
            .filter(|f| !f.trim().is_empty())
            .map(str::to_owned)
            .unwrap_or_else(default_filter)
    }
}

/// `info` for the bench, `warn` for the GPU stack.
pub fn default_filter() -> String {
    let mut filter = String::from("info");
    for target in QUIET_TARGETS {
        filter.push(',');
        filter.push_str(target);
        filter.push_str("=warn");
    }
    filter
}

static INIT: Once = Once::new();

/// Installs the global logger. Only the first call has an effect.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let rust_log = std::env::var("RUST_LOG").ok();
        let filter = config.resolve_filter(rust_log.as_deref());

        let mut builder = env_logger::Builder::new();
        builder.parse_filters(&filter);
        builder.write_style(config.write_style);

        // A test harness may have installed a logger already.
        if builder.try_init().is_ok() {
            log::debug!("logging initialized with filter {filter:?}");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_filter_wins_over_rust_log() {
        let config = LoggingConfig::with_filter("tbdr_engine=trace");
        assert_eq!(config.resolve_filter(Some("error")), "tbdr_engine=trace");
    }

    #[test]
    fn rust_log_used_when_no_explicit_filter() {
        let config = LoggingConfig::default();
        assert_eq!(config.resolve_filter(Some("debug")), "debug");
    }

    #[test]
    fn blank_filters_fall_back_to_default() {
        let config = LoggingConfig::with_filter("  ");
        assert_eq!(config.resolve_filter(None), default_filter());
        assert_eq!(LoggingConfig::default().resolve_filter(Some("")), default_filter());
    }

    #[test]
    fn default_filter_quiets_gpu_stack() {
        let filter = default_filter();
        assert!(filter.starts_with("info,"));
        for target in QUIET_TARGETS {
            assert!(filter.contains(&format!("{target}=warn")));
        }
    }
}
