//! # Logging & Tracing
//!
//! Configures `tracing-subscriber` for the bridge crates:
//! - Pretty, JSON and compact output
//! - an `EnvFilter` defaulting to the workspace crates at the configured level
//!   with HTTP internals held at `warn`
//! - optional forwarding of every surviving event to a host [`LoggerSink`]
//! - redaction of credential-like fields (tokens, device codes,
//!   authorization headers) before they reach the sink
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_traits::time::LogLevel;
//! use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
//! use std::sync::Arc;
//!
//! let config = LoggingConfig::default()
//!     .with_format(LogFormat::Compact)
//!     .with_level(LogLevel::Debug)
//!     .with_logger_sink(Arc::new(OutputChannelSink::new(host)));
//! init_logging(config)?;
//!
//! tracing::info!(target: "core_bridge", kind = "list_directory", "dispatched");
//! ```

use crate::error::{Error, Result};

use bridge_traits::time::{LogEntry, LogLevel, LoggerSink};
use core_async::runtime;

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::sync::Arc;

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::{
    filter::EnvFilter,
    fmt::format::FmtSpan,
    layer::{Context, SubscriberExt},
    registry::LookupSpan,
    util::SubscriberInitExt,
    Layer, Registry,
};

/// Crates whose events pass the default filter at the configured level.
const WORKSPACE_TARGETS: &[&str] = &[
    "core_bridge",
    "core_runtime",
    "core_service",
    "bridge_native",
    "bridge_embedded",
    "bridge_http",
];

/// Dependencies held at `warn` by the default filter.
const QUIET_TARGETS: &[&str] = &["h2", "hyper", "hyper_util", "reqwest", "rustls"];

const REDACTED: &str = "[REDACTED]";

/// Field names whose values are never logged verbatim.
const SENSITIVE_FIELDS: &[&str] = &[
    "token",
    "password",
    "secret",
    "api_key",
    "authorization",
    "bearer",
    "cookie",
    "device_code",
    "devicecode",
];

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable multi-line output
    Pretty,
    /// One JSON object per event
    Json,
    /// Single-line output
    Compact,
}

impl Default for LogFormat {
    fn default() -> Self {
        #[cfg(debug_assertions)]
        return Self::Pretty;

        #[cfg(not(debug_assertions))]
        return Self::Json;
    }
}

/// Logging configuration
#[derive(Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Level applied to the workspace crates by the default filter
    pub level: LogLevel,
    /// Redact sensitive field values forwarded to the sink
    pub redact_sensitive: bool,
    /// Replaces the default filter entirely (e.g. `"core_bridge=trace"`)
    pub filter: Option<String>,
    pub logger_sink: Option<Arc<dyn LoggerSink>>,
    /// Emit span enter/exit events (pretty) or span context (JSON)
    pub enable_spans: bool,
    pub display_target: bool,
}

impl fmt::Debug for LoggingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggingConfig")
            .field("format", &self.format)
            .field("level", &self.level)
            .field("redact_sensitive", &self.redact_sensitive)
            .field("filter", &self.filter)
            .field("logger_sink", &self.logger_sink.is_some())
            .field("enable_spans", &self.enable_spans)
            .field("display_target", &self.display_target)
            .finish()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: LogLevel::Info,
            redact_sensitive: true,
            filter: None,
            logger_sink: None,
            enable_spans: false,
            display_target: true,
        }
    }
}

impl LoggingConfig {
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_redaction(mut self, redact: bool) -> Self {
        self.redact_sensitive = redact;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Mirrors events to the host's logging pipeline.
    pub fn with_logger_sink(mut self, sink: Arc<dyn LoggerSink>) -> Self {
        self.logger_sink = Some(sink);
        self
    }

    pub fn with_spans(mut self, enable: bool) -> Self {
        self.enable_spans = enable;
        self
    }

    pub fn with_target(mut self, display: bool) -> Self {
        self.display_target = display;
        self
    }
}

/// Installs the global subscriber.
///
/// Call once at startup. A second call fails with [`Error::Config`] because a
/// global subscriber is already set.
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter = build_filter(&config)?;
    let fmt_layer = build_fmt_layer(&config);
    let sink_layer = LoggerSinkLayer::new(config.logger_sink.clone(), config.redact_sensitive);

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(sink_layer)
        .with(filter)
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to initialize logging: {}", e)))
}

fn level_directive(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Trace => "trace",
        LogLevel::Debug => "debug",
        LogLevel::Info => "info",
        LogLevel::Warn => "warn",
        LogLevel::Error => "error",
    }
}

fn default_filter_string(level: LogLevel) -> String {
    let level = level_directive(level);
    let ours = WORKSPACE_TARGETS
        .iter()
        .map(|target| format!("{}={}", target, level));
    let quiet = QUIET_TARGETS.iter().map(|target| format!("{}=warn", target));

    std::iter::once("warn".to_string())
        .chain(ours)
        .chain(quiet)
        .collect::<Vec<_>>()
        .join(",")
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let filter_string = config
        .filter
        .clone()
        .unwrap_or_else(|| default_filter_string(config.level));

    EnvFilter::try_new(filter_string)
        .map_err(|e| Error::Config(format!("Invalid log filter: {}", e)))
}

fn build_fmt_layer(config: &LoggingConfig) -> Box<dyn Layer<Registry> + Send + Sync> {
    match config.format {
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(config.display_target)
            .with_span_events(if config.enable_spans {
                FmtSpan::ACTIVE
            } else {
                FmtSpan::NONE
            })
            .with_writer(io::stdout)
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(config.enable_spans)
            .with_span_list(config.enable_spans)
            .with_target(config.display_target)
            .with_writer(io::stdout)
            .boxed(),
        LogFormat::Compact => tracing_subscriber::fmt::layer()
            .compact()
            .with_target(config.display_target)
            .with_writer(io::stdout)
            .boxed(),
    }
}

/// Forwards events to a [`LoggerSink`].
struct LoggerSinkLayer {
    sink: Option<Arc<dyn LoggerSink>>,
    redact: bool,
}

impl LoggerSinkLayer {
    fn new(sink: Option<Arc<dyn LoggerSink>>, redact: bool) -> Self {
        Self { sink, redact }
    }
}

impl<S> Layer<S> for LoggerSinkLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let Some(sink) = self.sink.as_ref() else {
            return;
        };

        let metadata = event.metadata();
        let level = tracing_level_to_log_level(*metadata.level());
        if level < sink.min_level() {
            return;
        }

        let mut visitor = SinkVisitor::new(self.redact);
        event.record(&mut visitor);

        let message = visitor
            .message
            .unwrap_or_else(|| metadata.name().to_string());

        let mut entry = LogEntry::new(level, metadata.target(), message);
        for (key, value) in visitor.fields {
            entry = entry.with_field(key, value);
        }
        if let Some(span) = ctx.lookup_current() {
            entry = entry.with_span_id(span.name());
        }

        let sink = Arc::clone(sink);

        // Inside a runtime the sink runs detached; blocking here could stall a
        // worker thread.
        if let Ok(handle) = runtime::Handle::try_current() {
            handle.spawn(async move {
                if let Err(err) = sink.log(entry).await {
                    eprintln!("LoggerSink error: {}", err);
                }
            });
            return;
        }

        if let Err(err) = runtime::block_on(async move { sink.log(entry).await }) {
            eprintln!("LoggerSink error: {}", err);
        }
    }
}

struct SinkVisitor {
    redact: bool,
    message: Option<String>,
    fields: HashMap<String, String>,
}

impl SinkVisitor {
    fn new(redact: bool) -> Self {
        Self {
            redact,
            message: None,
            fields: HashMap::new(),
        }
    }

    fn record_value(&mut self, field: &Field, value: String) {
        if field.name() == "message" {
            self.message = Some(value);
        } else if self.redact {
            let redacted = redact_if_sensitive(field.name(), &value);
            self.fields.insert(field.name().to_string(), redacted);
        } else {
            self.fields.insert(field.name().to_string(), value);
        }
    }
}

impl Visit for SinkVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.record_value(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_value(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.record_value(field, value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.record_value(field, value.to_string());
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.record_value(field, value.to_string());
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.record_value(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.record_value(field, format!("{:?}", value));
    }
}

fn tracing_level_to_log_level(level: tracing::Level) -> LogLevel {
    match level {
        tracing::Level::TRACE => LogLevel::Trace,
        tracing::Level::DEBUG => LogLevel::Debug,
        tracing::Level::INFO => LogLevel::Info,
        tracing::Level::WARN => LogLevel::Warn,
        tracing::Level::ERROR => LogLevel::Error,
    }
}

/// Redacts a value when its field name looks like a credential.
///
/// Field names are matched case-insensitively with `-` treated as `_`, so
/// `deviceCode`, `device-code` and `device_code` are all caught. Values that
/// look like email addresses keep only their first character.
///
/// ```ignore
/// use core_runtime::logging::redact_if_sensitive;
///
/// tracing::debug!(device_code = %redact_if_sensitive("device_code", code), "polling");
/// ```
pub fn redact_if_sensitive(field_name: &str, value: &str) -> String {
    let normalized = field_name.to_ascii_lowercase().replace('-', "_");
    if SENSITIVE_FIELDS.iter().any(|f| normalized.contains(f)) {
        return REDACTED.to_string();
    }

    let Some((local, domain)) = value.split_once('@') else {
        return value.to_string();
    };
    match local.chars().next() {
        Some(first) if domain.contains('.') => format!("{}***@{}", first, REDACTED),
        _ => value.to_string(),
    }
}

/// Final path segment, accepting both separators.
///
/// ```ignore
/// tracing::debug!(file = %strip_path("C:\\proj\\src\\main.rs"), "read");
/// // file="main.rs"
/// ```
pub fn strip_path(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as SinkResult;
    use std::sync::Mutex;

    #[derive(Default)]
    struct TestLoggerSink {
        entries: Mutex<Vec<LogEntry>>,
    }

    #[async_trait]
    impl LoggerSink for TestLoggerSink {
        async fn log(&self, entry: LogEntry) -> SinkResult<()> {
            self.entries.lock().unwrap().push(entry);
            Ok(())
        }

        fn min_level(&self) -> LogLevel {
            LogLevel::Debug
        }
    }

    fn with_sink_layer(redact: bool, emit: impl FnOnce()) -> Vec<LogEntry> {
        let sink = Arc::new(TestLoggerSink::default());
        let trait_sink: Arc<dyn LoggerSink> = sink.clone();
        let subscriber =
            tracing_subscriber::registry().with(LoggerSinkLayer::new(Some(trait_sink), redact));
        tracing::subscriber::with_default(subscriber, emit);
        let entries = sink.entries.lock().unwrap().clone();
        entries
    }

    #[test]
    fn test_default_filter_lists_workspace_crates() {
        let filter = default_filter_string(LogLevel::Debug);

        for target in WORKSPACE_TARGETS {
            assert!(filter.contains(&format!("{}=debug", target)), "{filter}");
        }
        assert!(filter.contains("reqwest=warn"));
        assert!(filter.contains("hyper=warn"));
        assert!(filter.starts_with("warn,"));
    }

    #[test]
    fn test_build_filter_accepts_default_and_custom() {
        let config = LoggingConfig::default().with_level(LogLevel::Trace);
        let filter = build_filter(&config).unwrap();
        assert!(filter.to_string().contains("core_bridge=trace"));

        let config = LoggingConfig::default().with_filter("bridge_http=debug");
        let filter = build_filter(&config).unwrap();
        assert!(filter.to_string().contains("bridge_http=debug"));
    }

    #[test]
    fn test_build_filter_rejects_garbage() {
        let config = LoggingConfig::default().with_filter("core_bridge=loud");
        let err = build_filter(&config).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_sink_layer_forwards_fields_and_target() {
        let entries = with_sink_layer(true, || {
            tracing::info!(target: "core_bridge", kind = "list_directory", "dispatched");
        });

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].target, "core_bridge");
        assert_eq!(entries[0].message, "dispatched");
        assert_eq!(
            entries[0].fields.get("kind"),
            Some(&"list_directory".to_string())
        );
    }

    #[test]
    fn test_sink_layer_redacts_credentials() {
        let entries = with_sink_layer(true, || {
            tracing::debug!(device_code = "3584-abcd", user = "octo", "polling device flow");
        });

        assert_eq!(entries[0].fields.get("device_code"), Some(&REDACTED.to_string()));
        assert_eq!(entries[0].fields.get("user"), Some(&"octo".to_string()));
    }

    #[test]
    fn test_sink_layer_redaction_can_be_disabled() {
        let entries = with_sink_layer(false, || {
            tracing::warn!(access_token = "gho_123", "token refreshed");
        });

        assert_eq!(entries[0].fields.get("access_token"), Some(&"gho_123".to_string()));
    }

    #[test]
    fn test_sink_layer_respects_min_level() {
        let entries = with_sink_layer(true, || {
            tracing::trace!("too chatty");
            tracing::error!("kept");
        });

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].level, LogLevel::Error);
    }

    #[test]
    fn test_redact_if_sensitive() {
        assert_eq!(redact_if_sensitive("Authorization", "Bearer x"), REDACTED);
        assert_eq!(redact_if_sensitive("deviceCode", "abc"), REDACTED);
        assert_eq!(redact_if_sensitive("device-code", "abc"), REDACTED);
        assert_eq!(redact_if_sensitive("refresh_token", "r"), REDACTED);

        let email = redact_if_sensitive("email", "octo@example.com");
        assert_eq!(email, "o***@[REDACTED]");

        assert_eq!(redact_if_sensitive("branch", "feature/x"), "feature/x");
        assert_eq!(redact_if_sensitive("handle", "@octo"), "@octo");
    }

    #[test]
    fn test_redact_keeps_whole_first_char_of_non_ascii_email() {
        assert_eq!(
            redact_if_sensitive("email", "élise@example.com"),
            "é***@[REDACTED]"
        );
        assert_eq!(redact_if_sensitive("author", "李雷@例子.cn"), "李***@[REDACTED]");
    }

    #[test]
    fn test_strip_path() {
        assert_eq!(strip_path("/home/dev/proj/src/main.rs"), "main.rs");
        assert_eq!(strip_path("C:\\proj\\Cargo.toml"), "Cargo.toml");
        assert_eq!(strip_path("C:/proj\\mixed/lib.rs"), "lib.rs");
        assert_eq!(strip_path("README.md"), "README.md");
        assert_eq!(strip_path("/tmp/"), "");
    }
}
