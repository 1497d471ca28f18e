//! Provides utilities to initialize logging and OpenTelemetry tracing.
use std::env;

use opentelemetry::{trace::TracerProvider, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::Resource;
use tracing::*;
use tracing_subscriber::{
    layer::SubscriberExt, registry::LookupSpan, util::SubscriberInitExt, Layer,
};

/// Environment variable name for the OpenTelemetry collector URL.
pub const OTLP_URL_ENVVAR: &str = "DISPUTE_REACTOR_OTLP_URL";

/// Environment variable name for the service label, which is appended to the
/// whoami string.
pub const SVC_LABEL_ENVVAR: &str = "DISPUTE_REACTOR_SVC_LABEL";

/// Configuration for the logger.
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// The whoami string, which is used to identify the service in logs.
    whoami: String,

    /// The OpenTelemetry URL for exporting traces.
    otel_url: Option<String>,
}

impl LoggerConfig {
    /// Creates a new empty instance with whoami set.
    pub const fn new(whoami: String) -> Self {
        Self {
            whoami,
            otel_url: None,
        }
    }

    /// Creates a new instance with the whoami string derived from the provided base name.
    pub fn with_base_name(s: &str) -> Self {
        Self::new(get_whoami_string(s))
    }

    /// Creates a new instance from the base name, picking up the service label and the OTLP URL
    /// from the environment.
    pub fn from_env(base: &str) -> Self {
        let mut config = Self::with_base_name(base);
        config.otel_url = get_otlp_url_from_env();
        config
    }

    /// Sets the opentelemetry URL to the provided string.
    pub fn set_otlp_url(&mut self, url: String) {
        self.otel_url = Some(url);
    }

    /// Returns the whoami string.
    pub fn whoami(&self) -> &str {
        &self.whoami
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self::from_env("(dispute-reactor)")
    }
}

/// Initializes the logging subsystem with the provided config.
///
/// Returns `false` without touching anything if a global subscriber is already installed, so
/// calling this more than once (e.g. from several tests) is harmless.
pub fn init(config: LoggerConfig) -> bool {
    let filt = tracing_subscriber::EnvFilter::from_default_env();

    let log_file = env::var("LOG_FILE").is_ok_and(|v| v == "1");
    let log_line_num = env::var("LOG_LINE_NUM").is_ok_and(|v| v == "1");

    // Stdout logging.
    let stdout_sub = tracing_subscriber::fmt::layer()
        .compact()
        .event_format(
            tracing_subscriber::fmt::format()
                .with_file(log_file)
                .with_line_number(log_line_num),
        )
        .with_filter(filt);

    // OpenTelemetry output, if configured and the exporter could be built.
    let otel_sub = config
        .otel_url
        .as_deref()
        .and_then(|url| otel_layer(url, &config.whoami));

    let installed = tracing_subscriber::registry()
        .with(stdout_sub)
        .with(otel_sub)
        .try_init()
        .is_ok();

    if installed {
        info!(whoami = %config.whoami, "logging started");
    }

    installed
}

fn otel_layer<S>(otel_url: &str, whoami: &str) -> Option<Box<dyn Layer<S> + Send + Sync>>
where
    S: Subscriber + for<'span> LookupSpan<'span> + Send + Sync,
{
    let resource = Resource::builder()
        .with_attribute(KeyValue::new("service.name", whoami.to_owned()))
        .build();

    let exporter = match opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(otel_url)
        .build()
    {
        Ok(exporter) => exporter,
        Err(e) => {
            // No subscriber is installed yet, so this is the only place the failure can go.
            eprintln!("failed to initialize otlp exporter for {otel_url}: {e}");
            return None;
        }
    };

    let tp = opentelemetry_sdk::trace::SdkTracerProvider::builder()
        .with_resource(resource)
        .with_batch_exporter(exporter)
        .build();

    let tracer = tp.tracer("dispute-reactor");
    opentelemetry::global::set_tracer_provider(tp);

    Some(tracing_opentelemetry::layer().with_tracer(tracer).boxed())
}

/// Gets the OTLP URL from the standard envvar.
pub fn get_otlp_url_from_env() -> Option<String> {
    env::var(OTLP_URL_ENVVAR).ok()
}

/// Gets the service label from the standard envvar, which should be included
/// in the whoami string.
pub fn get_service_label_from_env() -> Option<String> {
    env::var(SVC_LABEL_ENVVAR).ok()
}

/// Computes a standard whoami string.
pub fn get_whoami_string(base: &str) -> String {
    match get_service_label_from_env() {
        Some(label) => format!("{base}%{label}"),
        None => base.to_owned(),
    }
}
