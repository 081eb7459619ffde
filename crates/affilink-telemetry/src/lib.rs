//! Process-wide tracing setup shared by the affilink binaries.
//!
//! [`init`] installs a `tracing-subscriber` registry with an `EnvFilter`
//! (`RUST_LOG`, falling back to the configured default), a text or JSON
//! formatter, the `log` bridge, and an OTLP span exporter when an endpoint
//! is configured.

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::{SpanExporter, WithExportConfig};
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_sdk::Resource;
use std::fmt::{Display, Formatter};
use thiserror::Error;
use tracing_log::LogTracer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};
use typed_builder::TypedBuilder;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable single-line output.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

impl Display for LogFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Clone, TypedBuilder)]
pub struct TelemetryConfig {
    #[builder(setter(into))]
    service_name: String,
    #[builder(default)]
    log_format: LogFormat,
    /// Filter used when `RUST_LOG` is unset.
    #[builder(default = "info".to_string(), setter(into))]
    default_filter: String,
    /// gRPC endpoint of an OTLP collector, e.g. `http://localhost:4317`.
    #[builder(default, setter(into))]
    otlp_endpoint: Option<String>,
}

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),
    #[error("failed to build OTLP exporter: {0}")]
    Exporter(#[from] opentelemetry_otlp::ExporterBuildError),
    #[error("failed to install log bridge: {0}")]
    LogBridge(#[from] tracing_log::log::SetLoggerError),
    #[error("failed to install global subscriber: {0}")]
    Subscriber(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Flushes pending spans when dropped. Keep it alive for the whole process.
#[must_use = "dropping the guard shuts the span exporter down"]
pub struct TelemetryGuard {
    provider: Option<SdkTracerProvider>,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.provider.take() {
            if let Err(e) = provider.shutdown() {
                eprintln!("failed to shut down tracer provider: {e}");
            }
        }
    }
}

fn env_filter(default_filter: &str) -> Result<EnvFilter, TelemetryError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => Ok(EnvFilter::try_new(default_filter)?),
    }
}

fn tracer_provider(
    service_name: &str,
    endpoint: &str,
) -> Result<SdkTracerProvider, TelemetryError> {
    let exporter = SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;

    Ok(SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(
            Resource::builder()
                .with_service_name(service_name.to_string())
                .build(),
        )
        .build())
}

/// Installs the global subscriber. Must be called once, inside a Tokio
/// runtime when OTLP export is enabled.
pub fn init(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let filter = env_filter(&config.default_filter)?;

    let provider = config
        .otlp_endpoint
        .as_deref()
        .map(|endpoint| tracer_provider(&config.service_name, endpoint))
        .transpose()?;
    let otel_layer = provider.as_ref().map(|provider| {
        tracing_opentelemetry::layer().with_tracer(provider.tracer(config.service_name.clone()))
    });

    let text_layer = (config.log_format == LogFormat::Text).then(fmt::layer);
    let json_layer = (config.log_format == LogFormat::Json).then(|| fmt::layer().json());

    let subscriber = Registry::default()
        .with(filter)
        .with(text_layer)
        .with(json_layer)
        .with(otel_layer);

    LogTracer::init()?;
    tracing::subscriber::set_global_default(subscriber)?;

    if let Some(endpoint) = &config.otlp_endpoint {
        tracing::info!(%endpoint, service = %config.service_name, "Exporting spans over OTLP");
    }

    Ok(TelemetryGuard { provider })
}
