//! Logging and optional OpenTelemetry export

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "cmdrelay=info";

/// Install the global subscriber.
///
/// # Environment Variables
///
/// - `RUST_LOG`: filter directives (default: `cmdrelay=info`)
/// - `CMDRELAY_LOG_FORMAT`: `json` for structured output, anything else for pretty
/// - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP endpoint (needs the `telemetry` feature)
/// - `OTEL_SERVICE_NAME`: service name (default: cmdrelay)
///
/// # Example
///
/// ```text
/// CMDRELAY_LOG_FORMAT=json \
/// OTEL_EXPORTER_OTLP_ENDPOINT=http://localhost:4317 \
///     ./cmdrelay
/// ```
pub fn init_logging() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))
        .context("invalid log filter")?;

    let json = matches!(std::env::var("CMDRELAY_LOG_FORMAT").as_deref(), Ok("json"));
    let (json_layer, pretty_layer) = if json {
        (Some(fmt::layer().json()), None)
    } else {
        (None, Some(fmt::layer().pretty()))
    };

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(pretty_layer);

    #[cfg(feature = "telemetry")]
    let registry = registry.with(otel::layer()?);

    registry
        .try_init()
        .context("failed to install tracing subscriber")?;

    #[cfg(not(feature = "telemetry"))]
    {
        if std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").is_ok() {
            tracing::warn!("OpenTelemetry endpoint set but feature 'telemetry' not enabled");
            tracing::warn!("Rebuild with: cargo build --features telemetry");
        }
    }

    Ok(())
}

/// Flush pending spans on exit
pub fn shutdown_telemetry() {
    #[cfg(feature = "telemetry")]
    {
        opentelemetry::global::shutdown_tracer_provider();
    }
}

#[cfg(feature = "telemetry")]
mod otel {
    use anyhow::Result;
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::trace::{Tracer, TracerProvider};
    use tracing::Subscriber;
    use tracing_opentelemetry::OpenTelemetryLayer;
    use tracing_subscriber::registry::LookupSpan;

    pub fn layer<S>() -> Result<Option<OpenTelemetryLayer<S, Tracer>>>
    where
        S: Subscriber + for<'span> LookupSpan<'span>,
    {
        let Ok(endpoint) = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT") else {
            return Ok(None);
        };
        let service_name =
            std::env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| "cmdrelay".to_string());

        let exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .with_endpoint(&endpoint)
            .build()?;
        let provider = TracerProvider::builder()
            .with_batch_exporter(exporter, opentelemetry_sdk::runtime::Tokio)
            .build();
        let tracer = provider.tracer(service_name);
        opentelemetry::global::set_tracer_provider(provider);

        Ok(Some(tracing_opentelemetry::layer().with_tracer(tracer)))
    }
}
