#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![cfg_attr(feature = "fail-on-warnings", deny(clippy::all))]

use serde::{Deserialize, Serialize};
use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub use tracing::*;

const DEFAULT_DIRECTIVES: &str = "info,otel::tracing=trace,sqlx=warn,loan_transfer=info";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TracingConfig {
    pub service_name: String,
    #[serde(default = "default_json")]
    pub json: bool,
    /// Export spans over OTLP. The endpoint is taken from the standard
    /// `OTEL_EXPORTER_OTLP_*` environment variables.
    #[serde(default)]
    pub otlp: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            service_name: "dev".to_string(),
            json: default_json(),
            otlp: false,
        }
    }
}

fn default_json() -> bool {
    true
}

pub fn init_tracer(config: TracingConfig) -> anyhow::Result<()> {
    let filter_layer =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(DEFAULT_DIRECTIVES))?;

    #[cfg(feature = "otel")]
    let telemetry = if config.otlp {
        Some(otel::layer(&config)?)
    } else {
        None
    };
    #[cfg(not(feature = "otel"))]
    let telemetry: Option<tracing_subscriber::layer::Identity> = None;

    let registry = tracing_subscriber::registry()
        .with(filter_layer)
        .with(telemetry);
    if config.json {
        registry.with(fmt::layer().json()).try_init()?;
    } else {
        registry.with(fmt::layer()).try_init()?;
    }

    if config.otlp && cfg!(not(feature = "otel")) {
        tracing::warn!("otlp export requested but the otel feature is not enabled");
    }
    tracing::info!(service_name = %config.service_name, "tracing initialized");

    Ok(())
}

#[cfg(feature = "otel")]
mod otel {
    use opentelemetry::{global, trace::TracerProvider as _, KeyValue};
    use opentelemetry_sdk::{
        propagation::TraceContextPropagator,
        runtime,
        trace::{Config, Tracer},
        Resource,
    };
    use tracing::Subscriber;
    use tracing_opentelemetry::OpenTelemetryLayer;
    use tracing_subscriber::registry::LookupSpan;

    use super::TracingConfig;

    pub(super) fn layer<S>(config: &TracingConfig) -> anyhow::Result<OpenTelemetryLayer<S, Tracer>>
    where
        S: Subscriber + for<'span> LookupSpan<'span>,
    {
        global::set_text_map_propagator(TraceContextPropagator::new());
        let resource = Resource::new(vec![
            KeyValue::new("service.name", config.service_name.clone()),
            KeyValue::new("service.namespace", "loan-transfer"),
        ]);
        let provider = opentelemetry_otlp::new_pipeline()
            .tracing()
            .with_exporter(opentelemetry_otlp::new_exporter().http())
            .with_trace_config(Config::default().with_resource(resource))
            .install_batch(runtime::Tokio)?;
        let tracer = provider.tracer("loan-transfer");
        global::set_tracer_provider(provider);

        Ok(tracing_opentelemetry::layer().with_tracer(tracer))
    }
}
