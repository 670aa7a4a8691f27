use std::sync::OnceLock;

use metrics::{describe_counter, describe_histogram, Unit};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;

pub(crate) const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
pub(crate) const CLASSIFICATION_REQUESTS_TOTAL: &str = "classification_requests_total";
pub(crate) const CLASSIFICATION_DURATION_SECONDS: &str = "classification_duration_seconds";
pub(crate) const URGENCY_KEYWORD_OVERRIDES_TOTAL: &str = "urgency_keyword_overrides_total";
pub(crate) const COMPLAINTS_SUBMITTED_TOTAL: &str = "complaints_submitted_total";

/// Model call latency, up to the default request timeout.
const CLASSIFICATION_BUCKETS: &[f64] = &[0.25, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0];

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(CLASSIFICATION_DURATION_SECONDS.to_string()),
            CLASSIFICATION_BUCKETS,
        )?
        .install_recorder()?;
    let _ = PROM_HANDLE.set(handle);
    describe();
    Ok(())
}

pub(crate) fn render() -> Option<String> {
    PROM_HANDLE.get().map(|handle| handle.render())
}

fn describe() {
    describe_counter!(HTTP_REQUESTS_TOTAL, "HTTP requests served");
    describe_counter!(
        CLASSIFICATION_REQUESTS_TOTAL,
        "Classification attempts by kind (text, image) and result"
    );
    describe_histogram!(
        CLASSIFICATION_DURATION_SECONDS,
        Unit::Seconds,
        "Latency of classification calls to the model endpoint"
    );
    describe_counter!(
        URGENCY_KEYWORD_OVERRIDES_TOTAL,
        "Complaints raised to high urgency by a keyword after the model said low"
    );
    describe_counter!(COMPLAINTS_SUBMITTED_TOTAL, "Complaints persisted, by urgency");
}
