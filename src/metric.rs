use opentelemetry::{KeyValue, metrics::UpDownCounter};
use std::sync::LazyLock;

static STATDS: LazyLock<UpDownCounter<i64>> = LazyLock::new(|| {
    logfire::i64_up_down_counter("wa_webhook_statds")
        .with_description("WhatsApp webhook statistics")
        .with_unit("delivery")
        .build()
});

fn incr_statds(metric: String, value: String) {
    STATDS.add(1, &[KeyValue::new(metric, value)]);
}

pub fn incr_handshake_statds(outcome: &str) {
    incr_statds("handshake".to_string(), outcome.into())
}

pub fn incr_delivery_statds(outcome: &str) {
    incr_statds("delivery".to_string(), outcome.into())
}
