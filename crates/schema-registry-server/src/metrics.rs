//! A small Prometheus registry scoped to registry-relevant counters,
//! mirroring the teacher's `metrics_handler`/`TextEncoder` pattern at a
//! fraction of its metric set (§10.4).

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

pub struct RegistryMetrics {
    registry: Registry,
    registrations_total: IntCounter,
    compatibility_checks_total: IntCounter,
    errors_total: IntCounterVec,
}

impl RegistryMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let registrations_total = IntCounter::new(
            "schema_registrations_total",
            "Total number of successful schema registrations",
        )
        .expect("valid metric");
        let compatibility_checks_total = IntCounter::new(
            "schema_compatibility_checks_total",
            "Total number of compatibility checks performed",
        )
        .expect("valid metric");
        let errors_total = IntCounterVec::new(
            Opts::new("schema_registry_errors_total", "Total number of errors by error_code"),
            &["error_code"],
        )
        .expect("valid metric");

        registry
            .register(Box::new(registrations_total.clone()))
            .expect("register metric");
        registry
            .register(Box::new(compatibility_checks_total.clone()))
            .expect("register metric");
        registry
            .register(Box::new(errors_total.clone()))
            .expect("register metric");

        Self {
            registry,
            registrations_total,
            compatibility_checks_total,
            errors_total,
        }
    }

    pub fn record_registration(&self) {
        self.registrations_total.inc();
    }

    pub fn record_compatibility_check(&self) {
        self.compatibility_checks_total.inc();
    }

    pub fn record_error(&self, error_code: i32) {
        self.errors_total.with_label_values(&[&error_code.to_string()]).inc();
    }

    pub fn encode(&self) -> Vec<u8> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&self.registry.gather(), &mut buffer)
            .expect("prometheus text encoding never fails for counter families");
        buffer
    }
}

impl Default for RegistryMetrics {
    fn default() -> Self {
        Self::new()
    }
}
