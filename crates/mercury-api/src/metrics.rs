//! Process-wide Prometheus metrics, exposed on `GET /metrics`.

use prometheus::{Encoder, GaugeVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

pub struct Metrics {
    registry: Registry,
    pub binds_total: IntCounterVec,
    pub retrieves_total: IntCounterVec,
    pub quota_remaining: GaugeVec,
    pub in_flight_requests: IntGauge,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let binds_total = IntCounterVec::new(
            Opts::new("xzmercury_bind_total", "Bind attempts by result"),
            &["result"],
        )
        .expect("metric options are valid");
        let retrieves_total = IntCounterVec::new(
            Opts::new("xzmercury_retrieve_total", "Retrieve attempts by result"),
            &["result"],
        )
        .expect("metric options are valid");
        let quota_remaining = GaugeVec::new(
            Opts::new(
                "xzmercury_quota_remaining",
                "Remaining hourly credits for a group after the last successful deduction",
            ),
            &["group"],
        )
        .expect("metric options are valid");
        let in_flight_requests = IntGauge::new(
            "xzmercury_in_flight_requests",
            "HTTP requests currently being handled",
        )
        .expect("metric options are valid");

        registry
            .register(Box::new(binds_total.clone()))
            .expect("metric registration never collides at startup");
        registry
            .register(Box::new(retrieves_total.clone()))
            .expect("metric registration never collides at startup");
        registry
            .register(Box::new(quota_remaining.clone()))
            .expect("metric registration never collides at startup");
        registry
            .register(Box::new(in_flight_requests.clone()))
            .expect("metric registration never collides at startup");

        Self {
            registry,
            binds_total,
            retrieves_total,
            quota_remaining,
            in_flight_requests,
        }
    }

    pub fn render(&self) -> String {
        let families = self.registry.gather();
        let mut buf = Vec::new();
        TextEncoder::new()
            .encode(&families, &mut buf)
            .expect("prometheus text encoding is infallible for well-formed metrics");
        String::from_utf8(buf).expect("prometheus text encoder emits valid utf-8")
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
