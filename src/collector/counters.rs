//! Persistent per-region state: `rds_exporter_build_info`, `rds_api_call_total{api}`
//! and `rds_exporter_errors_total`. Unlike the rest of the metric set these are
//! not rebuilt every scrape — they live for the `Collector`'s lifetime and
//! are only ever incremented, mirroring the teacher's long-lived
//! `prometheus` metric-type struct fields.

use prometheus::{CounterVec, GaugeVec, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Counters {
    registry: Registry,
    api_calls: CounterVec,
    errors: CounterVec,
    account_id: String,
    region: String,
}

impl Counters {
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new(account_id: &str, region: &str, version: &str, commit: &str) -> Self {
        let registry = Registry::new();

        let build_info = GaugeVec::new(
            Opts::new(
                "rds_exporter_build_info",
                "Exporter build information, value is always 1",
            ),
            &["aws_account_id", "aws_region", "version", "commit"],
        )
        .expect("rds_exporter_build_info metric definition is well-formed");
        registry
            .register(Box::new(build_info.clone()))
            .expect("rds_exporter_build_info registers exactly once");
        build_info
            .with_label_values(&[account_id, region, version, commit])
            .set(1.0);

        let api_calls = CounterVec::new(
            Opts::new(
                "rds_api_call_total",
                "Number of upstream API calls issued, by source",
            ),
            &["aws_account_id", "aws_region", "api"],
        )
        .expect("rds_api_call_total metric definition is well-formed");
        registry
            .register(Box::new(api_calls.clone()))
            .expect("rds_api_call_total registers exactly once");

        let errors = CounterVec::new(
            Opts::new(
                "rds_exporter_errors_total",
                "Number of non-fatal errors encountered while scraping",
            ),
            &["aws_account_id", "aws_region"],
        )
        .expect("rds_exporter_errors_total metric definition is well-formed");
        registry
            .register(Box::new(errors.clone()))
            .expect("rds_exporter_errors_total registers exactly once");

        // Force the zero-value series into existence immediately: the
        // counter must be visible on the very first scrape (spec §4.1 step 1),
        // not only after the first error.
        errors.with_label_values(&[account_id, region]).inc_by(0.0);

        Self {
            registry,
            api_calls,
            errors,
            account_id: account_id.to_string(),
            region: region.to_string(),
        }
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn add_api_calls(&self, api: &str, n: u64) {
        if n == 0 {
            return;
        }
        self.api_calls
            .with_label_values(&[&self.account_id, &self.region, api])
            .inc_by(n as f64);
    }

    pub fn inc_errors(&self) {
        self.inc_errors_by(1);
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn inc_errors_by(&self, n: u64) {
        if n == 0 {
            return;
        }
        self.errors
            .with_label_values(&[&self.account_id, &self.region])
            .inc_by(n as f64);
    }

    #[must_use]
    pub fn render(&self) -> String {
        let families = self.registry.gather();
        let mut buffer = Vec::new();
        let _ = TextEncoder::new().encode(&families, &mut buffer);
        String::from_utf8(buffer).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_counter_is_present_before_any_error_is_recorded() {
        let counters = Counters::new("123456789012", "us-east-1", "0.1.0", "deadbeef");
        let rendered = counters.render();
        assert!(rendered.contains("rds_exporter_errors_total"));
        assert!(rendered.contains("} 0"));
    }

    #[test]
    fn build_info_is_present_with_value_one() {
        let counters = Counters::new("123456789012", "us-east-1", "0.1.0", "deadbeef");
        let rendered = counters.render();
        assert!(rendered.contains("rds_exporter_build_info"));
        assert!(rendered.contains(r#"version="0.1.0""#));
        assert!(rendered.contains("} 1"));
    }

    #[test]
    fn api_calls_accumulate_across_invocations() {
        let counters = Counters::new("123456789012", "us-east-1", "0.1.0", "deadbeef");
        counters.add_api_calls("rds", 3);
        counters.add_api_calls("rds", 2);
        let rendered = counters.render();
        assert!(rendered.contains(r#"api="rds"} 5"#));
    }

    #[test]
    fn zero_call_counts_do_not_register_a_series() {
        let counters = Counters::new("123456789012", "us-east-1", "0.1.0", "deadbeef");
        counters.add_api_calls("ec2", 0);
        let rendered = counters.render();
        assert!(!rendered.contains(r#"api="ec2""#));
    }
}
