use crate::exporter::AppState;
use axum::{
    extract::Extension,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
};
use futures::future::join_all;
use std::collections::HashSet;
use tracing::{debug, instrument};

/// Scrape every configured region's `Collector` concurrently and merge
/// their rendered exposition bodies into one valid exposition document.
/// `Collector::collect` never returns `Err` (spec §7), so this handler has
/// no error branch to report: a region-level failure is already reflected
/// in that region's `up` sample.
#[instrument(skip(state), fields(http.route = "/metrics"))]
pub async fn metrics(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let mut headers = HeaderMap::new();
    headers.insert(
        "content-type",
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );

    let bodies = join_all(state.collectors.iter().map(|c| c.collect())).await;
    debug!(regions = bodies.len(), "collected metrics");
    let body = merge_exposition(&bodies);

    (StatusCode::OK, headers, body)
}

/// Each region's `Collector::collect` renders its own complete exposition
/// body, `# HELP`/`# TYPE` headers included, from its own throwaway
/// registry. Metric names repeat across regions (`up`, `rds_instance_info`,
/// ...), so naively concatenating bodies duplicates their `# HELP`/`# TYPE`
/// lines — a duplicate `# TYPE` line for the same metric name is invalid
/// exposition format and gets rejected by a Prometheus/OpenMetrics parser.
/// Keep only the first `# HELP`/`# TYPE` pair seen per metric name; every
/// sample line is kept regardless of region.
fn merge_exposition(bodies: &[String]) -> String {
    let mut seen_help = HashSet::new();
    let mut seen_type = HashSet::new();
    let mut merged = String::new();

    for body in bodies {
        for line in body.lines() {
            if let Some(name) = line.strip_prefix("# HELP ").and_then(|rest| rest.split_whitespace().next()) {
                if !seen_help.insert(name.to_string()) {
                    continue;
                }
            } else if let Some(name) = line.strip_prefix("# TYPE ").and_then(|rest| rest.split_whitespace().next()) {
                if !seen_type.insert(name.to_string()) {
                    continue;
                }
            }
            merged.push_str(line);
            merged.push('\n');
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_response_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "content-type",
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );

        assert_eq!(
            headers.get("content-type").expect("header present"),
            "text/plain; charset=utf-8"
        );
    }

    /// Two regions both emitting `up` must not produce a duplicate
    /// `# HELP`/`# TYPE up` pair; the sample line from each region is kept.
    #[test]
    fn merge_exposition_drops_duplicate_help_and_type_lines() {
        let region_a = "# HELP up Whether the last scrape succeeded\n# TYPE up gauge\nup{aws_region=\"us-east-1\"} 1\n".to_string();
        let region_b = "# HELP up Whether the last scrape succeeded\n# TYPE up gauge\nup{aws_region=\"eu-west-1\"} 1\n".to_string();

        let merged = merge_exposition(&[region_a, region_b]);

        assert_eq!(merged.matches("# HELP up").count(), 1);
        assert_eq!(merged.matches("# TYPE up").count(), 1);
        assert_eq!(merged.matches("up{").count(), 2);
        assert!(merged.contains("us-east-1"));
        assert!(merged.contains("eu-west-1"));
    }

    #[test]
    fn merge_exposition_keeps_distinct_metric_families_from_every_region() {
        let region_a = "# HELP up help\n# TYPE up gauge\nup{r=\"a\"} 1\n".to_string();
        let region_b = "# HELP rds_instance_info help\n# TYPE rds_instance_info gauge\nrds_instance_info{r=\"b\"} 1\n".to_string();

        let merged = merge_exposition(&[region_a, region_b]);

        assert!(merged.contains("up{r=\"a\"}"));
        assert!(merged.contains("rds_instance_info{r=\"b\"}"));
    }
}
