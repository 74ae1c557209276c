#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

/// Convert metric values (stored as f64) back to i64 safely for assertions.
///
/// Metrics in the codebase are always integer counters or gauges, but
/// Prometheus stores them internally as `f64`. Round and parse through a
/// string representation rather than doing a lossy `as i64` cast.
#[must_use]
pub fn metric_value_to_i64(value: f64) -> i64 {
    assert!(
        value.is_finite(),
        "metric values must be finite, got {value}"
    );
    let rounded = value.round();
    let as_string = format!("{rounded:.0}");
    as_string
        .parse::<i64>()
        .unwrap_or_else(|_| panic!("metric value {value} does not fit in i64"))
}

/// Find an available port for testing (returns port > 1024).
pub fn get_available_port() -> u16 {
    use std::net::TcpListener;

    let listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind to random port");
    let port = listener
        .local_addr()
        .expect("failed to get local addr")
        .port();

    assert!(port > 1024, "assigned port {port} should be > 1024");
    port
}

/// Wait for a server to become reachable on the given port.
pub async fn wait_for_server(port: u16, max_attempts: u32) -> bool {
    use tokio::time::{Duration, sleep};

    for attempt in 1..=max_attempts {
        if tokio::net::TcpStream::connect(format!("localhost:{port}"))
            .await
            .is_ok()
        {
            return true;
        }

        if attempt % 10 == 0 {
            eprintln!(
                "still waiting for server on port {port} (attempt {attempt}/{max_attempts})"
            );
        }

        sleep(Duration::from_millis(100)).await;
    }

    false
}

/// Base URL for a locally bound test server.
#[must_use]
pub fn get_test_url(port: u16) -> String {
    format!("http://localhost:{port}")
}
