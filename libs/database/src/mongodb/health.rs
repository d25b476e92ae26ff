use mongodb::{Client, bson::doc};
use std::time::{Duration, Instant};

/// Outcome of a MongoDB ping
#[derive(Debug, Clone)]
pub struct HealthStatus {
    pub healthy: bool,
    /// Server error when unhealthy
    pub message: Option<String>,
    pub latency: Duration,
}

/// `true` when the server answers a `ping`
pub async fn check_health(client: &Client) -> bool {
    check_health_detailed(client).await.healthy
}

/// Pings the `admin` database and reports latency.
pub async fn check_health_detailed(client: &Client) -> HealthStatus {
    let start = Instant::now();
    let result = client.database("admin").run_command(doc! { "ping": 1 }).await;
    let latency = start.elapsed();

    match result {
        Ok(_) => HealthStatus {
            healthy: true,
            message: None,
            latency,
        },
        Err(e) => HealthStatus {
            healthy: false,
            message: Some(e.to_string()),
            latency,
        },
    }
}
