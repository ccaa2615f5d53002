use futures::future::join_all;
use geoprobe_core::api::{AppConfig, GeoError, HealthStatus};
use geoprobe_plugins::factory;

use super::cli::HealthArgs;
use crate::error::CliError;

/// Exit 0 when every checked provider answers, 30 otherwise.
pub async fn run(args: HealthArgs, mut cfg: AppConfig) -> Result<i32, CliError> {
    if !args.providers.is_empty() {
        cfg.restrict_providers(&args.providers)?;
    }
    let registry = factory::build_registry(&cfg).map_err(|e| GeoError::Config(e.to_string()))?;
    let providers = registry.enabled();

    let statuses = join_all(providers.iter().map(|p| p.health_check())).await;
    for status in &statuses {
        println!("{}", format_status(status));
    }
    let all_healthy = statuses.iter().all(|s| s.healthy);
    Ok(if all_healthy { 0 } else { 30 })
}

fn format_status(status: &HealthStatus) -> String {
    let mark = if status.healthy { "ok  " } else { "FAIL" };
    let mut line = format!(
        "{mark} {:<12} {:<36} {:>6}ms",
        status.provider, status.model, status.latency_ms
    );
    if let Some(err) = &status.error {
        line.push_str(&format!("  {err}"));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_status_carries_error() {
        let line = format_status(&HealthStatus {
            provider: "openai".into(),
            healthy: false,
            latency_ms: 12,
            model: "gpt-4o-mini".into(),
            error: Some("HTTP 401".into()),
        });
        assert!(line.starts_with("FAIL openai"));
        assert!(line.ends_with("HTTP 401"));
    }
}
