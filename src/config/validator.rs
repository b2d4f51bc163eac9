//! Configuration validation

use super::*;
use anyhow::Result;
use std::time::Duration;

/// Validate complete configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_target(&config.target)?;
    validate_workload(&config.workload)?;
    Ok(())
}

/// Validate endpoint and credentials
pub fn validate_target(target: &TargetConfig) -> Result<()> {
    if target.url.is_empty() {
        anyhow::bail!("Missing argument -u for host endpoint.");
    }
    if target.is_memory() {
        return Ok(());
    }
    if target.access_key.is_empty() {
        anyhow::bail!("Missing argument -a for access key.");
    }
    if target.secret_key.is_empty() {
        anyhow::bail!("Missing argument -s for secret key.");
    }
    if !(target.url.starts_with("http://") || target.url.starts_with("https://")) {
        anyhow::bail!("Endpoint URL must start with http:// or https://, got '{}'", target.url);
    }
    Ok(())
}

/// Validate workload configuration
pub fn validate_workload(workload: &WorkloadConfig) -> Result<()> {
    if workload.object_count < 0 && workload.duration_secs < 0 {
        anyhow::bail!("The number of objects and duration can not both be unlimited");
    }

    if workload.modes.is_empty() {
        anyhow::bail!("At least one mode must be given with -m");
    }

    if workload.threads == 0 {
        anyhow::bail!("threads must be at least 1");
    }

    if workload.loops == 0 {
        anyhow::bail!("loops must be at least 1");
    }

    if workload.bucket_count == 0 {
        anyhow::bail!("bucket count must be at least 1");
    }

    if workload.max_keys <= 0 {
        anyhow::bail!("max_keys must be at least 1, got {}", workload.max_keys);
    }

    if workload.report_interval.is_nan() {
        anyhow::bail!("report interval must be a number");
    }

    if workload.report_interval > 0.0
        && Duration::try_from_secs_f64(workload.report_interval).is_err()
    {
        anyhow::bail!(
            "report interval {} is too large to be a duration in seconds",
            workload.report_interval
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.target.url = "http://localhost:9000".to_string();
        config.target.access_key = "ak".to_string();
        config.target.secret_key = "sk".to_string();
        config
    }

    #[test]
    fn test_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_both_unlimited() {
        let mut config = valid_config();
        config.workload.duration_secs = -1;
        config.workload.object_count = -1;
        let err = validate_config(&config).unwrap_err().to_string();
        assert!(err.contains("both be unlimited"));

        config.workload.object_count = 10;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_missing_credentials() {
        let mut config = valid_config();
        config.target.access_key.clear();
        assert!(validate_config(&config).is_err());

        let mut config = valid_config();
        config.target.secret_key.clear();
        assert!(validate_config(&config).is_err());

        let mut config = valid_config();
        config.target.url.clear();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_memory_target_needs_no_credentials() {
        let mut config = Config::default();
        config.target.url = "mem://".to_string();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_bad_url_scheme() {
        let mut config = valid_config();
        config.target.url = "localhost:9000".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_report_interval_out_of_range() {
        let mut config = valid_config();
        config.workload.report_interval = 1e20;
        let err = validate_config(&config).unwrap_err().to_string();
        assert!(err.contains("too large"), "{}", err);

        config.workload.report_interval = f64::INFINITY;
        assert!(validate_config(&config).is_err());

        config.workload.report_interval = 3600.0;
        assert!(validate_config(&config).is_ok());
        config.workload.report_interval = -1.0;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_zero_counts() {
        let mut config = valid_config();
        config.workload.threads = 0;
        assert!(validate_config(&config).is_err());

        let mut config = valid_config();
        config.workload.loops = 0;
        assert!(validate_config(&config).is_err());

        let mut config = valid_config();
        config.workload.bucket_count = 0;
        assert!(validate_config(&config).is_err());

        let mut config = valid_config();
        config.workload.max_keys = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_empty_modes() {
        let mut config = valid_config();
        config.workload.modes = "".parse().unwrap();
        assert!(validate_config(&config).is_err());
    }
}
