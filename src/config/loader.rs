//! Settings loader with TOML parsing and environment variable overrides

use super::schema::ExfigSettings;
use super::secret::secret_string;
use crate::domain::errors::ExfigError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Environment variable holding the remote API token
pub const ACCESS_TOKEN_ENV: &str = "FIGMA_PERSONAL_TOKEN";

/// Loads settings from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into ExfigSettings
/// 4. Applies environment variable overrides (EXFIG_* prefix, FIGMA_PERSONAL_TOKEN)
/// 5. Validates the settings
///
/// # Errors
///
/// Returns `ExfigError::Configuration` if the file cannot be read or parsed,
/// a referenced variable is unset, or validation fails.
///
/// # Examples
///
/// ```no_run
/// use exfig::config::load_settings;
///
/// let settings = load_settings("exfig.toml").expect("Failed to load settings");
/// ```
pub fn load_settings(path: impl AsRef<Path>) -> Result<ExfigSettings> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ExfigError::Configuration(format!(
            "Settings file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        ExfigError::Configuration(format!(
            "Failed to read settings file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut settings: ExfigSettings = toml::from_str(&contents)?;

    apply_env_overrides(&mut settings);

    settings.validate().map_err(|e| {
        ExfigError::Configuration(format!("Settings validation failed: {}", e))
    })?;

    Ok(settings)
}

/// Loads settings from `path` when it exists, otherwise starts from defaults.
///
/// Environment overrides and validation apply in both cases.
pub fn load_settings_or_default(path: impl AsRef<Path>) -> Result<ExfigSettings> {
    let path = path.as_ref();
    if path.exists() {
        return load_settings(path);
    }

    tracing::debug!(path = %path.display(), "Settings file not found, using defaults");
    let mut settings = ExfigSettings::default();
    apply_env_overrides(&mut settings);
    settings.validate().map_err(|e| {
        ExfigError::Configuration(format!("Settings validation failed: {}", e))
    })?;
    Ok(settings)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched.
///
/// # Errors
///
/// Returns an error listing every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| ExfigError::Other(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{}}}", var_name);
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(ExfigError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using the EXFIG_* prefix
///
/// Variables follow the pattern EXFIG_<SECTION>_<KEY>, for example
/// EXFIG_BATCH_MAX_PARALLEL or EXFIG_CACHE_ENABLED. Unparseable values are
/// ignored.
fn apply_env_overrides(settings: &mut ExfigSettings) {
    // Batch overrides
    if let Some(val) = env_parse("EXFIG_BATCH_MAX_PARALLEL") {
        settings.batch.max_parallel = val;
    }
    if let Some(val) = env_parse("EXFIG_BATCH_FAIL_FAST") {
        settings.batch.fail_fast = val;
    }
    if let Some(val) = env_parse("EXFIG_BATCH_RESUME") {
        settings.batch.resume = val;
    }
    if let Ok(val) = std::env::var("EXFIG_BATCH_CHECKPOINT_PATH") {
        settings.batch.checkpoint_path = val;
    }

    // Rate limit overrides
    if let Some(val) = env_parse("EXFIG_RATE_LIMIT_REQUESTS_PER_MINUTE") {
        settings.rate_limit.requests_per_minute = val;
    }
    if let Some(val) = env_parse("EXFIG_RATE_LIMIT_BURST_CAPACITY") {
        settings.rate_limit.burst_capacity = val;
    }

    // Retry overrides
    if let Some(val) = env_parse("EXFIG_RETRY_MAX_RETRIES") {
        settings.retry.max_retries = val;
    }

    // Remote overrides
    if let Some(val) = env_parse("EXFIG_REMOTE_TIMEOUT_SECONDS") {
        settings.remote.timeout_seconds = val;
    }
    if let Ok(val) = std::env::var(ACCESS_TOKEN_ENV) {
        settings.remote.access_token = Some(secret_string(val));
    }

    // Cache overrides
    if let Some(val) = env_parse("EXFIG_CACHE_ENABLED") {
        settings.cache.enabled = val;
    }
    if let Some(val) = env_parse("EXFIG_CACHE_FORCE") {
        settings.cache.force = val;
    }
    if let Ok(val) = std::env::var("EXFIG_CACHE_PATH") {
        settings.cache.path = val;
    }
    if let Some(val) = env_parse("EXFIG_CACHE_EXPERIMENTAL_GRANULAR") {
        settings.cache.experimental_granular = val;
    }
    if let Some(val) = env_parse("EXFIG_CACHE_CONCURRENT_DOWNLOADS") {
        settings.cache.concurrent_downloads = val;
    }

    // Logging overrides
    if let Ok(val) = std::env::var("EXFIG_LOGGING_LOG_LEVEL") {
        settings.logging.log_level = val;
    }
    if let Some(val) = env_parse("EXFIG_LOGGING_LOCAL_ENABLED") {
        settings.logging.local_enabled = val;
    }
    if let Ok(val) = std::env::var("EXFIG_LOGGING_LOCAL_PATH") {
        settings.logging.local_path = val;
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|val| val.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_substitute_env_vars() {
        std::env::set_var("EXFIG_LOADER_TEST_VAR", "test_value");
        let input = "path = \"${EXFIG_LOADER_TEST_VAR}\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, "path = \"test_value\"\n");
        std::env::remove_var("EXFIG_LOADER_TEST_VAR");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        std::env::remove_var("EXFIG_LOADER_MISSING_VAR");
        let input = "path = \"${EXFIG_LOADER_MISSING_VAR}\"";
        let err = substitute_env_vars(input).unwrap_err();
        assert!(err.to_string().contains("EXFIG_LOADER_MISSING_VAR"));
    }

    #[test]
    fn test_substitute_skips_comments() {
        std::env::remove_var("EXFIG_LOADER_COMMENTED");
        let input = "# path = \"${EXFIG_LOADER_COMMENTED}\"";
        assert!(substitute_env_vars(input).is_ok());
    }

    #[test]
    fn test_load_settings_missing_file() {
        let result = load_settings("nonexistent-exfig.toml");
        assert!(matches!(result, Err(ExfigError::Configuration(_))));
    }

    #[test]
    fn test_load_settings_valid() {
        let toml_content = r#"
[batch]
max_parallel = 5
fail_fast = true

[rate_limit]
requests_per_minute = 20
burst_capacity = 5

[cache]
enabled = true
path = "build/cache.json"
dark_mode_suffix = "-dark"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let settings = load_settings(temp_file.path()).unwrap();
        assert_eq!(settings.batch.max_parallel, 5);
        assert!(settings.batch.fail_fast);
        assert_eq!(settings.rate_limit.requests_per_minute, 20);
        assert!(settings.cache.enabled);
        assert_eq!(settings.cache.dark_mode_suffix, "-dark");
        assert_eq!(settings.retry.max_retries, 4);
    }

    #[test]
    fn test_load_settings_invalid_values() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[rate_limit]\nrequests_per_minute = 0\n")
            .unwrap();
        temp_file.flush().unwrap();

        let err = load_settings(temp_file.path()).unwrap_err();
        assert!(err.to_string().contains("requests_per_minute"));
    }
}
