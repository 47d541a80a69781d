//! Loading task configurations from YAML or JSON files

use std::fs;
use std::path::Path;

use super::schema::TaskConfig;
use super::validate::validate_config;
use crate::error::{Error, Result};

/// Load and validate a task configuration
///
/// Files ending in `.json` are parsed as JSON, anything else as YAML.
///
/// # Example
///
/// ```no_run
/// use vendaval::config::load_config;
///
/// let config = load_config("task.yaml")?;
/// # Ok::<(), vendaval::Error>(())
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<TaskConfig> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        Error::config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let config = if is_json { parse_json(&content)? } else { parse_yaml(&content)? };
    tracing::debug!("Loaded config from {}", path.display());
    Ok(config)
}

/// Parse and validate a YAML task configuration
pub fn parse_yaml(content: &str) -> Result<TaskConfig> {
    let config: TaskConfig = serde_yaml::from_str(content)
        .map_err(|e| Error::config(format!("Failed to parse YAML config: {e}")))?;
    checked(config)
}

/// Parse and validate a JSON task configuration
pub fn parse_json(content: &str) -> Result<TaskConfig> {
    let config: TaskConfig = serde_json::from_str(content)
        .map_err(|e| Error::config(format!("Failed to parse JSON config: {e}")))?;
    checked(config)
}

fn checked(config: TaskConfig) -> Result<TaskConfig> {
    validate_config(&config).map_err(|e| Error::config(format!("Invalid config: {e}")))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::Resolvable;
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    #[test]
    fn test_load_yaml_config() {
        let yaml = r"
model:
  lr: 0.003
optimization:
  optimizer:
    name: SGD
    init_args: { lr: 0.1, momentum: 0.9 }
  max_steps: 1000
";
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let config = load_config(file.path()).unwrap();
        let opt = config.optimization.unwrap();
        assert_eq!(opt.optimizer.name.as_deref(), Some("SGD"));
        assert_eq!(opt.max_steps, Resolvable::Value(1000));
        assert!(opt.max_epochs.is_infer());
    }

    #[test]
    fn test_load_json_config() {
        let json = r#"{"model": {"lr": 0.01}, "optimization": {"max_epochs": "infer"}}"#;
        let mut file = Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.model.lr, 0.01);
        assert!(config.optimization.unwrap().max_epochs.is_infer());
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_config("/nonexistent/task.yaml").unwrap_err();
        assert!(err.is_config_error());
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_parse_invalid_yaml() {
        let err = parse_yaml("optimization: [not, a, mapping]").unwrap_err();
        assert!(err.to_string().contains("Failed to parse YAML config"));
    }

    #[test]
    fn test_parse_rejects_invalid_values() {
        let err = parse_yaml("trainer:\n  accumulate_grad_batches: 0\n").unwrap_err();
        assert!(err.to_string().contains("Invalid config"));
    }

    #[test]
    fn test_parse_rejects_negative_sentinel() {
        assert!(parse_yaml("optimization:\n  max_steps: -1\n").is_err());
    }
}
