use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Recorded on every crawl run so a resumed crawl can be traced back to the
/// configuration it ran with.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    const VALID_CONFIG: &str = r#"
seeds = ["https://example.com/", "http://example.org/start"]

[crawler]
max-concurrent-extractions = 8
max-concurrent-per-host = 1
min-delay-ms = 200
max-delay-ms = 400
max-pages = 50

[user-agent]
crawler-name = "TestCrawler"
crawler-version = "1.0"
contact-url = "https://example.com/about"
contact-email = "admin@example.com"

[storage]
database-path = "./crawl.db"

[search]
stopwords-path = "./stopwords.txt"
"#;

    #[test]
    fn test_load_valid_config() {
        let file = create_temp_config(VALID_CONFIG);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.seeds.len(), 2);
        assert_eq!(config.crawler.max_concurrent_extractions, 8);
        assert_eq!(config.crawler.max_concurrent_per_host, 1);
        assert_eq!(config.crawler.min_delay_ms, 200);
        assert_eq!(config.crawler.max_pages, Some(50));
        assert_eq!(config.user_agent.crawler_name, "TestCrawler");
        assert_eq!(config.storage.database_path, "./crawl.db");
        assert_eq!(config.search.stopwords_path, "./stopwords.txt");
    }

    #[test]
    fn test_crawler_section_defaults() {
        let config_content = r#"
[user-agent]
crawler-name = "TestCrawler"
crawler-version = "1.0"
contact-url = "https://example.com/about"
contact-email = "admin@example.com"

[storage]
database-path = "./crawl.db"

[search]
stopwords-path = "./stopwords.txt"
"#;
        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert!(config.seeds.is_empty());
        assert_eq!(config.crawler.max_concurrent_extractions, 4);
        assert_eq!(config.crawler.min_delay_ms, 1000);
        assert_eq!(config.crawler.max_delay_ms, 3000);
        assert_eq!(config.crawler.request_timeout_secs, 10);
        assert_eq!(config.crawler.max_pages, None);
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let content = VALID_CONFIG.replace("max-concurrent-extractions = 8", "max-concurrent-extractions = 0");
        let file = create_temp_config(&content);
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_load_config_with_bad_seed() {
        let content = VALID_CONFIG.replace("http://example.org/start", "mailto:someone@example.org");
        let file = create_temp_config(&content);
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        let hash1 = compute_config_hash(file1.path()).unwrap();
        let hash2 = compute_config_hash(file2.path()).unwrap();

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_load_config_with_hash() {
        let file = create_temp_config(VALID_CONFIG);
        let (config, hash) = load_config_with_hash(file.path()).unwrap();
        assert_eq!(config.seeds[0], "https://example.com/");
        assert_eq!(hash, compute_config_hash(file.path()).unwrap());
    }
}
