//! Logging configuration loaded from TOML

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use proven_logger::{Level, LogFormat};
use proven_logger_file::{
    DEFAULT_MAX_ARCHIVES, DEFAULT_MIN_DELAY, DEFAULT_SIZE_THRESHOLD, RotationPolicy,
};
use serde::Deserialize;
use serde::de::{self, Deserializer, Visitor};

use crate::error::ConfigError;

/// Default location of the log file, relative to the working directory.
pub const DEFAULT_LOG_PATH: &str = "logs/server.log";

/// Where and how the service writes its log.
///
/// Every key is optional:
///
/// ```toml
/// path = "logs/server.log"     # "" for console only
/// rotation-threshold = "20m"   # bytes, or with a k/m/g suffix; 0 disables
/// rotation-delay = 300         # seconds between rotations
/// max-archives = 7
/// level = "info"
/// format = "plain"             # or "json"
/// foreground = false           # console only, no file
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct LogConfig {
    /// Log file; `None` logs to the console only
    #[serde(deserialize_with = "deserialize_path")]
    pub path: Option<PathBuf>,

    /// Size in bytes past which the file is rotated; 0 disables rotation
    #[serde(deserialize_with = "deserialize_byte_size")]
    pub rotation_threshold: u64,

    /// Minimum time between two rotations
    #[serde(deserialize_with = "deserialize_seconds")]
    pub rotation_delay: Duration,

    /// Number of archives kept
    pub max_archives: usize,

    /// Records below this level are discarded
    pub level: Level,

    /// Output format for every sink
    pub format: LogFormat,

    /// Stay attached to the console and never write a file
    pub foreground: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            path: Some(PathBuf::from(DEFAULT_LOG_PATH)),
            rotation_threshold: DEFAULT_SIZE_THRESHOLD,
            rotation_delay: DEFAULT_MIN_DELAY,
            max_archives: DEFAULT_MAX_ARCHIVES,
            level: Level::Info,
            format: LogFormat::Plain,
            foreground: false,
        }
    }
}

impl LogConfig {
    /// Load and validate configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the file cannot be read, [`ConfigError::Parse`]
    /// if it is not valid TOML for this structure, [`ConfigError::Invalid`] if
    /// a value is out of bounds.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        contents.parse()
    }

    /// Check values that the types alone do not constrain.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_archives == 0 {
            return Err(ConfigError::Invalid(
                "max-archives must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// The file the service should write, if any.
    ///
    /// Foreground mode never writes a file.
    #[must_use]
    pub fn log_file(&self) -> Option<&Path> {
        if self.foreground {
            return None;
        }
        self.path.as_deref()
    }

    /// Rotation policy described by this configuration.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] if `max_archives` is 0.
    pub fn rotation_policy(&self) -> Result<RotationPolicy, ConfigError> {
        if self.rotation_threshold == 0 {
            return Ok(RotationPolicy::disabled());
        }
        RotationPolicy::new(self.rotation_threshold, self.rotation_delay, self.max_archives)
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

impl std::str::FromStr for LogConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }
}

/// Parse a byte count such as `1024`, `512k`, `20m` or `1g`.
///
/// Suffixes are binary multiples and case-insensitive; an optional trailing
/// `b` (`20mb`) is accepted.
///
/// # Errors
///
/// [`ConfigError::Invalid`] if the value is not a number with a known suffix
/// or overflows.
pub fn parse_byte_size(value: &str) -> Result<u64, ConfigError> {
    let invalid = || ConfigError::Invalid(format!("invalid byte size: {value:?}"));

    let trimmed = value.trim().to_ascii_lowercase();
    let unit_start = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (digits, unit) = trimmed.split_at(unit_start);
    if digits.is_empty() {
        return Err(invalid());
    }
    let unit = unit.trim();
    let multiplier: u64 = match unit.strip_suffix('b').unwrap_or(unit) {
        "" => 1,
        "k" => 1 << 10,
        "m" => 1 << 20,
        "g" => 1 << 30,
        _ => return Err(invalid()),
    };
    digits
        .parse::<u64>()
        .ok()
        .and_then(|n| n.checked_mul(multiplier))
        .ok_or_else(invalid)
}

fn deserialize_byte_size<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    struct ByteSizeVisitor;

    impl Visitor<'_> for ByteSizeVisitor {
        type Value = u64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a byte count such as 1048576 or \"20m\"")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<u64, E> {
            u64::try_from(v).map_err(|_| E::custom("byte size must not be negative"))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<u64, E> {
            Ok(v)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<u64, E> {
            parse_byte_size(v).map_err(E::custom)
        }
    }

    deserializer.deserialize_any(ByteSizeVisitor)
}

fn deserialize_seconds<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_secs)
}

fn deserialize_path<'de, D>(deserializer: D) -> Result<Option<PathBuf>, D::Error>
where
    D: Deserializer<'de>,
{
    let path = PathBuf::deserialize(deserializer)?;
    Ok((!path.as_os_str().is_empty()).then_some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_defaults() {
        let config: LogConfig = "".parse().unwrap();

        assert_eq!(config, LogConfig::default());
        assert_eq!(config.log_file(), Some(Path::new("logs/server.log")));
        assert_eq!(config.rotation_threshold, 20 * 1024 * 1024);
        assert_eq!(config.rotation_delay, Duration::from_secs(300));
        assert_eq!(config.max_archives, 7);
    }

    #[test]
    fn test_full_config() {
        let config: LogConfig = r#"
            path = "/var/log/app.log"
            rotation-threshold = "512k"
            rotation-delay = 60
            max-archives = 3
            level = "debug"
            format = "json"
        "#
        .parse()
        .unwrap();

        assert_eq!(config.path, Some(PathBuf::from("/var/log/app.log")));
        assert_eq!(config.rotation_threshold, 512 * 1024);
        assert_eq!(config.rotation_delay, Duration::from_secs(60));
        assert_eq!(config.max_archives, 3);
        assert_eq!(config.level, Level::Debug);
        assert_eq!(config.format, LogFormat::Json);
        assert!(!config.foreground);
    }

    #[test]
    fn test_empty_path_means_console_only() {
        let config: LogConfig = r#"path = """#.parse().unwrap();
        assert_eq!(config.log_file(), None);
    }

    #[test]
    fn test_foreground_has_no_log_file() {
        let config: LogConfig = "foreground = true".parse().unwrap();
        assert_eq!(config.path, Some(PathBuf::from(DEFAULT_LOG_PATH)));
        assert_eq!(config.log_file(), None);
    }

    #[test]
    fn test_zero_threshold_disables_rotation() {
        let config: LogConfig = "rotation-threshold = 0".parse().unwrap();
        assert!(!config.rotation_policy().unwrap().is_enabled());
    }

    #[test]
    fn test_zero_archives_is_invalid() {
        let err = "max-archives = 0".parse::<LogConfig>().unwrap_err();
        assert_matches!(err, ConfigError::Invalid(_));
    }

    #[test]
    fn test_bad_values_fail_to_parse() {
        assert_matches!(
            "rotation-threshold = \"lots\"".parse::<LogConfig>(),
            Err(ConfigError::Parse(_))
        );
        assert_matches!(
            "rotation-threshold = -5".parse::<LogConfig>(),
            Err(ConfigError::Parse(_))
        );
        assert_matches!(
            "level = \"loud\"".parse::<LogConfig>(),
            Err(ConfigError::Parse(_))
        );
        assert_matches!(
            "colour = true".parse::<LogConfig>(),
            Err(ConfigError::Parse(_))
        );
    }

    #[test]
    fn test_parse_byte_size() {
        assert_eq!(parse_byte_size("1024").unwrap(), 1024);
        assert_eq!(parse_byte_size("512k").unwrap(), 512 * 1024);
        assert_eq!(parse_byte_size("20M").unwrap(), 20 * 1024 * 1024);
        assert_eq!(parse_byte_size("20mb").unwrap(), 20 * 1024 * 1024);
        assert_eq!(parse_byte_size(" 1g ").unwrap(), 1024 * 1024 * 1024);
        assert!(parse_byte_size("").is_err());
        assert!(parse_byte_size("m").is_err());
        assert!(parse_byte_size("12t").is_err());
        assert_eq!(parse_byte_size("5b").unwrap(), 5);
        assert!(parse_byte_size("5bb").is_err());
        assert!(parse_byte_size("20mbbbb").is_err());
        assert!(parse_byte_size("99999999999999999999g").is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = LogConfig::load("/definitely/not/here.toml").unwrap_err();
        assert_matches!(err, ConfigError::Io { .. });
    }
}
