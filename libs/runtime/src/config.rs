use anyhow::{bail, Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Main application configuration with strongly-typed global sections
/// and a flexible per-module configuration bag.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Core server configuration.
    pub server: ServerConfig,
    /// Logging configuration (optional, uses defaults if None).
    pub logging: Option<LoggingConfig>,
    /// Per-module configuration bag: module_name → arbitrary JSON/YAML value.
    #[serde(default)]
    pub modules: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Base directory for relative paths (log files). Empty means the working directory.
    #[serde(default)]
    pub home_dir: String,
    pub host: String,
    pub port: u16,
    /// Per-request timeout in seconds; 0 disables it.
    #[serde(default)]
    pub timeout_sec: u64,
}

/// Logging configuration - maps subsystem names to their logging settings.
/// Key "default" is the catch-all for logs that don't match explicit subsystems.
pub type LoggingConfig = HashMap<String, Section>;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Section {
    pub console_level: String, // "info", "debug", "error", "off"
    #[serde(default)]
    pub file: String, // "logs/bridge.log"; empty disables the file sink
    #[serde(default)]
    pub file_level: String,
    #[serde(default)]
    pub max_backups: Option<usize>, // How many rotated files to keep
    #[serde(default)]
    pub max_size_mb: Option<u64>, // Max size of the file in MB
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            home_dir: String::new(),
            host: "0.0.0.0".to_string(),
            port: 9000,
            timeout_sec: 0,
        }
    }
}

/// Create a default logging configuration.
pub fn default_logging_config() -> LoggingConfig {
    let mut logging = HashMap::new();
    logging.insert(
        "default".to_string(),
        Section {
            console_level: "info".to_string(),
            file: String::new(),
            file_level: "debug".to_string(),
            max_backups: Some(3),
            max_size_mb: Some(100),
        },
    );
    logging
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            logging: Some(default_logging_config()),
            modules: HashMap::new(),
        }
    }
}

/// Plain environment variables honored for compatibility with container setups
/// that predate the `APP__` scheme.
const PLAIN_ENV_KEYS: &[&str] = &["REDIS_URL", "PORT"];

fn plain_env() -> Env {
    Env::raw().only(PLAIN_ENV_KEYS).map(|key| {
        if key == "PORT" {
            "server.port".into()
        } else {
            "modules.event_bridge.redis_url".into()
        }
    })
}

impl AppConfig {
    /// Load configuration with layered loading:
    /// defaults → YAML file → `APP__*` environment → plain `REDIS_URL`/`PORT`.
    pub fn load_layered(config_path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(AppConfig::default()));

        if let Some(path) = config_path {
            if !path.is_file() {
                bail!("Config file not found: {}", path.display());
            }
            figment = figment.merge(Yaml::file(path));
        }

        // Example: APP__SERVER__PORT=9100 maps to server.port
        let figment = figment
            .merge(Env::prefixed("APP__").split("__"))
            .merge(plain_env());

        figment
            .extract()
            .with_context(|| "Failed to extract config from figment".to_string())
    }

    /// Serialize configuration to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize config to YAML")
    }

    /// Apply overrides from command line arguments.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(port) = args.port {
            self.server.port = port;
        }

        // Set logging level based on verbose flags for "default" section.
        let logging = self.logging.get_or_insert_with(default_logging_config);
        if let Some(default_section) = logging.get_mut("default") {
            default_section.console_level = match args.verbose {
                0 => default_section.console_level.clone(), // keep
                1 => "debug".to_string(),
                _ => "trace".to_string(),
            };
        }
    }

    /// Typed view of one module's section; a missing section yields `T::default()`.
    pub fn module_config<T>(&self, module_name: &str) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        match self.modules.get(module_name) {
            Some(raw) => serde_json::from_value(raw.clone())
                .with_context(|| format!("Invalid configuration for module '{module_name}'")),
            None => Ok(T::default()),
        }
    }

    /// Base directory for resolving relative paths.
    pub fn home_dir(&self) -> PathBuf {
        if self.server.home_dir.trim().is_empty() {
            std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
        } else {
            PathBuf::from(&self.server.home_dir)
        }
    }

    /// Listen address in `host:port` form.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Command line arguments structure.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config: Option<String>,
    pub port: Option<u16>,
    pub print_config: bool,
    pub verbose: u8,
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct ProbeModule {
        #[serde(default)]
        redis_url: String,
        #[serde(default)]
        retries: u32,
    }

    #[test]
    fn test_default_config_structure() {
        let config = AppConfig::default();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.home_dir, "");
        assert_eq!(config.server.timeout_sec, 0);

        let logging = config.logging.as_ref().unwrap();
        let default_section = &logging["default"];
        assert_eq!(default_section.console_level, "info");
        assert!(default_section.file.is_empty());

        assert!(config.modules.is_empty());
        assert_eq!(config.bind_addr(), "0.0.0.0:9000");
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        Jail::expect_with(|_jail| {
            let config = AppConfig::load_layered(None).map_err(|e| e.to_string())?;
            assert_eq!(config.server.port, 9000);
            assert!(config.modules.is_empty());
            Ok(())
        });
    }

    #[test]
    fn test_yaml_file_layer() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "bridge.yaml",
                r#"
server:
  host: "127.0.0.1"
  port: 9100
  timeout_sec: 15

logging:
  default:
    console_level: debug

modules:
  event_bridge:
    redis_url: "redis://cache:6379/2"
"#,
            )?;

            let config = AppConfig::load_layered(Some(Path::new("bridge.yaml")))
                .map_err(|e| e.to_string())?;

            assert_eq!(config.server.host, "127.0.0.1");
            assert_eq!(config.server.port, 9100);
            assert_eq!(config.server.timeout_sec, 15);

            // merged over the defaults, so untouched keys survive
            let def = &config.logging.as_ref().unwrap()["default"];
            assert_eq!(def.console_level, "debug");
            assert_eq!(def.file_level, "debug");

            let module: ProbeModule = config
                .module_config("event_bridge")
                .map_err(|e| e.to_string())?;
            assert_eq!(module.redis_url, "redis://cache:6379/2");
            Ok(())
        });
    }

    #[test]
    fn test_prefixed_env_overrides_yaml() {
        Jail::expect_with(|jail| {
            jail.create_file("bridge.yaml", "server:\n  host: \"127.0.0.1\"\n  port: 9100\n")?;
            jail.set_env("APP__SERVER__PORT", "9200");
            jail.set_env("APP__MODULES__EVENT_BRIDGE__REDIS_URL", "redis://env:6379/0");

            let config = AppConfig::load_layered(Some(Path::new("bridge.yaml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config.server.host, "127.0.0.1");
            assert_eq!(config.server.port, 9200);

            let module: ProbeModule = config
                .module_config("event_bridge")
                .map_err(|e| e.to_string())?;
            assert_eq!(module.redis_url, "redis://env:6379/0");
            Ok(())
        });
    }

    #[test]
    fn test_plain_env_vars_are_honored() {
        Jail::expect_with(|jail| {
            jail.set_env("APP__SERVER__PORT", "9200");
            jail.set_env("PORT", "9300");
            jail.set_env("REDIS_URL", "redis://plain:6379/1");

            let config = AppConfig::load_layered(None).map_err(|e| e.to_string())?;
            assert_eq!(config.server.port, 9300);

            let module: ProbeModule = config
                .module_config("event_bridge")
                .map_err(|e| e.to_string())?;
            assert_eq!(module.redis_url, "redis://plain:6379/1");
            Ok(())
        });
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        Jail::expect_with(|_jail| {
            let err = AppConfig::load_layered(Some(Path::new("nope.yaml"))).unwrap_err();
            assert!(err.to_string().contains("nope.yaml"));
            Ok(())
        });
    }

    #[test]
    fn test_unknown_server_key_is_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("bad.yaml", "server:\n  host: x\n  port: 1\n  bogus: 1\n")?;
            assert!(AppConfig::load_layered(Some(Path::new("bad.yaml"))).is_err());
            Ok(())
        });
    }

    #[test]
    fn test_module_config_defaults_and_errors() {
        let mut config = AppConfig::default();
        let absent: ProbeModule = config.module_config("event_bridge").unwrap();
        assert_eq!(absent, ProbeModule::default());

        config.modules.insert(
            "event_bridge".into(),
            serde_json::json!({ "retries": "many" }),
        );
        let err = config.module_config::<ProbeModule>("event_bridge").unwrap_err();
        assert!(err.to_string().contains("event_bridge"));
    }

    #[test]
    fn test_cli_verbose_levels_matrix() {
        for (verbose_level, expected_log_level) in [
            (0, "info"), // unchanged from default
            (1, "debug"),
            (2, "trace"),
            (3, "trace"), // cap at trace
        ] {
            let mut config = AppConfig::default();
            let args = CliArgs {
                port: Some(3000),
                verbose: verbose_level,
                ..Default::default()
            };

            config.apply_cli_overrides(&args);

            assert_eq!(config.server.port, 3000);
            let default_section = &config.logging.as_ref().unwrap()["default"];
            assert_eq!(default_section.console_level, expected_log_level);
        }
    }

    #[test]
    fn test_home_dir_falls_back_to_cwd() {
        let mut config = AppConfig::default();
        assert!(config.home_dir().is_absolute());

        let tmp = tempfile::tempdir().unwrap();
        config.server.home_dir = tmp.path().to_string_lossy().to_string();
        assert_eq!(config.home_dir(), tmp.path());
    }

    #[test]
    fn test_to_yaml_roundtrip_basic() {
        let config = AppConfig::default();
        let yaml = config.to_yaml().unwrap();
        assert!(yaml.contains("server:"));
        assert!(yaml.contains("logging:"));

        let roundtrip: AppConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(roundtrip.server.port, config.server.port);
    }
}
