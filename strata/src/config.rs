use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "STRATA";

/// 指定配置文件路径的环境变量；设置后不再搜索默认位置
pub const CONFIG_PATH_ENV: &str = "STRATA_CONFIG";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub controller: ControllerConfig,
    pub events: EventsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 未设置 RUST_LOG 时使用的过滤级别
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// 启动时登记的扩展名称
    pub extensions: Vec<String>,
    /// 启动后是否触发一次栈元数据刷新
    pub refresh_on_start: bool,
    /// 刷新是否作为异步跟踪的操作执行
    pub async_refresh: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            extensions: Vec::new(),
            refresh_on_start: false,
            async_refresh: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    pub capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self { capacity: 64 }
    }
}

impl Config {
    /// 按 strata.toml、~/.strata/strata.toml、环境变量的顺序叠加配置
    pub fn load() -> Result<Self, config::ConfigError> {
        // 如果存在.env文件，先把它载入进程环境
        dotenv::dotenv().ok();

        let home_dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        let user_config = home_dir.join(".strata").join("strata.toml");

        let builder = config::Config::builder()
            .add_source(config::File::from(Path::new("strata.toml")).required(false))
            .add_source(config::File::from(user_config.as_path()).required(false))
            .add_source(environment());

        builder.build()?.try_deserialize()
    }

    /// 启动时使用的配置：设置了 STRATA_CONFIG 时只读该文件，否则按默认位置叠加
    pub fn discover() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Self::load_from(Path::new(&path)),
            None => Self::load(),
        }
    }

    /// 从指定文件加载配置，文件必须存在
    pub fn load_from(path: &Path) -> Result<Self, config::ConfigError> {
        Self::layered(path, environment())
    }

    fn layered(path: &Path, environment: config::Environment) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from(path).required(true))
            .add_source(environment)
            .build()?
            .try_deserialize()
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("controller.extensions")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn no_env() -> config::Environment {
        environment().source(Some(HashMap::new()))
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.logging.level, "info");
        assert!(config.controller.extensions.is_empty());
        assert!(!config.controller.refresh_on_start);
        assert!(config.controller.async_refresh);
        assert_eq!(config.events.capacity, 64);
    }

    #[test]
    fn test_load_from_file() {
        let file = write_config(
            r#"
[logging]
level = "debug"

[controller]
extensions = ["EXT-1.0", "EXT-2.0"]
refresh_on_start = true
"#,
        );

        let config = Config::layered(file.path(), no_env()).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.controller.extensions, vec!["EXT-1.0", "EXT-2.0"]);
        assert!(config.controller.refresh_on_start);
        // 未出现的段落使用默认值
        assert!(config.controller.async_refresh);
        assert_eq!(config.events.capacity, 64);
    }

    #[test]
    fn test_environment_overrides_file() {
        let file = write_config("[events]\ncapacity = 8\n");
        let env = environment().source(Some(HashMap::from([
            ("STRATA__EVENTS__CAPACITY".to_string(), "32".to_string()),
            ("STRATA__CONTROLLER__EXTENSIONS".to_string(), "EXT-A,EXT-B".to_string()),
            ("STRATA__CONTROLLER__ASYNC_REFRESH".to_string(), "false".to_string()),
        ])));

        let config = Config::layered(file.path(), env).unwrap();
        assert_eq!(config.events.capacity, 32);
        assert_eq!(config.controller.extensions, vec!["EXT-A", "EXT-B"]);
        assert!(!config.controller.async_refresh);
    }

    #[test]
    fn test_discover_uses_config_path_variable() {
        let file = write_config("[logging]\nlevel = \"trace\"\n\n[events]\ncapacity = 5\n");
        std::env::set_var(CONFIG_PATH_ENV, file.path());
        let config = Config::discover();
        std::env::remove_var(CONFIG_PATH_ENV);

        let config = config.unwrap();
        assert_eq!(config.logging.level, "trace");
        assert_eq!(config.events.capacity, 5);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::layered(&dir.path().join("absent.toml"), no_env());
        assert!(result.is_err());
    }
}
