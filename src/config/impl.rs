use config::{Config, ConfigError, Environment, File};
use std::sync::OnceLock;

use super::AppConfig;

static APP_CONFIG: OnceLock<AppConfig> = OnceLock::new();

impl AppConfig {
    /// 加载配置
    ///
    /// 优先级（低 → 高）：`config.toml` → `config.{APP_ENV}.toml` → `LMS_*` 环境变量 → 常用环境变量
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("APP_ENV").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(File::with_name(&format!("config.{environment}")).required(false))
            .add_source(
                Environment::with_prefix("LMS")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override("app.environment", environment)?
            .set_override_option("app.log_level", std::env::var("RUST_LOG").ok())?
            .set_override_option("server.host", std::env::var("SERVER_HOST").ok())?
            .set_override_option("server.port", std::env::var("SERVER_PORT").ok())?
            .set_override_option("server.unix_socket_path", std::env::var("UNIX_SOCKET").ok())?
            .set_override_option("server.workers", std::env::var("CPU_COUNT").ok())?
            .set_override_option("jwt.secret", std::env::var("JWT_SECRET").ok())?
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("cache.type", std::env::var("CACHE_TYPE").ok())?
            .set_override_option("cache.default_ttl", std::env::var("CACHE_TTL").ok())?
            .set_override_option(
                "submissions.statistics_ttl",
                std::env::var("STATS_CACHE_TTL").ok(),
            )?
            .set_override_option("cache.redis.url", std::env::var("REDIS_URL").ok())?
            .set_override_option(
                "cache.redis.key_prefix",
                std::env::var("REDIS_KEY_PREFIX").ok(),
            )?;

        let mut app_config: AppConfig = builder.build()?.try_deserialize()?;

        // 处理工作线程数
        if app_config.server.workers == 0 {
            app_config.server.workers = num_cpus::get().min(app_config.server.max_workers);
        }

        app_config.validate()?;
        Ok(app_config)
    }

    /// 启动前的配置校验
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.is_empty() {
            return Err(ConfigError::Message(
                "jwt.secret is empty, set JWT_SECRET".to_string(),
            ));
        }
        if self.is_production() && self.jwt.secret.len() < 32 {
            return Err(ConfigError::Message(
                "jwt.secret must be at least 32 bytes in production".to_string(),
            ));
        }
        if self.database.pool_size == 0 {
            return Err(ConfigError::Message(
                "database.pool_size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// 获取全局配置实例
    pub fn get() -> &'static AppConfig {
        APP_CONFIG.get_or_init(|| {
            Self::load().unwrap_or_else(|e| {
                eprintln!("Failed to load configuration: {e}");
                std::process::exit(1);
            })
        })
    }

    /// 初始化配置 (在应用启动时调用)
    pub fn init() -> Result<(), ConfigError> {
        let config = Self::load()?;
        APP_CONFIG
            .set(config)
            .map_err(|_| ConfigError::Message("Configuration already initialized".to_string()))?;
        Ok(())
    }

    /// 检查是否为生产环境
    pub fn is_production(&self) -> bool {
        self.app.environment == "production"
    }

    /// 检查是否为开发环境
    pub fn is_development(&self) -> bool {
        self.app.environment == "development"
    }

    /// 获取服务器绑定地址
    pub fn server_bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// 获取 Unix 套接字路径 (如果配置了)
    #[cfg(unix)]
    pub fn unix_socket_path(&self) -> Option<&str> {
        if self.server.unix_socket_path.is_empty() {
            None
        } else {
            Some(&self.server.unix_socket_path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> AppConfig {
        let raw = r#"
            [app]
            system_name = "LMS"
            environment = "development"
            log_level = "info"

            [server]
            host = "127.0.0.1"
            port = 8080
            unix_socket_path = ""
            workers = 2
            max_workers = 8
            timeouts = { client_request = 5000, client_disconnect = 1000, keep_alive = 75 }
            limits = { max_payload_size = 1048576 }

            [jwt]
            secret = "test-secret"

            [database]
            url = "lms.db"
            pool_size = 4
            timeout = 10

            [cache]
            type = "moka"
            default_ttl = 60
            redis = { url = "redis://127.0.0.1/", key_prefix = "lms:", pool_size = 4 }
            memory = { max_capacity = 1000 }

            [cors]
            allowed_origins = ["*"]
            allowed_methods = ["GET"]
            allowed_headers = ["*"]
            max_age = 3600
        "#;
        Config::builder()
            .add_source(File::from_str(raw, config::FileFormat::Toml))
            .build()
            .and_then(|c| c.try_deserialize())
            .expect("sample config should deserialize")
    }

    #[test]
    fn test_bind_address() {
        let config = sample_config();
        assert_eq!(config.server_bind_address(), "127.0.0.1:8080");
        assert!(config.is_development());
        assert_eq!(config.jwt.leeway, 0);
    }

    #[test]
    fn test_validate_rejects_short_secret_in_production() {
        let mut config = sample_config();
        assert!(config.validate().is_ok());

        config.app.environment = "production".to_string();
        assert!(config.validate().is_err());

        config.jwt.secret = "x".repeat(32);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_secret() {
        let mut config = sample_config();
        config.jwt.secret.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sections_default_when_omitted() {
        let config: AppConfig = Config::builder()
            .add_source(File::from_str(
                "[jwt]\nsecret = \"s\"",
                config::FileFormat::Toml,
            ))
            .build()
            .and_then(|c| c.try_deserialize())
            .expect("minimal config should deserialize");

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.cache.cache_type, "moka");
        assert_eq!(config.submissions.statistics_ttl, 60);
        assert!(config.cors.allowed_origins.iter().any(|o| o == "*"));
        assert!(config.validate().is_ok());
    }
}
