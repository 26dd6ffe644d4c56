//! Application configuration module / 应用配置模块
//!
//! Manages application configuration loaded from config.json
//! Creates default config file on first run / 首次运行时创建默认配置文件

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::drivers::s3::S3Config;

/// Longest presign window S3 accepts (7 days) / S3 预签名最长有效期
const MAX_LINK_TTL_SECS: u64 = 7 * 24 * 3600;

/// Application configuration / 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration / 服务器配置
    #[serde(default)]
    pub server: ServerConfig,
    /// Object store configuration / 对象存储配置
    #[serde(default)]
    pub storage: StorageConfig,
    /// Listing limits / 列表参数
    #[serde(default)]
    pub listing: ListingConfig,
    /// Download link cache / 下载链接缓存
    #[serde(default)]
    pub links: LinkConfig,
}

/// Server configuration / 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address / 服务器监听地址
    pub host: String,
    /// Server port / 服务器端口
    pub port: u16,
}

/// Storage configuration / 存储配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// `s3` or `memory` / 驱动类型
    pub driver: String,
    #[serde(default)]
    pub s3: S3Config,
}

/// Listing configuration / 列表配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    /// Default page size for single page listings / 默认分页大小
    pub page_size: usize,
    /// Cap on caller supplied page sizes / 分页大小上限
    pub max_page_size: usize,
    /// Page size used while walking subtrees / 递归列举每页大小
    pub recursive_page_size: usize,
    /// Folder nesting ceiling / 最大递归深度
    pub max_depth: usize,
    /// Treat zero-byte keys as folders / 零字节对象视为目录
    pub zero_size_folders: bool,
    /// Deadline for recursive listings / 递归列举超时（秒）
    pub request_timeout_secs: u64,
}

/// Link cache configuration / 链接缓存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Presigned URL lifetime / 链接有效期（秒）
    pub ttl_secs: u64,
    /// Expired entry sweep period / 清理间隔（秒）
    pub sweep_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            driver: "s3".to_string(),
            s3: S3Config::default(),
        }
    }
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            max_page_size: 1000,
            recursive_page_size: 100,
            max_depth: 32,
            zero_size_folders: false,
            request_timeout_secs: 60,
        }
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 900,
            sweep_interval_secs: 300,
        }
    }
}

impl AppConfig {
    /// Get the server bind address / 获取服务器绑定地址
    pub fn get_bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Take S3 credentials from the environment when set / 使用环境变量中的凭证
    pub fn apply_env_overrides(&mut self) {
        self.apply_credentials(
            std::env::var("AWS_ACCESS_KEY_ID").ok(),
            std::env::var("AWS_SECRET_ACCESS_KEY").ok(),
        );
    }

    fn apply_credentials(&mut self, access_key: Option<String>, secret_key: Option<String>) {
        if let Some(key) = access_key.filter(|v| !v.is_empty()) {
            self.storage.s3.access_key_id = key;
        }
        if let Some(secret) = secret_key.filter(|v| !v.is_empty()) {
            self.storage.s3.secret_access_key = secret;
        }
    }

    /// Check limits before anything is started / 校验配置
    pub fn validate(&self) -> Result<(), String> {
        let listing = &self.listing;
        if listing.page_size == 0 || listing.max_page_size == 0 || listing.recursive_page_size == 0 {
            return Err("listing page sizes must be at least 1".to_string());
        }
        if listing.max_page_size > 1000 {
            return Err(format!("listing.max_page_size {} exceeds 1000", listing.max_page_size));
        }
        if listing.page_size > listing.max_page_size {
            return Err(format!(
                "listing.page_size {} exceeds max_page_size {}",
                listing.page_size, listing.max_page_size
            ));
        }
        if listing.max_depth == 0 {
            return Err("listing.max_depth must be at least 1".to_string());
        }
        if listing.request_timeout_secs == 0 {
            return Err("listing.request_timeout_secs must be at least 1".to_string());
        }

        if self.links.ttl_secs == 0 || self.links.sweep_interval_secs == 0 {
            return Err("links.ttl_secs and links.sweep_interval_secs must be at least 1".to_string());
        }
        if self.links.ttl_secs > MAX_LINK_TTL_SECS {
            return Err(format!("links.ttl_secs {} exceeds 7 days", self.links.ttl_secs));
        }

        match self.storage.driver.as_str() {
            "s3" if self.storage.s3.bucket.trim().is_empty() => {
                Err("storage.s3.bucket is required for the s3 driver".to_string())
            }
            "s3" | "memory" => Ok(()),
            other => Err(format!("unknown storage driver: {}", other)),
        }
    }
}

/// Get the config file path / 获取配置文件路径
///
/// `CONFIG_PATH` wins over `./config.json`.
fn get_config_path() -> PathBuf {
    if let Ok(path) = std::env::var("CONFIG_PATH") {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("config.json")
}

/// Load configuration from file, or create default if not exists / 加载配置文件，不存在则创建默认配置
pub fn load_config() -> Result<AppConfig, String> {
    let mut config = load_config_from(&get_config_path())?;
    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}

pub fn load_config_from(config_path: &Path) -> Result<AppConfig, String> {
    if config_path.exists() {
        // Load existing config / 加载现有配置
        let content = std::fs::read_to_string(config_path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let config: AppConfig = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse config file: {}", e))?;

        tracing::info!("Loaded configuration from {:?}", config_path);
        Ok(config)
    } else {
        // Create default config / 创建默认配置
        let config = AppConfig::default();
        save_config_to(&config, config_path)?;
        tracing::info!("Created default configuration at {:?}", config_path);
        Ok(config)
    }
}

/// Save configuration to file / 保存配置到文件
fn save_config_to(config: &AppConfig, config_path: &Path) -> Result<(), String> {
    let content = serde_json::to_string_pretty(config)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;

    std::fs::write(config_path, content)
        .map_err(|e| format!("Failed to write config file: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_config() -> AppConfig {
        AppConfig {
            storage: StorageConfig {
                driver: "memory".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = load_config_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.listing.page_size, 10);
        assert_eq!(config.links.ttl_secs, 900);

        let again = load_config_from(&path).unwrap();
        assert_eq!(again.storage.driver, "s3");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"storage":{"driver":"s3","s3":{"bucket":"files","endpoint":"http://localhost:9000","force_path_style":true}},"listing":{"max_depth":4}}"#,
        )
        .unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.storage.s3.bucket, "files");
        assert_eq!(config.storage.s3.region, "us-east-1");
        assert!(config.storage.s3.force_path_style);
        assert_eq!(config.listing.max_depth, 4);
        assert_eq!(config.listing.recursive_page_size, 100);
        assert_eq!(config.server.host, "0.0.0.0");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bad_json_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = load_config_from(&path).unwrap_err();
        assert!(err.starts_with("Failed to parse config file"));
    }

    #[test]
    fn test_validate() {
        assert!(memory_config().validate().is_ok());

        let err = AppConfig::default().validate().unwrap_err();
        assert!(err.contains("bucket"));

        let mut config = memory_config();
        config.listing.page_size = 2000;
        assert!(config.validate().is_err());

        let mut config = memory_config();
        config.listing.max_page_size = 5000;
        config.listing.page_size = 10;
        assert!(config.validate().is_err());

        let mut config = memory_config();
        config.links.ttl_secs = MAX_LINK_TTL_SECS + 1;
        assert!(config.validate().is_err());

        let mut config = memory_config();
        config.links.sweep_interval_secs = 0;
        assert!(config.validate().is_err());

        let mut config = memory_config();
        config.storage.driver = "ftp".to_string();
        assert!(config.validate().unwrap_err().contains("ftp"));
    }

    #[test]
    fn test_credentials_override() {
        let mut config = memory_config();
        config.storage.s3.access_key_id = "from-file".to_string();
        config.apply_credentials(Some(String::new()), Some("env-secret".to_string()));
        assert_eq!(config.storage.s3.access_key_id, "from-file");
        assert_eq!(config.storage.s3.secret_access_key, "env-secret");
    }
}
