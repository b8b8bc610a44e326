//! PlanMod 配置
//!
//! 各阶段的参数结构定义在使用它们的 crate 中，这里只负责汇总和加载。
//! 查找顺序：环境变量 `PLANMOD_CONFIG` → `./config/default.toml` → 内置默认值。

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use planmod_core::relationships::RelationshipOptions;
use planmod_file::WriterOptions;
use planmod_transform::ModifierOptions;
use planmod_vision::VectorizationOptions;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 指定配置文件路径的环境变量
pub const CONFIG_ENV: &str = "PLANMOD_CONFIG";

/// 应用配置的根结构
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub vectorization: VectorizationOptions,
    pub relationships: RelationshipOptions,
    pub writer: WriterOptions,
    pub substitution: ModifierOptions,
    pub catalog: CatalogConfig,
}

impl AppConfig {
    /// 从显式路径加载配置
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 自动发现配置文件；都不存在时返回默认配置
    pub fn discover() -> Result<Self, ConfigError> {
        let cwd = env::current_dir().map_err(|source| ConfigError::Context {
            message: "Failed to read current directory".to_string(),
            source,
        })?;
        Self::discover_in(env::var_os(CONFIG_ENV).map(PathBuf::from), &cwd)
    }

    /// `explicit` 为环境变量给出的路径，必须存在
    pub fn discover_in(explicit: Option<PathBuf>, dir: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        let default_path = dir.join("config").join("default.toml");
        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// 日志配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace / debug / info / warn / error
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// 追加目录条目的 JSON 文件所在目录
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
}
