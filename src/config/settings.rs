// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;

/// 应用程序配置设置
///
/// 运行期可调的控制项（暂停、并发上限、间隔、重扫周期）不在这里，
/// 它们保存在协调存储中，通过 `QueueControl` 读取。
#[derive(Debug, Deserialize)]
pub struct Settings {
    /// 数据库配置
    pub database: DatabaseSettings,
    /// Redis配置
    pub redis: RedisSettings,
    /// 服务器配置
    pub server: ServerSettings,
    /// 指标导出配置
    pub metrics: MetricsSettings,
    /// 调度配置
    pub scheduler: SchedulerSettings,
    /// 照片来源，按作业创建顺序排列
    #[serde(default = "default_sources")]
    pub sources: Vec<SourceSettings>,
}

/// 数据库配置设置
#[derive(Debug, Deserialize)]
pub struct DatabaseSettings {
    /// 数据库连接URL
    pub url: String,
    /// 最大连接数
    pub max_connections: Option<u32>,
    /// 最小连接数
    pub min_connections: Option<u32>,
    /// 连接超时时间（秒）
    pub connect_timeout: Option<u64>,
    /// 空闲连接超时时间（秒）
    pub idle_timeout: Option<u64>,
}

/// Redis配置设置
#[derive(Debug, Deserialize)]
pub struct RedisSettings {
    /// Redis连接URL，未配置时使用进程内协调存储
    pub url: Option<String>,
    /// 控制项键前缀
    pub key_prefix: String,
}

/// 服务器配置设置
#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    /// 服务器监听主机地址
    pub host: String,
    /// 服务器监听端口
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct MetricsSettings {
    pub enabled: bool,
    pub listen_address: SocketAddr,
}

/// 调度配置设置
#[derive(Debug, Deserialize)]
pub struct SchedulerSettings {
    /// 工作器数量，是并发上限的上界
    pub worker_count: usize,
    /// 清扫周期（秒）
    pub sweep_interval_seconds: u64,
    /// 执行记录超过该时长仍在运行即被回收（秒）
    pub stale_run_timeout_seconds: i64,
    /// 失败作业的重试间隔（秒）
    pub failure_backoff_seconds: i64,
    /// 限流窗口已满时的轮询间隔（毫秒）
    pub rate_limit_poll_millis: u64,
    /// 自调度补位是否按作业间隔错开
    pub dispatch_stagger: bool,
    /// 启动恢复等待数据库的尝试次数
    pub startup_attempts: u32,
    /// 启动恢复每次重试的间隔（秒）
    pub startup_retry_seconds: u64,
}

impl SchedulerSettings {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds)
    }

    pub fn stale_run_timeout(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.stale_run_timeout_seconds)
    }

    pub fn failure_backoff(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.failure_backoff_seconds)
    }

    pub fn rate_limit_poll(&self) -> Duration {
        Duration::from_millis(self.rate_limit_poll_millis)
    }

    pub fn startup_retry_delay(&self) -> Duration {
        Duration::from_secs(self.startup_retry_seconds)
    }
}

/// 单个照片来源的配置
#[derive(Debug, Clone, Deserialize)]
pub struct SourceSettings {
    /// 来源标识
    pub name: String,
    /// 抓取服务地址
    pub endpoint: String,
    /// 窗口内最多请求数
    pub max_requests: u32,
    /// 窗口长度（秒）
    pub window_seconds: u64,
    /// 单次抓取超时（秒）
    #[serde(default = "default_source_timeout")]
    pub timeout_seconds: u64,
}

fn default_source_timeout() -> u64 {
    60
}

fn default_sources() -> Vec<SourceSettings> {
    [
        ("jetphotos", 10),
        ("airlinersnet", 30),
        ("planespotters", 30),
        ("airplane_pictures", 30),
    ]
    .into_iter()
    .map(|(name, max_requests)| SourceSettings {
        name: name.to_string(),
        endpoint: format!("http://127.0.0.1:8090/scrape/{}", name),
        max_requests,
        window_seconds: 60,
        timeout_seconds: default_source_timeout(),
    })
    .collect()
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次加载内置默认值、`config/default.toml`、`config/{APP_ENVIRONMENT}.toml`
    /// 和 `TAILSPOTTER__` 前缀的环境变量，后者覆盖前者。
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        Self::builder()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("TAILSPOTTER")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("database.url", "sqlite://tailspotter.db?mode=rwc")?
            .set_default("database.max_connections", 20)?
            .set_default("database.min_connections", 2)?
            .set_default("database.connect_timeout", 10)?
            .set_default("database.idle_timeout", 300)?
            .set_default("redis.key_prefix", "ts:")?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("metrics.enabled", true)?
            .set_default("metrics.listen_address", "0.0.0.0:9000")?
            .set_default("scheduler.worker_count", 10)?
            .set_default("scheduler.sweep_interval_seconds", 300)?
            .set_default("scheduler.stale_run_timeout_seconds", 600)?
            .set_default("scheduler.failure_backoff_seconds", 3600)?
            .set_default("scheduler.rate_limit_poll_millis", 1000)?
            .set_default("scheduler.dispatch_stagger", true)?
            .set_default("scheduler.startup_attempts", 10)?
            .set_default("scheduler.startup_retry_seconds", 5)
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
