// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::photo::ScrapedPhoto;
use async_trait::async_trait;
use std::collections::BTreeSet;
use thiserror::Error;

/// 抓取器错误类型
#[derive(Error, Debug)]
pub enum ScraperError {
    /// 来源主动拒绝访问（例如反爬封锁），自动重试无意义
    #[error("Blocked by source: {0}")]
    PermanentBlock(String),
    /// 请求失败
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// 没有为该来源注册抓取器
    #[error("Unknown source: {0}")]
    UnknownSource(String),
    /// 其他错误
    #[error("Scrape failed: {0}")]
    Failed(String),
}

impl ScraperError {
    /// 判断错误是否为永久封锁
    ///
    /// 只有永久封锁会让作业进入 blocked 状态，其余错误都按暂时性失败退避重试。
    pub fn is_permanent(&self) -> bool {
        matches!(self, ScraperError::PermanentBlock(_))
    }
}

/// 照片抓取器特质
///
/// 每个照片来源一个实现。站点相关的页面解析逻辑不在本 crate 内。
#[async_trait]
pub trait PhotoScraper: Send + Sync {
    /// 来源标识
    fn source(&self) -> &str;

    /// 抓取指定注册号的照片
    ///
    /// # 参数
    ///
    /// * `registration` - 飞机注册号
    /// * `airport_hints` - 可选的机场代码集合，供来源侧预过滤
    ///
    /// # 返回值
    ///
    /// * `Ok(Vec<ScrapedPhoto>)` - 抓取到的照片
    /// * `Err(ScraperError)` - 永久封锁或其他失败
    async fn scrape(
        &self,
        registration: &str,
        airport_hints: Option<&BTreeSet<String>>,
    ) -> Result<Vec<ScrapedPhoto>, ScraperError>;
}
