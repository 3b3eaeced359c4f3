// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::traits::{PhotoScraper, ScraperError};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// 抓取器注册表
///
/// 按来源名称查找抓取器，注册顺序即为导入时创建作业的顺序。
#[derive(Default, Clone)]
pub struct ScraperRegistry {
    scrapers: HashMap<String, Arc<dyn PhotoScraper>>,
    order: Vec<String>,
}

impl ScraperRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册抓取器，同名来源会被替换
    pub fn register(&mut self, scraper: Arc<dyn PhotoScraper>) {
        let source = scraper.source().to_string();
        info!("Registering photo scraper for source {}", source);
        if self.scrapers.insert(source.clone(), scraper).is_none() {
            self.order.push(source);
        }
    }

    /// 链式注册
    pub fn with(mut self, scraper: Arc<dyn PhotoScraper>) -> Self {
        self.register(scraper);
        self
    }

    /// 获取来源对应的抓取器
    ///
    /// # 返回值
    ///
    /// * `Ok(Arc<dyn PhotoScraper>)` - 抓取器
    /// * `Err(ScraperError::UnknownSource)` - 来源未注册
    pub fn get(&self, source: &str) -> Result<Arc<dyn PhotoScraper>, ScraperError> {
        self.scrapers
            .get(source)
            .cloned()
            .ok_or_else(|| ScraperError::UnknownSource(source.to_string()))
    }

    /// 已注册的来源名称
    pub fn sources(&self) -> &[String] {
        &self.order
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
