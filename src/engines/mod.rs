// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 照片抓取器模块
///
/// 定义抓取器接口、按来源的注册表以及基于 HTTP 的抓取服务适配器
pub mod http_scraper;
pub mod registry;
pub mod traits;
