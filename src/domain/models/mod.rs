// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// - 航班（flight）：导入的飞行记录，是匹配的参照数据
/// - 抓取作业（scrape_job）：每个 (注册号, 来源) 一个作业及其执行记录
/// - 照片（photo）：抓取结果、候选照片与航班照片匹配
pub mod flight;
pub mod photo;
pub mod scrape_job;
