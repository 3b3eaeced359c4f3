// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库接口模块
///
/// 定义领域层的数据持久化抽象契约，具体实现由基础设施层提供。
///
/// - 航班仓库（flight_repository）
/// - 照片仓库（photo_repository）：候选照片与匹配
/// - 作业仓库（scrape_job_repository）：作业、执行记录与状态转换
pub mod flight_repository;
pub mod photo_repository;
pub mod scrape_job_repository;
