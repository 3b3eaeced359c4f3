// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 该模块包含系统的技术实现细节，负责与外部系统的交互。
///
/// 包含的子模块：
/// - 缓存（cache）：协调存储的 Redis 实现与进程内实现
/// - 数据库（database）：数据库连接和实体映射
/// - 可观测性（observability）：Prometheus 指标
/// - 仓库实现（repositories）：领域仓库接口的具体实现
///
/// 基础设施层依赖于领域层的抽象接口，领域层不感知具体技术。
pub mod cache;
pub mod database;
pub mod observability;
pub mod repositories;
