// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 包含的服务：
/// - 协调存储接口（coordination）：跨进程共享的控制标志与限流窗口
/// - 照片匹配（photo_matcher）：确定性的航班照片评分
/// - 合理性过滤（plausibility）：按已知航班过滤抓取结果
/// - 队列控制（queue_control）：暂停、并发上限、间隔与重扫设置
/// - 限流器（rate_limiter）：按来源的滑动窗口限流
pub mod coordination;
pub mod photo_matcher;
pub mod plausibility;
pub mod queue_control;
pub mod rate_limiter;
