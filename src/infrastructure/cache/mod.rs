// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 协调存储模块
///
/// 提供协调存储的 Redis 实现和进程内实现
pub mod memory_store;
pub mod redis_client;
