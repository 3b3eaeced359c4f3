// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用用例模块
///
/// 航班导入与队列管理，负责协调领域对象完成管理操作
pub mod import_flights;
pub mod queue_admin;
