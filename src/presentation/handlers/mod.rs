// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// HTTP请求处理器模块
///
/// 管理接口各端点的处理逻辑
pub mod import_handler;
pub mod queue_handler;
