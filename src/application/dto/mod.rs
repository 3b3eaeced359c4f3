// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 数据传输对象模块
///
/// 定义管理接口的请求体，在 API 请求和领域模型之间转换数据
pub mod import_request;
