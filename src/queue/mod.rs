// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 队列模块
///
/// 作业队列与自调度的分发器
pub mod dispatcher;
pub mod job_queue;
