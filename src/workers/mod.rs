// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 作业处理器、共享作业队列的抓取工作者、兜底清扫器，
/// 以及管理它们生命周期的工作管理器
pub mod manager;
pub mod processor;
pub mod scrape_worker;
pub mod sweeper;
pub mod worker;

pub use worker::Worker;
