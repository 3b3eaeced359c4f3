// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::queue::job_queue::JobReceiver;
use crate::workers::processor::ScrapeJobProcessor;
use crate::workers::scrape_worker::ScrapeWorker;
use crate::workers::sweeper::Sweeper;
use crate::workers::worker::Worker;
use std::sync::Arc;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// 工作管理器
pub struct WorkerManager {
    receiver: JobReceiver,
    processor: Arc<ScrapeJobProcessor>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerManager {
    pub fn new(receiver: JobReceiver, processor: Arc<ScrapeJobProcessor>) -> Self {
        Self {
            receiver,
            processor,
            handles: Vec::new(),
        }
    }

    /// 启动工作进程
    ///
    /// 创建并启动指定数量的工作进程
    ///
    /// # 参数
    ///
    /// * `count` - 要启动的工作进程数量
    pub fn start_workers(&mut self, count: usize) {
        for index in 0..count {
            let worker = ScrapeWorker::new(index, self.receiver.clone(), self.processor.clone());
            let handle = tokio::spawn(async move {
                if let Err(e) = worker.run().await {
                    error!("{} exited with error: {}", worker.name(), e);
                }
            });
            self.handles.push(handle);
        }
        info!("Started {} scrape workers", count);
    }

    /// 在后台启动清扫器
    pub fn start_sweeper(&mut self, sweeper: Sweeper) {
        self.handles.push(sweeper.start());
    }

    /// 已启动的后台任务数量
    pub fn running(&self) -> usize {
        self.handles.iter().filter(|h| !h.is_finished()).count()
    }

    /// 中止全部后台任务
    ///
    /// 正在执行的作业会留在 running 状态，由下次启动恢复或清扫器处理。
    pub fn shutdown(&mut self) {
        info!("Shutting down workers...");
        for handle in self.handles.drain(..) {
            handle.abort();
        }
        info!("Workers shut down successfully");
    }

    /// 等待关闭信号并关闭工作进程
    pub async fn wait_for_shutdown(&mut self) {
        match signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received"),
            Err(err) => error!("Unable to listen for shutdown signal: {}", err),
        }
        self.shutdown();
    }
}
