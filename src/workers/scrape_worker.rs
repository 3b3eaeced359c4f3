// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::queue::job_queue::JobReceiver;
use crate::utils::errors::WorkerError;
use crate::workers::processor::{ProcessOutcome, ScrapeJobProcessor};
use crate::workers::worker::Worker;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// 抓取工作者
///
/// 从共享接收端取作业 ID 并交给作业处理器，多个工作者共用一个接收端。
pub struct ScrapeWorker {
    name: String,
    receiver: JobReceiver,
    processor: Arc<ScrapeJobProcessor>,
}

impl ScrapeWorker {
    /// 创建新的抓取工作器实例
    pub fn new(index: usize, receiver: JobReceiver, processor: Arc<ScrapeJobProcessor>) -> Self {
        Self {
            name: format!("scrape-worker-{}", index),
            receiver,
            processor,
        }
    }
}

#[async_trait]
impl Worker for ScrapeWorker {
    async fn run(&self) -> Result<(), WorkerError> {
        info!("{} started", self.name);

        loop {
            let next = {
                let mut receiver = self.receiver.lock().await;
                receiver.recv().await
            };

            let Some(job_id) = next else {
                info!("{} stopping: job queue closed", self.name);
                return Ok(());
            };

            match self.processor.process(job_id).await {
                ProcessOutcome::Completed { photos_found } => {
                    debug!("{} finished job {} ({} photos)", self.name, job_id, photos_found)
                }
                outcome => debug!("{} finished job {}: {:?}", self.name, job_id, outcome),
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
