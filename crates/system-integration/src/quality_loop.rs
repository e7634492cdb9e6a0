//! Cross-thread quality polling
//!
//! Runs the quality tick on a tokio interval against a profiler the render
//! thread keeps appending to. Each tick holds the profiler lock only long
//! enough to compute statistics.

use crate::events::{ControllerEvent, EventBus};
use lod_profiler::PerformanceProfiler;
use lod_quality::{QualityController, TickDecision};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub struct QualityLoop {
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<u64>,
}

impl QualityLoop {
    pub fn spawn(
        profiler: Arc<Mutex<PerformanceProfiler>>,
        controller: Arc<Mutex<QualityController>>,
        bus: EventBus,
        period: Duration,
    ) -> Self {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut ticks = 0u64;

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = interval.tick() => {
                        let stats = profiler.lock().rolling_stats();
                        let decision = controller.lock().tick_with_stats(stats.as_ref());
                        if let TickDecision::Changed(event) = decision {
                            bus.publish(ControllerEvent::QualityChanged(event));
                        }
                        ticks += 1;
                    }
                }
            }

            log::debug!("Quality loop stopped after {} ticks", ticks);
            ticks
        });

        Self {
            shutdown_tx: Some(shutdown_tx),
            handle,
        }
    }

    /// Stop the loop and wait for it, returning how many ticks ran
    pub async fn shutdown(mut self) -> u64 {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        match (&mut self.handle).await {
            Ok(ticks) => ticks,
            Err(err) => {
                log::error!("Quality loop task failed: {}", err);
                0
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for QualityLoop {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
