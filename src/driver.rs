//! セッションドライバー
//!
//! tokioタスクで一定間隔ごとに`advance(clock.now())`を呼ぶ本番用タイマー。
//! - 起動時にタイマーを登録し、`shutdown`またはDropで必ず解除する
//! - 解除後はセッションへの書き込みが一切発生しない

use crate::clock::Clock;
use crate::session::SharedSession;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// 周期駆動タスクのハンドル
#[derive(Debug)]
pub struct SessionDriver {
    cancel_sender: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<u64>>,
}

impl SessionDriver {
    /// ドライバーを起動（tokioランタイム内で呼ぶこと）
    ///
    /// `resolution`はadvanceを呼ぶ間隔で、各周期より細かくしておく。
    pub fn spawn(session: SharedSession, clock: Arc<dyn Clock>, resolution: Duration) -> Self {
        let (cancel_sender, cancel_receiver) = oneshot::channel();
        let handle = tokio::spawn(Self::run(session, clock, resolution, cancel_receiver));

        info!(
            resolution_ms = resolution.as_millis() as u64,
            "⏱️ [DRIVER] Started"
        );

        Self {
            cancel_sender: Some(cancel_sender),
            handle: Some(handle),
        }
    }

    async fn run(
        session: SharedSession,
        clock: Arc<dyn Clock>,
        resolution: Duration,
        mut cancel_receiver: oneshot::Receiver<()>,
    ) -> u64 {
        let mut interval = tokio::time::interval(resolution);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut iterations = 0u64;

        loop {
            tokio::select! {
                _ = &mut cancel_receiver => {
                    debug!(iterations = iterations, "⏱️ [DRIVER] Cancel received");
                    break;
                }
                _ = interval.tick() => {
                    let now = clock.now();
                    let added = session.lock().advance(now);
                    if added > 0 {
                        debug!(added = added, "⏱️ [DRIVER] Samples added");
                    }
                    iterations += 1;
                }
            }
        }

        iterations
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// タスクを停止して終了を待つ。戻り値はadvanceの実行回数
    pub async fn shutdown(mut self) -> u64 {
        if let Some(sender) = self.cancel_sender.take() {
            let _ = sender.send(());
        }

        let iterations = match self.handle.take() {
            Some(handle) => handle.await.unwrap_or(0),
            None => 0,
        };

        info!(iterations = iterations, "⏱️ [DRIVER] Stopped");
        iterations
    }
}

impl Drop for SessionDriver {
    fn drop(&mut self) {
        if let Some(sender) = self.cancel_sender.take() {
            let _ = sender.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!("⏱️ [DRIVER] Aborted on drop");
        }
    }
}
