//! ポーリングスケジューラー
//!
//! 固定間隔でデバイス一覧を取得し、到達性チェック・遷移記録・ステータス更新を
//! 行ったあと、最新状態を再取得してスナップショットを配信する。
//!
//! サイクルは常に1つずつ実行される。実行中にティックが来た場合は
//! 完了まで待ってから次のサイクルを始める（重複実行しない）。

use crate::db::DeviceDirectory;
use crate::events::SnapshotHub;
use crate::health::aggregator::aggregate;
use crate::health::checker::{Liveness, LivenessChecker};
use crate::health::recorder::TransitionRecorder;
use crate::shutdown::ShutdownController;
use crate::types::device::{Device, DeviceStatus, Snapshot};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// 1サイクルの集計結果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// チェックしたデバイス数
    pub checked: usize,
    /// 到達可能だったデバイス数
    pub online: usize,
    /// 到達不能だったデバイス数
    pub offline: usize,
    /// 監査ログに記録した状態遷移数
    pub transitions: usize,
    /// ディレクトリ書き込みに失敗したデバイス数（一覧取得失敗も含む）
    pub failures: usize,
    /// サイクル中に削除されていたデバイス数
    pub skipped: usize,
}

enum DeviceOutcome {
    Updated {
        status: DeviceStatus,
        transitioned: bool,
    },
    Vanished {
        transitioned: bool,
    },
    Failed {
        status: DeviceStatus,
        transitioned: bool,
    },
}

/// ポーリングスケジューラー
#[derive(Clone)]
pub struct PollScheduler {
    directory: Arc<dyn DeviceDirectory>,
    checker: LivenessChecker,
    recorder: TransitionRecorder,
    hub: SnapshotHub,
    interval: Duration,
    concurrency: usize,
    cycle_lock: Arc<Mutex<()>>,
}

impl PollScheduler {
    /// 新しいスケジューラーを作成
    pub fn new(
        directory: Arc<dyn DeviceDirectory>,
        checker: LivenessChecker,
        hub: SnapshotHub,
        interval: Duration,
    ) -> Self {
        Self {
            recorder: TransitionRecorder::new(directory.clone()),
            directory,
            checker,
            hub,
            interval,
            concurrency: crate::config::DEFAULT_POLL_CONCURRENCY,
            cycle_lock: Arc::new(Mutex::new(())),
        }
    }

    /// 1サイクル内の最大並列チェック数を設定（最低1）
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// バックグラウンドでポーリングを開始
    ///
    /// 起動直後に現在の状態をスナップショットとして配信し、続けて
    /// 最初のサイクルを即座に実行する。シャットダウン要求後は、実行中の
    /// サイクルが完了してからループを抜ける。
    pub fn start(self, shutdown: ShutdownController) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.publish_current().await;

            let mut timer = interval(self.interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

            info!(
                interval_secs = self.interval.as_secs_f64(),
                concurrency = self.concurrency,
                "Poll scheduler started"
            );

            loop {
                tokio::select! {
                    _ = shutdown.wait() => break,
                    _ = timer.tick() => {
                        self.run_cycle().await;
                    }
                }
            }

            info!("Poll scheduler stopped");
        })
    }

    /// ポーリングを1サイクル実行する
    ///
    /// 並行して呼ばれた場合は前のサイクルの完了を待つ。
    pub async fn run_cycle(&self) -> CycleReport {
        let _guard = self.cycle_lock.lock().await;
        let started = Instant::now();
        let mut report = CycleReport::default();

        let devices = match self.directory.list_devices().await {
            Ok(devices) => devices,
            Err(e) => {
                warn!(error = %e, "Failed to list devices, skipping poll cycle");
                report.failures += 1;
                return report;
            }
        };

        let outcomes: Vec<DeviceOutcome> = stream::iter(devices)
            .map(|device| {
                let scheduler = self.clone();
                async move { scheduler.poll_device(device).await }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        for outcome in outcomes {
            report.checked += 1;
            let (status, transitioned) = match outcome {
                DeviceOutcome::Updated {
                    status,
                    transitioned,
                } => (Some(status), transitioned),
                DeviceOutcome::Failed {
                    status,
                    transitioned,
                } => {
                    report.failures += 1;
                    (Some(status), transitioned)
                }
                DeviceOutcome::Vanished { transitioned } => {
                    report.skipped += 1;
                    (None, transitioned)
                }
            };
            match status {
                Some(DeviceStatus::Online) => report.online += 1,
                Some(DeviceStatus::Offline) => report.offline += 1,
                None => {}
            }
            if transitioned {
                report.transitions += 1;
            }
        }

        self.publish_current().await;

        debug!(
            checked = report.checked,
            online = report.online,
            offline = report.offline,
            transitions = report.transitions,
            failures = report.failures,
            skipped = report.skipped,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Poll cycle completed"
        );

        report
    }

    /// ディレクトリの現在の状態を集計して配信する
    ///
    /// 一覧取得に失敗した場合は配信せず`None`を返す。
    pub async fn publish_current(&self) -> Option<Snapshot> {
        match self.directory.list_devices().await {
            Ok(devices) => {
                let snapshot = aggregate(devices);
                self.hub.publish(snapshot.clone());
                Some(snapshot)
            }
            Err(e) => {
                warn!(error = %e, "Failed to read devices for snapshot");
                None
            }
        }
    }

    async fn poll_device(&self, device: Device) -> DeviceOutcome {
        let liveness = self.checker.check(&device.address).await;
        let status = DeviceStatus::from_reachable(liveness.is_reachable());
        let now = Utc::now();

        if let Liveness::Unreachable { reason } = &liveness {
            debug!(
                device_id = device.id,
                device_name = %device.name,
                reason = %reason,
                "Device probe failed"
            );
        }

        let transitioned = self
            .recorder
            .record(device.id, device.status, status, now)
            .await;

        match self
            .directory
            .update_device_status(device.id, status, now)
            .await
        {
            Ok(true) => DeviceOutcome::Updated {
                status,
                transitioned,
            },
            Ok(false) => {
                debug!(
                    device_id = device.id,
                    "Device removed during poll cycle, skipping"
                );
                DeviceOutcome::Vanished { transitioned }
            }
            Err(e) => {
                warn!(
                    device_id = device.id,
                    device_name = %device.name,
                    error = %e,
                    "Failed to persist device status"
                );
                DeviceOutcome::Failed {
                    status,
                    transitioned,
                }
            }
        }
    }
}
