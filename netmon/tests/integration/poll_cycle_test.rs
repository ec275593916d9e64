//! Integration tests: poll cycles against a SQLite directory

use crate::support::directory::{insert_device, test_pool};
use async_trait::async_trait;
use netmon::db::devices::get_device;
use netmon::db::status_logs::list_status_logs;
use netmon::events::SnapshotHub;
use netmon::health::{HttpProbe, Liveness, LivenessChecker, PollScheduler, Probe};
use netmon::shutdown::ShutdownController;
use netmon::types::DeviceStatus;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

/// 指定したホストだけ到達可能とみなすプローブ
struct StaticHosts(HashSet<String>);

#[async_trait]
impl Probe for StaticHosts {
    async fn probe(&self, target: &str) -> Liveness {
        if self.0.contains(target) {
            Liveness::Reachable
        } else {
            Liveness::unreachable("request timed out")
        }
    }
}

fn checker_with_hosts(hosts: &[&str]) -> LivenessChecker {
    LivenessChecker::with_probes(
        Arc::new(HttpProbe::new(Duration::from_secs(1))),
        Arc::new(StaticHosts(hosts.iter().map(|h| h.to_string()).collect())),
    )
}

#[tokio::test]
async fn http_503_on_two_cycles_logs_single_transition() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let pool = test_pool().await;
    let id = insert_device(&pool, "nas", &server.uri(), Some("online")).await;
    let scheduler = PollScheduler::new(
        Arc::new(pool.clone()),
        checker_with_hosts(&[]),
        SnapshotHub::new(4),
        Duration::from_secs(5),
    );

    let first = scheduler.run_cycle().await;
    assert_eq!(first.transitions, 1);
    let after_first = get_device(&pool, id).await.unwrap().unwrap();
    assert_eq!(after_first.status, Some(DeviceStatus::Offline));
    let first_contact = after_first.last_online.expect("last contact recorded");

    tokio::time::sleep(Duration::from_millis(5)).await;

    let second = scheduler.run_cycle().await;
    assert_eq!(second.transitions, 0);
    let after_second = get_device(&pool, id).await.unwrap().unwrap();
    assert_eq!(after_second.status, Some(DeviceStatus::Offline));
    assert!(after_second.last_online.unwrap() > first_contact);

    let logs = list_status_logs(&pool, id, 10).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].old_status, Some(DeviceStatus::Online));
    assert_eq!(logs[0].new_status, DeviceStatus::Offline);
}

#[tokio::test]
async fn every_device_has_probed_status_after_cycle() {
    let pool = test_pool().await;
    insert_device(&pool, "gw", "192.168.1.1", None).await;
    insert_device(&pool, "printer", "192.168.1.10", None).await;
    insert_device(&pool, "blank", "", None).await;
    let hub = SnapshotHub::new(4);
    let mut observer = hub.subscribe();
    let scheduler = PollScheduler::new(
        Arc::new(pool.clone()),
        checker_with_hosts(&["192.168.1.1"]),
        hub.clone(),
        Duration::from_secs(5),
    )
    .with_concurrency(2);

    let report = scheduler.run_cycle().await;
    assert_eq!(report.checked, 3);
    assert_eq!(report.online, 1);
    assert_eq!(report.offline, 2);
    assert_eq!(report.transitions, 3);

    let snapshot = observer.recv().await.unwrap();
    assert_eq!(snapshot.total, 3);
    assert_eq!(snapshot.online + snapshot.offline, snapshot.total);
    assert!(snapshot.devices.iter().all(|d| d.status.is_some()));
}

#[tokio::test]
async fn started_scheduler_publishes_and_stops_on_shutdown() {
    let pool = test_pool().await;
    insert_device(&pool, "gw", "192.168.1.1", None).await;
    let hub = SnapshotHub::new(4);
    let mut observer = hub.subscribe();
    let shutdown = ShutdownController::default();

    let handle = PollScheduler::new(
        Arc::new(pool.clone()),
        checker_with_hosts(&["192.168.1.1"]),
        hub.clone(),
        Duration::from_secs(1),
    )
    .start(shutdown.clone());

    // 起動時の現状スナップショット（未プローブ）
    let priming = tokio::time::timeout(Duration::from_secs(2), observer.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(priming.online, 0);

    // 即時実行される最初のサイクル
    let polled = tokio::time::timeout(Duration::from_secs(2), observer.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(polled.online, 1);

    shutdown.request_shutdown();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("scheduler should stop after shutdown")
        .unwrap();
}
