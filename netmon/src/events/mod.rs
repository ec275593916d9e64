//! スナップショット配信ハブ
//!
//! ポーリングサイクルごとのスナップショットを、SSEやWebSocketで接続中の
//! オブザーバーへファンアウトする。
//!
//! 各オブザーバーは容量固定のキューを持つ。キューが満杯のときは最も古い
//! スナップショットを捨てて新しいものを積む（最新が勝つ）。
//! `publish`はオブザーバーの消費速度に関係なく即座に戻る。

use crate::types::device::Snapshot;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::sync::Notify;
use tracing::debug;

/// オブザーバーごとのデフォルトキュー容量
pub const DEFAULT_QUEUE_CAPACITY: usize = 8;

/// スナップショット配信ハブ
#[derive(Clone)]
pub struct SnapshotHub {
    inner: Arc<HubInner>,
}

struct HubInner {
    state: Mutex<HubState>,
    capacity: usize,
    next_id: AtomicU64,
}

#[derive(Default)]
struct HubState {
    observers: HashMap<u64, Arc<ObserverQueue>>,
    latest: Option<Arc<Snapshot>>,
    closed: bool,
}

struct ObserverQueue {
    pending: Mutex<VecDeque<Arc<Snapshot>>>,
    notify: Notify,
    closed: AtomicBool,
    dropped: AtomicU64,
}

impl ObserverQueue {
    fn new() -> Self {
        Self {
            pending: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
            closed: AtomicBool::new(false),
            dropped: AtomicU64::new(0),
        }
    }

    fn pending(&self) -> MutexGuard<'_, VecDeque<Arc<Snapshot>>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 満杯なら最古を捨てて積む。捨てた場合は`true`
    fn push(&self, snapshot: Arc<Snapshot>, capacity: usize) -> bool {
        let mut pending = self.pending();
        let overflowed = pending.len() >= capacity;
        if overflowed {
            pending.pop_front();
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        pending.push_back(snapshot);
        drop(pending);
        self.notify.notify_one();
        overflowed
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }
}

impl Default for SnapshotHub {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

impl SnapshotHub {
    /// オブザーバーごとのキュー容量を指定してハブを作成（最低1）
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(HubInner {
                state: Mutex::new(HubState::default()),
                capacity: capacity.max(1),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, HubState> {
        self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// スナップショットを全オブザーバーへ配信する
    ///
    /// ブロックしない。以後の購読者の初期値としても保持される。
    pub fn publish(&self, snapshot: Snapshot) {
        let snapshot = Arc::new(snapshot);
        let mut state = self.state();
        state.latest = Some(snapshot.clone());
        for (id, queue) in state.observers.iter() {
            if queue.push(snapshot.clone(), self.inner.capacity) {
                debug!(
                    observer_id = id,
                    dropped_total = queue.dropped.load(Ordering::Relaxed),
                    "Observer is lagging, dropped oldest snapshot"
                );
            }
        }
    }

    /// オブザーバーを登録する
    ///
    /// 既に配信済みのスナップショットがあれば、次のティックを待たずに
    /// それをキューに入れた状態で返す。`close_all`後は閉じたハンドルを返す。
    pub fn subscribe(&self) -> ObserverHandle {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let queue = Arc::new(ObserverQueue::new());

        let mut state = self.state();
        if let Some(latest) = &state.latest {
            queue.push(latest.clone(), self.inner.capacity);
        }
        if state.closed {
            drop(state);
            queue.close();
            debug!(observer_id = id, "Hub is closed, observer ends after current snapshot");
            return ObserverHandle {
                id,
                queue,
                hub: Weak::new(),
            };
        }
        state.observers.insert(id, queue.clone());
        let count = state.observers.len();
        drop(state);

        debug!(observer_id = id, observers = count, "Observer subscribed");
        ObserverHandle {
            id,
            queue,
            hub: Arc::downgrade(&self.inner),
        }
    }

    /// オブザーバーを登録解除してキューを解放する
    pub fn unsubscribe(&self, handle: ObserverHandle) {
        drop(handle);
    }

    /// 現在のオブザーバー数
    pub fn observer_count(&self) -> usize {
        self.state().observers.len()
    }

    /// 最後に配信したスナップショット
    pub fn latest(&self) -> Option<Arc<Snapshot>> {
        self.state().latest.clone()
    }

    /// 全オブザーバーを閉じる（シャットダウン時）
    ///
    /// キューに残っている分は受信でき、その後`recv`は`None`を返す。
    /// 以後に購読したオブザーバーも即座に閉じられる。
    pub fn close_all(&self) {
        let mut state = self.state();
        state.closed = true;
        for (_, queue) in state.observers.drain() {
            queue.close();
        }
    }
}

impl HubInner {
    fn remove(&self, id: u64) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(queue) = state.observers.remove(&id) {
            queue.close();
            debug!(
                observer_id = id,
                observers = state.observers.len(),
                "Observer unsubscribed"
            );
        }
    }
}

/// 購読中のオブザーバー
///
/// dropすると自動的に登録解除される。
pub struct ObserverHandle {
    id: u64,
    queue: Arc<ObserverQueue>,
    hub: Weak<HubInner>,
}

impl ObserverHandle {
    /// オブザーバーID
    pub fn id(&self) -> u64 {
        self.id
    }

    /// 次のスナップショットを待つ
    ///
    /// ハブ側で閉じられ、キューが空になった場合は`None`。
    pub async fn recv(&mut self) -> Option<Arc<Snapshot>> {
        loop {
            let next = self.queue.pending().pop_front();
            if let Some(snapshot) = next {
                return Some(snapshot);
            }
            if self.queue.closed.load(Ordering::SeqCst) {
                return None;
            }
            // notify_oneは待機者がいなければ許可を1つ保持するので取りこぼさない
            self.queue.notify.notified().await;
        }
    }

    /// 待たずに取り出す
    pub fn try_recv(&mut self) -> Option<Arc<Snapshot>> {
        self.queue.pending().pop_front()
    }

    /// キューに溜まっている件数
    pub fn pending_len(&self) -> usize {
        self.queue.pending().len()
    }

    /// 溢れて捨てられた累計件数
    pub fn dropped_count(&self) -> u64 {
        self.queue.dropped.load(Ordering::Relaxed)
    }
}

impl Drop for ObserverHandle {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.remove(self.id);
        }
    }
}

impl std::fmt::Debug for ObserverHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverHandle")
            .field("id", &self.id)
            .field("pending", &self.pending_len())
            .finish()
    }
}
