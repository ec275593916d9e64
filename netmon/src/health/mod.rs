//! デバイス監視エンジン
//!
//! 到達性チェック、状態遷移の記録、スナップショット集計、
//! それらを駆動するポーリングスケジューラーで構成される。

pub mod aggregator;
pub mod checker;
pub mod recorder;
pub mod scheduler;

pub use aggregator::aggregate;
pub use checker::{AddressKind, EchoProbe, HttpProbe, Liveness, LivenessChecker, Probe};
pub use recorder::TransitionRecorder;
pub use scheduler::{CycleReport, PollScheduler};
