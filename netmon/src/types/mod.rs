//! 型定義モジュール
//!
//! ドメインエンティティの型定義を提供

/// デバイス関連の型定義
pub mod device;

pub use device::{Device, DeviceStatus, Snapshot, StatusTransitionLogEntry};
