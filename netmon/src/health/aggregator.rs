//! スナップショット集計

use crate::types::device::{Device, Snapshot};

/// デバイス一覧を集計してスナップショットを作る
///
/// `online`以外（`offline`と未プローブ）はすべて`offline`として数えるため、
/// `online + offline == total`が常に成り立つ。
pub fn aggregate(devices: Vec<Device>) -> Snapshot {
    let total = devices.len();
    let online = devices.iter().filter(|d| d.is_online()).count();

    Snapshot {
        total,
        online,
        offline: total - online,
        devices,
    }
}
