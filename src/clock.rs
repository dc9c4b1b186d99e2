//! 時刻源の抽象化
//!
//! コアロジックは`advance(now)`で時刻を受け取るだけで、タイマーは持たない。
//! 本番ドライバーは`SystemClock`、テストとシミュレーションは`ManualClock`を使う。

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;

/// 現在時刻を返す
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// 壁時計
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 手動で進める時計（クローン間で時刻を共有）
#[derive(Debug, Clone)]
pub struct ManualClock {
    current: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            current: Arc::new(Mutex::new(start)),
        }
    }

    /// 指定時間だけ進めて、進めた後の時刻を返す
    pub fn advance(&self, by: chrono::Duration) -> DateTime<Utc> {
        let mut current = self.current.lock();
        *current += by;
        *current
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.current.lock() = at;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.current.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let start = Utc::now();
        let clock = ManualClock::new(start);
        let other = clock.clone();

        clock.advance(chrono::Duration::seconds(5));
        assert_eq!(other.now(), start + chrono::Duration::seconds(5));

        other.set(start);
        assert_eq!(clock.now(), start);
    }
}
