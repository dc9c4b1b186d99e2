//! 乱数源の抽象化
//!
//! スコアのランダムウォークやコメント抽選はすべてこのトレイト経由で乱数を取得する。
//! 本番では`StdRandom`、テストでは`ScriptedRandom`で決定的な列を差し込む。

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// 注入可能な乱数源
pub trait RandomSource: Send {
    /// [low, high) の一様乱数
    fn uniform(&mut self, low: f64, high: f64) -> f64;

    /// [low, high] の整数乱数
    fn int_inclusive(&mut self, low: u64, high: u64) -> u64;

    /// 0..len のインデックス（lenは1以上）
    fn index(&mut self, len: usize) -> usize;
}

/// `rand::StdRng`による乱数源
#[derive(Debug, Clone)]
pub struct StdRandom {
    rng: StdRng,
}

impl StdRandom {
    /// OSのエントロピーから初期化
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// シード固定（再現可能なシミュレーション用）
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for StdRandom {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl RandomSource for StdRandom {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        if high <= low {
            return low;
        }
        self.rng.gen_range(low..high)
    }

    fn int_inclusive(&mut self, low: u64, high: u64) -> u64 {
        if high <= low {
            return low;
        }
        self.rng.gen_range(low..=high)
    }

    fn index(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        self.rng.gen_range(0..len)
    }
}

/// 単位区間[0,1]の値を順に返す決定的な乱数源
///
/// 列を使い切った後は最後の値を返し続ける（空なら0.5）。
/// 1.0を与えると各区間の上端（最大ステップ）、0.0で下端になる。
#[derive(Debug, Clone, Default)]
pub struct ScriptedRandom {
    values: VecDeque<f64>,
    last: Option<f64>,
}

impl ScriptedRandom {
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        Self {
            values: values.into_iter().map(|v| v.clamp(0.0, 1.0)).collect(),
            last: None,
        }
    }

    /// 常に同じ値を返す
    pub fn constant(value: f64) -> Self {
        Self::new([value])
    }

    fn next_unit(&mut self) -> f64 {
        if let Some(value) = self.values.pop_front() {
            self.last = Some(value);
            value
        } else {
            self.last.unwrap_or(0.5)
        }
    }
}

impl RandomSource for ScriptedRandom {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        let unit = self.next_unit();
        low + unit * (high - low)
    }

    fn int_inclusive(&mut self, low: u64, high: u64) -> u64 {
        let unit = self.next_unit();
        if high <= low {
            return low;
        }
        let span = (high - low + 1) as f64;
        (low + (unit * span).floor() as u64).min(high)
    }

    fn index(&mut self, len: usize) -> usize {
        let unit = self.next_unit();
        if len <= 1 {
            return 0;
        }
        ((unit * len as f64).floor() as usize).min(len - 1)
    }
}
