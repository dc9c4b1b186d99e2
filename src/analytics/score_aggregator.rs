//! リアルタイムスコア集計
//!
//! 直近`window_size`件のスコアサンプルを保持するスライディングウィンドウ。
//! タイマーは持たず、外部ドライバーが`advance(now)`を呼ぶことで周期ティックが進む。

use crate::config::{ScoreConfig, MAX_WINDOW_SIZE};
use crate::models::{clamp_emotion, clamp_score, ScoreSample};
use crate::random::RandomSource;
use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;
use tracing::{debug, info};

/// スコア集計エンジン
#[derive(Debug, Clone)]
pub struct ScoreAggregator {
    config: ScoreConfig,
    samples: VecDeque<ScoreSample>,
    /// 次のティック予定時刻（非アクティブ時はNone）
    next_tick_at: Option<DateTime<Utc>>,
}

impl Default for ScoreAggregator {
    fn default() -> Self {
        Self::new(ScoreConfig::default())
    }
}

impl ScoreAggregator {
    pub fn new(config: ScoreConfig) -> Self {
        let capacity = config.window_size.min(MAX_WINDOW_SIZE) + 1;
        Self {
            config,
            samples: VecDeque::with_capacity(capacity),
            next_tick_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.next_tick_at.is_some()
    }

    /// 非アクティブ→アクティブ遷移時に履歴をリセットしてシードを1件入れる
    pub fn activate(&mut self, now: DateTime<Utc>) {
        if self.is_active() {
            return;
        }

        self.samples.clear();
        self.samples.push_back(ScoreSample::seed(
            now,
            self.config.initial_score,
            self.config.initial_emotion,
        ));
        self.next_tick_at = Some(now + self.config.tick_interval());

        info!(
            score = self.config.initial_score,
            emotion_avg = self.config.initial_emotion,
            "📈 Score aggregator activated"
        );
    }

    /// 履歴を破棄して停止
    pub fn deactivate(&mut self) {
        if !self.is_active() && self.samples.is_empty() {
            return;
        }

        self.samples.clear();
        self.next_tick_at = None;
        info!("📉 Score aggregator deactivated");
    }

    /// 1ティック分のサンプルを生成して追加
    ///
    /// 非アクティブ時は何もしない。
    pub fn tick(&mut self, now: DateTime<Utc>, rng: &mut dyn RandomSource) -> Option<&ScoreSample> {
        if !self.is_active() {
            return None;
        }

        let next = {
            let last = self.samples.back()?;
            let score_range = self.config.score_step_bound();
            let emotion_range = self.config.emotion_step_bound();
            let score_step = rng.uniform(-score_range, score_range);
            let comment_delta = rng.int_inclusive(0, self.config.max_comment_increment);
            let emotion_step = rng.uniform(-emotion_range, emotion_range);

            ScoreSample {
                timestamp: now,
                score: clamp_score(last.score + score_step),
                donation_amount: last.donation_amount,
                comment_count: last.comment_count + comment_delta,
                emotion_avg: clamp_emotion(last.emotion_avg + emotion_step),
            }
        };

        debug!(
            score = next.score,
            comment_count = next.comment_count,
            emotion_avg = next.emotion_avg,
            "⏱️ Score tick"
        );

        self.samples.push_back(next);
        while self.samples.len() > self.config.window_size {
            self.samples.pop_front();
        }

        self.samples.back()
    }

    /// `now`までに予定されていたティックを実行し、実行数を返す
    ///
    /// 各サンプルのタイムスタンプは予定時刻になる。
    /// ウィンドウに残らない古いティックは実行せず予定時刻だけ進める。
    pub fn advance(&mut self, now: DateTime<Utc>, rng: &mut dyn RandomSource) -> usize {
        let Some(mut due) = self.next_tick_at else {
            return 0;
        };
        if due > now {
            return 0;
        }

        let interval = self.config.tick_interval();
        let interval_ms = interval.num_milliseconds().max(1);
        let pending = (now - due).num_milliseconds() / interval_ms + 1;
        let window = i64::try_from(self.config.window_size).unwrap_or(i64::MAX);
        let skipped = pending.saturating_sub(window).max(0);
        if skipped > 0 {
            due += Duration::milliseconds(skipped * interval_ms);
            debug!(skipped = skipped, "⏩ Skipped ticks outside the window");
        }

        let mut executed = 0;
        while due <= now {
            self.tick(due, rng);
            due += interval;
            executed += 1;
        }
        self.next_tick_at = Some(due);

        executed
    }

    /// 最新サンプルに投げ銭を反映
    ///
    /// 履歴が空なら何もせずNoneを返す。
    pub fn add_donation(&mut self, amount: u64, bonus_score: f64) -> Option<ScoreSample> {
        let last = self.samples.back_mut()?;
        last.donation_amount += amount;
        last.score = clamp_score(last.score + bonus_score);

        info!(
            amount = amount,
            bonus_score = bonus_score,
            score = last.score,
            total_donations = last.donation_amount,
            "💰 Donation applied"
        );

        Some(last.clone())
    }

    /// 現時点のサンプル列（古い順）
    pub fn snapshot(&self) -> Vec<ScoreSample> {
        self.samples.iter().cloned().collect()
    }

    pub fn latest(&self) -> Option<&ScoreSample> {
        self.samples.back()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn next_tick_at(&self) -> Option<DateTime<Utc>> {
        self.next_tick_at
    }
}
