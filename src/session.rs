//! ライブセッション
//!
//! ロール（配信者/視聴者）に応じてスコア集計・コメントフィード・フィードバックを束ねる。
//! 全メソッドは`&mut self`で、並行アクセスは呼び出し側のロックで直列化する。

use crate::analytics::{CommentFeedSimulator, FeedbackRotator, InsightsReport, ScoreAggregator};
use crate::config::AppConfig;
use crate::error::{DanceLiveError, DanceLiveResult};
use crate::models::{ActiveComment, DonationAmount, ScoreSample, SessionRole};
use crate::random::RandomSource;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// ドライバーと操作ハンドラーで共有するセッション
pub type SharedSession = Arc<Mutex<LiveSession>>;

/// 表示層に渡す読み取り専用ビュー
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSnapshot {
    pub role: SessionRole,
    pub active: bool,
    pub samples: Vec<ScoreSample>,
    pub comments: Vec<ActiveComment>,
    pub feedback: Option<String>,
}

/// 投げ銭の処理結果
#[derive(Debug, Clone, PartialEq)]
pub struct DonationOutcome {
    pub amount: DonationAmount,
    /// 反映後の最新サンプル（履歴が空ならNone）
    pub sample: Option<ScoreSample>,
    pub feedback: &'static str,
}

/// 1セッション分の状態
pub struct LiveSession {
    role: SessionRole,
    scores: ScoreAggregator,
    comments: CommentFeedSimulator,
    feedback: FeedbackRotator,
    rng: Box<dyn RandomSource>,
    active: bool,
}

impl std::fmt::Debug for LiveSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveSession")
            .field("role", &self.role)
            .field("active", &self.active)
            .field("samples", &self.scores.len())
            .field("comments", &self.comments.active_comments().len())
            .finish()
    }
}

impl LiveSession {
    pub fn new(role: SessionRole, config: &AppConfig, rng: Box<dyn RandomSource>) -> Self {
        Self {
            role,
            scores: ScoreAggregator::new(config.score.clone()),
            comments: CommentFeedSimulator::new(config.comments.clone()),
            feedback: FeedbackRotator::new(config.feedback.clone(), role == SessionRole::Streamer),
            rng,
            active: false,
        }
    }

    /// 共有用にラップ
    pub fn into_shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }

    pub fn role(&self) -> SessionRole {
        self.role
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// セッション開始（アクティブ中は何もしない）
    pub fn start(&mut self, now: DateTime<Utc>) {
        if self.active {
            return;
        }

        self.active = true;
        self.scores.activate(now);
        if self.role.accepts_audience_events() {
            self.comments.activate(now);
        }
        self.feedback.activate(now);

        info!(
            "{} Session started ({})",
            self.role.icon(),
            self.role.to_string()
        );
    }

    /// セッション停止。履歴と表示中コメントは破棄される
    pub fn stop(&mut self) {
        if !self.active {
            return;
        }

        self.active = false;
        self.scores.deactivate();
        self.comments.deactivate();
        self.feedback.deactivate();

        info!("🛑 Session stopped ({})", self.role.to_string());
    }

    /// `now`までの周期イベントを処理し、新しく追加されたスコアサンプル数を返す
    pub fn advance(&mut self, now: DateTime<Utc>) -> usize {
        if !self.active {
            return 0;
        }

        let ticks = self.scores.advance(now, self.rng.as_mut());
        self.comments.advance(now, self.rng.as_mut());
        self.feedback.advance(now, self.rng.as_mut());
        ticks
    }

    /// 投げ銭（視聴者ロールのみ）
    pub fn donate(
        &mut self,
        amount: DonationAmount,
        now: DateTime<Utc>,
    ) -> DanceLiveResult<DonationOutcome> {
        if !self.role.accepts_audience_events() {
            return Err(DanceLiveError::DonationNotAccepted(
                self.role.to_string().to_string(),
            ));
        }

        let sample = self.scores.add_donation(amount.yen(), amount.bonus_score());
        let feedback = self.feedback.show_donation(amount, now);

        Ok(DonationOutcome {
            amount,
            sample,
            feedback,
        })
    }

    pub fn samples(&self) -> Vec<ScoreSample> {
        self.scores.snapshot()
    }

    pub fn latest_sample(&self) -> Option<&ScoreSample> {
        self.scores.latest()
    }

    pub fn comments(&self) -> Vec<ActiveComment> {
        self.comments.snapshot()
    }

    pub fn feedback(&self, now: DateTime<Utc>) -> Option<&'static str> {
        self.feedback.current(now)
    }

    pub fn snapshot(&self, now: DateTime<Utc>) -> SessionSnapshot {
        SessionSnapshot {
            role: self.role,
            active: self.active,
            samples: self.scores.snapshot(),
            comments: self.comments.snapshot(),
            feedback: self.feedback.current(now).map(str::to_string),
        }
    }

    pub fn insights(&mut self) -> InsightsReport {
        let samples = self.scores.snapshot();
        InsightsReport::compute(
            self.role,
            &samples,
            self.comments.active_comments(),
            self.rng.as_mut(),
        )
    }
}

impl Drop for LiveSession {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::ScriptedRandom;
    use chrono::Duration;

    fn start() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-01-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn session(role: SessionRole) -> LiveSession {
        LiveSession::new(
            role,
            &AppConfig::default(),
            Box::new(ScriptedRandom::constant(0.5)),
        )
    }

    #[test]
    fn test_viewer_session_generates_comments() {
        let mut session = session(SessionRole::Viewer);
        session.start(start());
        session.advance(start() + Duration::seconds(4));

        assert_eq!(session.comments().len(), 1);
        assert_eq!(session.samples().len(), 1);
    }

    #[test]
    fn test_streamer_session_has_no_comments() {
        let mut session = session(SessionRole::Streamer);
        session.start(start());
        session.advance(start() + Duration::seconds(20));

        assert!(session.comments().is_empty());
        assert_eq!(session.samples().len(), 5);
        assert!(session.feedback(start() + Duration::seconds(20)).is_some());
    }

    #[test]
    fn test_streamer_rejects_donation() {
        let mut session = session(SessionRole::Streamer);
        session.start(start());
        let result = session.donate(DonationAmount::Yen500, start());
        assert!(matches!(result, Err(DanceLiveError::DonationNotAccepted(_))));
    }

    #[test]
    fn test_advance_when_stopped_is_noop() {
        let mut session = session(SessionRole::Viewer);
        assert_eq!(session.advance(start() + Duration::seconds(60)), 0);
        assert!(session.samples().is_empty());
    }

    #[test]
    fn test_snapshot_serializes_to_json() {
        let mut session = session(SessionRole::Viewer);
        session.start(start());
        session.donate(DonationAmount::Yen100, start()).unwrap();

        let snapshot = session.snapshot(start());
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["role"], "viewer");
        assert_eq!(json["active"], true);
        assert_eq!(json["samples"][0]["donation_amount"], 100);
        assert!(json["feedback"].is_string());
    }
}
