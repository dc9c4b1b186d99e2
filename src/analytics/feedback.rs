//! コーチングフィードバック表示

use crate::config::FeedbackConfig;
use crate::models::DonationAmount;
use crate::random::RandomSource;
use crate::templates::{donation_feedback, REGULAR_FEEDBACK};
use chrono::{DateTime, Duration, Utc};
use tracing::debug;

/// 定期メッセージと投げ銭お礼メッセージの管理
#[derive(Debug, Clone)]
pub struct FeedbackRotator {
    config: FeedbackConfig,
    /// 定期ローテーションを行うか（配信者ビューのみ）
    rotate_regular: bool,
    regular: Option<&'static str>,
    next_rotation_at: Option<DateTime<Utc>>,
    donation: Option<(&'static str, DateTime<Utc>)>,
    active: bool,
}

impl FeedbackRotator {
    pub fn new(config: FeedbackConfig, rotate_regular: bool) -> Self {
        Self {
            config,
            rotate_regular,
            regular: None,
            next_rotation_at: None,
            donation: None,
            active: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn next_rotation_at(&self) -> Option<DateTime<Utc>> {
        self.next_rotation_at
    }

    pub fn activate(&mut self, now: DateTime<Utc>) {
        if self.active {
            return;
        }
        self.active = true;
        self.donation = None;
        if self.rotate_regular {
            // 一時停止からの再開では表示中のメッセージを引き継ぐ
            if self.regular.is_none() {
                self.regular = REGULAR_FEEDBACK.first().copied();
            }
            self.next_rotation_at = Some(now + self.config.rotation_interval());
        }
    }

    /// ローテーションを止める。定期メッセージは表示したまま残す
    pub fn deactivate(&mut self) {
        self.active = false;
        self.next_rotation_at = None;
        self.donation = None;
    }

    /// ローテーションと表示期限を`now`まで進める
    pub fn advance(&mut self, now: DateTime<Utc>, rng: &mut dyn RandomSource) {
        if !self.active {
            return;
        }

        if let Some(due) = self.next_rotation_at.filter(|due| *due <= now) {
            // 表示に残るのは最後のローテーションだけ
            let interval = self.config.rotation_interval();
            let interval_ms = interval.num_milliseconds().max(1);
            let behind = (now - due).num_milliseconds() / interval_ms;
            let last_due = due + Duration::milliseconds(behind * interval_ms);

            let message = REGULAR_FEEDBACK[rng.index(REGULAR_FEEDBACK.len())];
            debug!(message = message, "🗣️ Feedback rotated");
            self.regular = Some(message);
            self.next_rotation_at = Some(last_due + interval);
        }

        if matches!(self.donation, Some((_, until)) if until <= now) {
            self.donation = None;
        }
    }

    /// 投げ銭お礼メッセージを一定時間表示
    pub fn show_donation(&mut self, amount: DonationAmount, now: DateTime<Utc>) -> &'static str {
        let message = donation_feedback(amount);
        self.donation = Some((message, now + self.config.donation_display()));
        message
    }

    /// 現在表示すべきメッセージ（投げ銭メッセージ優先）
    pub fn current(&self, now: DateTime<Utc>) -> Option<&'static str> {
        match self.donation {
            Some((message, until)) if until > now => Some(message),
            _ => self.regular,
        }
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

    #[test]
    fn test_streamer_starts_with_first_message_and_rotates() {
        let mut rotator = FeedbackRotator::new(FeedbackConfig::default(), true);
        let mut rng = ScriptedRandom::constant(0.99);
        rotator.activate(start());
        assert_eq!(rotator.current(start()), Some(REGULAR_FEEDBACK[0]));

        rotator.advance(start() + Duration::seconds(9), &mut rng);
        assert_eq!(rotator.current(start()), Some(REGULAR_FEEDBACK[0]));

        rotator.advance(start() + Duration::seconds(10), &mut rng);
        assert_eq!(
            rotator.current(start() + Duration::seconds(10)),
            Some(REGULAR_FEEDBACK[REGULAR_FEEDBACK.len() - 1])
        );
    }

    #[test]
    fn test_viewer_has_no_regular_message() {
        let mut rotator = FeedbackRotator::new(FeedbackConfig::default(), false);
        let mut rng = ScriptedRandom::constant(0.0);
        rotator.activate(start());
        rotator.advance(start() + Duration::seconds(30), &mut rng);
        assert_eq!(rotator.current(start() + Duration::seconds(30)), None);
    }

    #[test]
    fn test_donation_message_expires() {
        let mut rotator = FeedbackRotator::new(FeedbackConfig::default(), false);
        let mut rng = ScriptedRandom::constant(0.0);
        rotator.activate(start());

        let message = rotator.show_donation(DonationAmount::Yen500, start());
        assert_eq!(rotator.current(start() + Duration::seconds(4)), Some(message));

        rotator.advance(start() + Duration::seconds(5), &mut rng);
        assert_eq!(rotator.current(start() + Duration::seconds(5)), None);
    }

    #[test]
    fn test_deactivate_clears_donation_message() {
        let mut rotator = FeedbackRotator::new(FeedbackConfig::default(), false);
        rotator.activate(start());
        rotator.show_donation(DonationAmount::Yen100, start());
        rotator.deactivate();
        assert_eq!(rotator.current(start()), None);
    }

    #[test]
    fn test_pause_keeps_regular_message() {
        let mut rotator = FeedbackRotator::new(FeedbackConfig::default(), true);
        let mut rng = ScriptedRandom::constant(0.99);
        rotator.activate(start());
        rotator.advance(start() + Duration::seconds(10), &mut rng);
        let shown = REGULAR_FEEDBACK[REGULAR_FEEDBACK.len() - 1];

        rotator.show_donation(DonationAmount::Yen100, start() + Duration::seconds(10));
        rotator.deactivate();
        assert_eq!(rotator.current(start() + Duration::seconds(10)), Some(shown));

        // 停止中はローテーションしない
        let mut first = ScriptedRandom::constant(0.0);
        rotator.advance(start() + Duration::seconds(60), &mut first);
        assert_eq!(rotator.current(start() + Duration::seconds(60)), Some(shown));

        // 再開しても表示中のメッセージを引き継ぐ
        rotator.activate(start() + Duration::seconds(60));
        assert_eq!(rotator.current(start() + Duration::seconds(60)), Some(shown));
        rotator.advance(start() + Duration::seconds(70), &mut first);
        assert_eq!(
            rotator.current(start() + Duration::seconds(70)),
            Some(REGULAR_FEEDBACK[0])
        );
    }

    #[test]
    fn test_long_gap_rotates_once_on_schedule() {
        let mut rotator = FeedbackRotator::new(
            FeedbackConfig {
                rotation_interval_ms: 0,
                donation_display_ms: 5_000,
            },
            true,
        );
        let mut rng = ScriptedRandom::constant(0.99);
        rotator.activate(start());

        let now = start() + Duration::days(1);
        rotator.advance(now, &mut rng);
        assert_eq!(
            rotator.current(now),
            Some(REGULAR_FEEDBACK[REGULAR_FEEDBACK.len() - 1])
        );
        assert_eq!(rotator.next_rotation_at(), Some(now + Duration::milliseconds(1)));
    }
}
