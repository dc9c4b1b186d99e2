use crate::error::{DanceLiveError, DanceLiveResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// スコア時系列の1サンプル
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreSample {
    pub timestamp: DateTime<Utc>,
    /// パフォーマンススコア（0-100）
    pub score: f64,
    /// 累計投げ銭額（円）
    pub donation_amount: u64,
    /// 累計コメント数
    pub comment_count: u64,
    /// 感情平均（0-1）
    pub emotion_avg: f64,
}

impl ScoreSample {
    /// セッション開始時のシードサンプル
    pub fn seed(timestamp: DateTime<Utc>, score: f64, emotion_avg: f64) -> Self {
        Self {
            timestamp,
            score: clamp_score(score),
            donation_amount: 0,
            comment_count: 0,
            emotion_avg: clamp_emotion(emotion_avg),
        }
    }
}

/// スコアを0-100に収める
pub fn clamp_score(score: f64) -> f64 {
    score.clamp(0.0, 100.0)
}

/// 感情平均を0-1に収める
pub fn clamp_emotion(emotion: f64) -> f64 {
    emotion.clamp(0.0, 1.0)
}

/// コメントの感情分類
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    #[default]
    Positive,
    Neutral,
    Negative,
}

impl Emotion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Positive => "positive",
            Emotion::Neutral => "neutral",
            Emotion::Negative => "negative",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Emotion::Positive => "😊",
            Emotion::Neutral => "😐",
            Emotion::Negative => "😢",
        }
    }
}

/// コメントテンプレート（idなし）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentTemplate {
    pub username: &'static str,
    pub text: &'static str,
    pub emotion: Emotion,
}

/// 表示中のコメント
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActiveComment {
    pub id: String,
    pub username: String,
    pub text: String,
    pub emotion: Emotion,
    pub created_at: DateTime<Utc>,
    /// この時刻以降は表示しない
    pub expires_at: DateTime<Utc>,
}

impl ActiveComment {
    /// テンプレートから新しいコメントを生成（idは毎回新規発行）
    pub fn from_template(
        template: &CommentTemplate,
        created_at: DateTime<Utc>,
        lifetime: chrono::Duration,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            username: template.username.to_string(),
            text: template.text.to_string(),
            emotion: template.emotion,
            created_at,
            expires_at: created_at + lifetime,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// 投げ銭額（固定3段階）
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DonationAmount {
    Yen100,
    Yen500,
    Yen1000,
}

impl DonationAmount {
    pub const ALL: [DonationAmount; 3] = [
        DonationAmount::Yen100,
        DonationAmount::Yen500,
        DonationAmount::Yen1000,
    ];

    pub fn yen(&self) -> u64 {
        match self {
            DonationAmount::Yen100 => 100,
            DonationAmount::Yen500 => 500,
            DonationAmount::Yen1000 => 1000,
        }
    }

    /// 投げ銭によるスコアボーナス
    pub fn bonus_score(&self) -> f64 {
        match self {
            DonationAmount::Yen100 => 10.0,
            DonationAmount::Yen500 => 25.0,
            DonationAmount::Yen1000 => 50.0,
        }
    }
}

impl TryFrom<u64> for DonationAmount {
    type Error = DanceLiveError;

    fn try_from(value: u64) -> DanceLiveResult<Self> {
        match value {
            100 => Ok(DonationAmount::Yen100),
            500 => Ok(DonationAmount::Yen500),
            1000 => Ok(DonationAmount::Yen1000),
            other => Err(DanceLiveError::InvalidDonationAmount(other)),
        }
    }
}

impl std::fmt::Display for DonationAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "¥{}", self.yen())
    }
}

/// セッションの視点
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionRole {
    /// 配信者（お手本動画＋カメラ、コーチングフィードバック）
    Streamer,
    /// 視聴者（コメント・投げ銭）
    #[default]
    Viewer,
}

impl SessionRole {
    pub fn to_string(&self) -> &'static str {
        match self {
            SessionRole::Streamer => "Streamer",
            SessionRole::Viewer => "Viewer",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            SessionRole::Streamer => "🎥",
            SessionRole::Viewer => "👀",
        }
    }

    /// コメント・投げ銭を扱うか
    pub fn accepts_audience_events(&self) -> bool {
        matches!(self, SessionRole::Viewer)
    }

    /// 感情分析インジケーターの表示範囲（%）
    pub fn emotion_rate_range(&self) -> (u64, u64) {
        match self {
            SessionRole::Streamer => (80, 94),
            SessionRole::Viewer => (70, 89),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_donation_amount_conversion() {
        assert_eq!(DonationAmount::try_from(100).unwrap(), DonationAmount::Yen100);
        assert_eq!(DonationAmount::try_from(500).unwrap(), DonationAmount::Yen500);
        assert_eq!(DonationAmount::try_from(1000).unwrap(), DonationAmount::Yen1000);
        assert!(matches!(
            DonationAmount::try_from(300),
            Err(DanceLiveError::InvalidDonationAmount(300))
        ));
    }

    #[test]
    fn test_bonus_score_tiers() {
        assert_eq!(DonationAmount::Yen100.bonus_score(), 10.0);
        assert_eq!(DonationAmount::Yen500.bonus_score(), 25.0);
        assert_eq!(DonationAmount::Yen1000.bonus_score(), 50.0);
        assert_eq!(DonationAmount::Yen500.to_string(), "¥500");
    }

    #[test]
    fn test_seed_sample_is_clamped() {
        let now = Utc::now();
        let sample = ScoreSample::seed(now, 140.0, -0.2);
        assert_eq!(sample.score, 100.0);
        assert_eq!(sample.emotion_avg, 0.0);
        assert_eq!(sample.donation_amount, 0);
        assert_eq!(sample.comment_count, 0);
    }

    #[test]
    fn test_comment_expiry() {
        let now = Utc::now();
        let template = CommentTemplate {
            username: "ダンサーA",
            text: "すごい！",
            emotion: Emotion::Positive,
        };
        let comment = ActiveComment::from_template(&template, now, chrono::Duration::seconds(3));

        assert!(!comment.is_expired(now));
        assert!(!comment.is_expired(now + chrono::Duration::milliseconds(2999)));
        assert!(comment.is_expired(now + chrono::Duration::seconds(3)));
    }

    #[test]
    fn test_emotion_serialization() {
        let json = serde_json::to_string(&Emotion::Neutral).unwrap();
        assert_eq!(json, "\"neutral\"");
        let role: SessionRole = serde_json::from_str("\"streamer\"").unwrap();
        assert_eq!(role, SessionRole::Streamer);
    }
}
