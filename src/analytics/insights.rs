//! 詳細インサイト（スコア・エンゲージメント集計とアドバイス文）

use crate::models::{ActiveComment, Emotion, ScoreSample, SessionRole};
use crate::random::RandomSource;
use crate::utils::format_yen;
use serde::{Deserialize, Serialize};

/// コメントが無いときのポジティブ率
pub const DEFAULT_POSITIVE_RATE: u8 = 85;

/// インサイト集計結果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InsightsReport {
    pub average_score: Option<f64>,
    pub max_score: Option<f64>,
    /// 安定度（%）。モック値
    pub stability: u8,
    /// ポジティブ率（%）
    pub positive_rate: u8,
    /// 感情分析（%）。ロールごとの範囲のモック値
    pub emotion_rate: u8,
    pub total_donations: u64,
    pub comment_count: usize,
    pub advice: Vec<String>,
}

impl InsightsReport {
    /// スナップショットから集計
    pub fn compute(
        role: SessionRole,
        samples: &[ScoreSample],
        comments: &[ActiveComment],
        rng: &mut dyn RandomSource,
    ) -> Self {
        let average_score = if samples.is_empty() {
            None
        } else {
            Some(samples.iter().map(|s| s.score).sum::<f64>() / samples.len() as f64)
        };
        let max_score = samples.iter().map(|s| s.score).reduce(f64::max);
        let total_donations = samples.last().map(|s| s.donation_amount).unwrap_or(0);

        let positive = comments
            .iter()
            .filter(|c| c.emotion == Emotion::Positive)
            .count();
        let positive_rate = if comments.is_empty() {
            DEFAULT_POSITIVE_RATE
        } else {
            ((positive as f64 / comments.len() as f64) * 100.0).round() as u8
        };

        let stability = rng.int_inclusive(75, 94) as u8;
        let (low, high) = role.emotion_rate_range();
        let emotion_rate = rng.int_inclusive(low, high) as u8;

        let advice = vec![
            if positive_rate > 80 {
                "視聴者の反応が絶好調！この調子で続けよう"
            } else {
                "もう少し視聴者とのやり取りを増やそう"
            }
            .to_string(),
            if total_donations > 500 {
                "投げ銭が順調！感謝の気持ちを伝えよう"
            } else {
                "投げ銭の呼びかけタイミングを意識しよう"
            }
            .to_string(),
            if average_score.is_some_and(|avg| avg > 85.0) {
                "スキルが向上中！自信を持ってパフォーマンスしよう"
            } else {
                "基本動作を意識して精度を上げよう"
            }
            .to_string(),
        ];

        Self {
            average_score,
            max_score,
            stability,
            positive_rate,
            emotion_rate,
            total_donations,
            comment_count: comments.len(),
            advice,
        }
    }

    /// タイトル付きセクションに整形
    pub fn sections(&self) -> Vec<(&'static str, Vec<String>)> {
        let average = self
            .average_score
            .map(|v| format!("{:.1}", v))
            .unwrap_or_else(|| "N/A".to_string());
        let max = self
            .max_score
            .map(|v| format!("{:.1}", v))
            .unwrap_or_else(|| "N/A".to_string());

        vec![
            (
                "パフォーマンス分析",
                vec![
                    format!("平均スコア: {}点", average),
                    format!("最高スコア: {}点", max),
                    format!("安定度: {}%", self.stability),
                ],
            ),
            (
                "視聴者エンゲージメント",
                vec![
                    format!("ポジティブ率: {}%", self.positive_rate),
                    format!("感情分析: {}%", self.emotion_rate),
                    format!("総投げ銭: {}", format_yen(self.total_donations)),
                    format!("コメント数: {}件", self.comment_count),
                ],
            ),
            ("AIアドバイス", self.advice.clone()),
        ]
    }
}

impl std::fmt::Display for InsightsReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "📊 詳細インサイト")?;
        for (title, items) in self.sections() {
            writeln!(f, "[{}]", title)?;
            for item in items {
                writeln!(f, "  • {}", item)?;
            }
        }
        Ok(())
    }
}
