//! モックコメントフィード
//!
//! 一定周期でテンプレートからコメントを生成し、各コメントは自身の失効時刻を持つ。
//! コメントごとのタイマーは作らず、`advance(now)`の掃引で失効分を取り除く。

use crate::config::CommentConfig;
use crate::models::{ActiveComment, CommentTemplate};
use crate::random::RandomSource;
use crate::templates::COMMENT_TEMPLATES;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

/// コメントフィードシミュレーター
#[derive(Debug, Clone)]
pub struct CommentFeedSimulator {
    config: CommentConfig,
    templates: Vec<CommentTemplate>,
    active: Vec<ActiveComment>,
    next_spawn_at: Option<DateTime<Utc>>,
    /// セッション中に生成した総数
    generated: u64,
}

impl Default for CommentFeedSimulator {
    fn default() -> Self {
        Self::new(CommentConfig::default())
    }
}

impl CommentFeedSimulator {
    pub fn new(config: CommentConfig) -> Self {
        Self::with_templates(config, COMMENT_TEMPLATES.to_vec())
    }

    /// テンプレートを差し替えて作成（空の場合は生成しない）
    pub fn with_templates(config: CommentConfig, templates: Vec<CommentTemplate>) -> Self {
        Self {
            config,
            templates,
            active: Vec::new(),
            next_spawn_at: None,
            generated: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.next_spawn_at.is_some()
    }

    /// 生成を開始（最初のコメントは1周期後）
    pub fn activate(&mut self, now: DateTime<Utc>) {
        if self.is_active() {
            return;
        }

        self.active.clear();
        self.generated = 0;
        self.next_spawn_at = Some(now + self.config.spawn_interval());
        info!(
            templates = self.templates.len(),
            "💬 Comment feed activated"
        );
    }

    /// 生成を止めて表示中のコメントを即座に消す
    pub fn deactivate(&mut self) {
        if !self.is_active() && self.active.is_empty() {
            return;
        }

        self.active.clear();
        self.next_spawn_at = None;
        info!(generated = self.generated, "💬 Comment feed deactivated");
    }

    /// `now`までのイベント（生成・失効）を時系列順に処理
    ///
    /// 戻り値は今回生成したコメント数。`now`時点で既に失効している分は
    /// 実体を作らず件数だけ数える。
    pub fn advance(&mut self, now: DateTime<Utc>, rng: &mut dyn RandomSource) -> usize {
        let mut spawned = 0;

        if let Some(mut due) = self.next_spawn_at {
            let interval = self.config.spawn_interval();
            let interval_ms = interval.num_milliseconds().max(1);

            let cutoff = now - self.config.lifetime();
            if due <= cutoff {
                let skipped = (cutoff - due).num_milliseconds() / interval_ms + 1;
                due += Duration::milliseconds(skipped * interval_ms);
                if !self.templates.is_empty() {
                    self.generated += skipped as u64;
                    spawned += skipped as usize;
                }
                debug!(skipped = skipped, "⏩ Skipped comments expired before now");
            }

            while due <= now {
                self.expire(due);
                if self.spawn(due, rng) {
                    spawned += 1;
                }
                due += interval;
            }
            self.next_spawn_at = Some(due);
        }

        self.expire(now);
        spawned
    }

    fn spawn(&mut self, at: DateTime<Utc>, rng: &mut dyn RandomSource) -> bool {
        if self.templates.is_empty() {
            return false;
        }

        let template = &self.templates[rng.index(self.templates.len())];
        let comment = ActiveComment::from_template(template, at, self.config.lifetime());

        debug!(
            id = %comment.id,
            username = %comment.username,
            emotion = comment.emotion.as_str(),
            "💬 Comment spawned"
        );

        self.active.push(comment);
        self.generated += 1;
        true
    }

    /// 失効時刻を過ぎたコメントを取り除く
    fn expire(&mut self, now: DateTime<Utc>) {
        let before = self.active.len();
        self.active.retain(|c| !c.is_expired(now));
        let removed = before - self.active.len();
        if removed > 0 {
            debug!(removed = removed, "🧹 Comments expired");
        }
    }

    /// 表示中のコメント（順序保証なし）
    pub fn snapshot(&self) -> Vec<ActiveComment> {
        self.active.clone()
    }

    pub fn active_comments(&self) -> &[ActiveComment] {
        &self.active
    }

    pub fn generated_count(&self) -> u64 {
        self.generated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Emotion;
    use crate::random::ScriptedRandom;
    use chrono::Duration;

    fn start() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-01-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_first_comment_after_one_interval() {
        let mut feed = CommentFeedSimulator::default();
        let mut rng = ScriptedRandom::constant(0.0);
        feed.activate(start());

        assert_eq!(feed.advance(start() + Duration::milliseconds(3_999), &mut rng), 0);
        assert!(feed.snapshot().is_empty());

        assert_eq!(feed.advance(start() + Duration::seconds(4), &mut rng), 1);
        let comments = feed.snapshot();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].username, "ダンサーA");
        assert_eq!(comments[0].created_at, start() + Duration::seconds(4));
        assert_eq!(comments[0].expires_at, start() + Duration::seconds(7));
    }

    #[test]
    fn test_comment_expires_after_lifetime() {
        let mut feed = CommentFeedSimulator::default();
        let mut rng = ScriptedRandom::constant(0.0);
        feed.activate(start());

        feed.advance(start() + Duration::seconds(4), &mut rng);
        feed.advance(start() + Duration::milliseconds(6_999), &mut rng);
        assert_eq!(feed.snapshot().len(), 1);

        feed.advance(start() + Duration::seconds(7), &mut rng);
        assert!(feed.snapshot().is_empty());
    }

    #[test]
    fn test_template_choice_uses_index() {
        let mut feed = CommentFeedSimulator::default();
        // 0.85 * 10 = 8 → "ダンス好きI"
        let mut rng = ScriptedRandom::constant(0.85);
        feed.activate(start());
        feed.advance(start() + Duration::seconds(4), &mut rng);

        let comments = feed.snapshot();
        assert_eq!(comments[0].username, "ダンス好きI");
        assert_eq!(comments[0].emotion, Emotion::Neutral);
    }

    #[test]
    fn test_ids_are_unique() {
        let mut feed = CommentFeedSimulator::with_templates(
            CommentConfig {
                spawn_interval_ms: 1_000,
                lifetime_ms: 10_000,
            },
            COMMENT_TEMPLATES.to_vec(),
        );
        let mut rng = ScriptedRandom::constant(0.0);
        feed.activate(start());
        feed.advance(start() + Duration::seconds(9), &mut rng);

        let comments = feed.snapshot();
        assert_eq!(comments.len(), 9);
        let ids: std::collections::HashSet<_> = comments.iter().map(|c| c.id.clone()).collect();
        assert_eq!(ids.len(), 9);
    }

    #[test]
    fn test_deactivate_clears_and_halts() {
        let mut feed = CommentFeedSimulator::default();
        let mut rng = ScriptedRandom::constant(0.0);
        feed.activate(start());
        feed.advance(start() + Duration::seconds(4), &mut rng);
        assert_eq!(feed.snapshot().len(), 1);

        feed.deactivate();
        assert!(feed.snapshot().is_empty());
        assert_eq!(feed.advance(start() + Duration::seconds(60), &mut rng), 0);
        assert!(feed.snapshot().is_empty());
    }

    #[test]
    fn test_long_gap_materializes_only_live_comments() {
        let mut feed = CommentFeedSimulator::with_templates(
            CommentConfig {
                spawn_interval_ms: 1_000,
                lifetime_ms: 3_000,
            },
            COMMENT_TEMPLATES.to_vec(),
        );
        let mut rng = ScriptedRandom::constant(0.0);
        feed.activate(start());

        let now = start() + Duration::days(2);
        let spawned = feed.advance(now, &mut rng);
        assert_eq!(spawned, 2 * 86_400);
        assert_eq!(feed.generated_count(), 2 * 86_400);

        let comments = feed.snapshot();
        assert_eq!(comments.len(), 3);
        assert!(comments.iter().all(|c| !c.is_expired(now)));
    }

    #[test]
    fn test_zero_interval_does_not_hang() {
        let mut feed = CommentFeedSimulator::new(CommentConfig {
            spawn_interval_ms: 0,
            lifetime_ms: 10,
        });
        let mut rng = ScriptedRandom::constant(0.0);
        feed.activate(start());

        feed.advance(start() + Duration::seconds(60), &mut rng);
        assert_eq!(feed.snapshot().len(), 10);
    }

    #[test]
    fn test_empty_templates_never_spawn() {
        let mut feed = CommentFeedSimulator::with_templates(CommentConfig::default(), Vec::new());
        let mut rng = ScriptedRandom::constant(0.0);
        feed.activate(start());
        assert_eq!(feed.advance(start() + Duration::seconds(40), &mut rng), 0);
        assert_eq!(feed.generated_count(), 0);
    }
}
