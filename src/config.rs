//! アプリケーション設定管理モジュール
//!
//! XDGディレクトリを使用した設定ファイルの永続化と管理を提供します。
//! 各周期はミリ秒で持ち、デフォルト値は実アプリのタイミング（5秒/4秒/3秒/10秒）に合わせる。

use crate::error::{DanceLiveError, DanceLiveResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// 周期設定の上限（1日）
pub const MAX_PERIOD_MS: u64 = 86_400_000;

/// スライディングウィンドウの上限
pub const MAX_WINDOW_SIZE: usize = 10_000;

/// ミリ秒設定を`chrono::Duration`に変換（1ms〜`MAX_PERIOD_MS`に収める）
fn period(ms: u64) -> chrono::Duration {
    let bounded = i64::try_from(ms.clamp(1, MAX_PERIOD_MS)).unwrap_or(1);
    chrono::Duration::milliseconds(bounded)
}

/// 有限かつ非負の変動幅のみ使い、それ以外は0として扱う
fn step_bound(step: f64) -> f64 {
    if step.is_finite() {
        step.max(0.0)
    } else {
        0.0
    }
}

/// スコア集計の設定
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoreConfig {
    /// サンプリング周期
    pub tick_interval_ms: u64,
    /// スライディングウィンドウの最大サンプル数
    pub window_size: usize,
    pub initial_score: f64,
    pub initial_emotion: f64,
    /// 1ティックあたりのスコア変動幅（±）
    pub score_step: f64,
    /// 1ティックあたりの感情変動幅（±）
    pub emotion_step: f64,
    /// 1ティックで増えるコメント数の上限
    pub max_comment_increment: u64,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 5_000,
            window_size: 12, // 12点 × 5秒 = 直近60秒
            initial_score: 75.0,
            initial_emotion: 0.7,
            score_step: 3.0,
            emotion_step: 0.05,
            max_comment_increment: 2,
        }
    }
}

impl ScoreConfig {
    pub fn tick_interval(&self) -> chrono::Duration {
        period(self.tick_interval_ms)
    }

    pub fn score_step_bound(&self) -> f64 {
        step_bound(self.score_step)
    }

    pub fn emotion_step_bound(&self) -> f64 {
        step_bound(self.emotion_step)
    }
}

/// コメントフィードの設定
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CommentConfig {
    pub spawn_interval_ms: u64,
    /// 1コメントの表示時間
    pub lifetime_ms: u64,
}

impl Default for CommentConfig {
    fn default() -> Self {
        Self {
            spawn_interval_ms: 4_000,
            lifetime_ms: 3_000,
        }
    }
}

impl CommentConfig {
    pub fn spawn_interval(&self) -> chrono::Duration {
        period(self.spawn_interval_ms)
    }

    pub fn lifetime(&self) -> chrono::Duration {
        period(self.lifetime_ms)
    }
}

/// フィードバック表示の設定
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FeedbackConfig {
    pub rotation_interval_ms: u64,
    pub donation_display_ms: u64,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            rotation_interval_ms: 10_000,
            donation_display_ms: 5_000,
        }
    }
}

impl FeedbackConfig {
    pub fn rotation_interval(&self) -> chrono::Duration {
        period(self.rotation_interval_ms)
    }

    pub fn donation_display(&self) -> chrono::Duration {
        period(self.donation_display_ms)
    }
}

/// ログ設定
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    /// ログレベル (trace/debug/info/warn/error)。RUST_LOGが優先される
    pub log_level: String,
    /// JSON形式で出力
    pub json: bool,
    /// ファイル出力有効化
    pub enable_file_logging: bool,
    /// カスタムログディレクトリ（Noneの場合はXDGデフォルト使用）
    pub log_dir: Option<PathBuf>,
    pub log_file_prefix: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
            enable_file_logging: false,
            log_dir: None,
            log_file_prefix: "dancelive.log".to_string(),
        }
    }
}

/// アプリケーション設定
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub score: ScoreConfig,
    #[serde(default)]
    pub comments: CommentConfig,
    #[serde(default)]
    pub feedback: FeedbackConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl AppConfig {
    /// 値の妥当性を検証
    pub fn validate(&self) -> DanceLiveResult<()> {
        let periods = [
            ("score.tick_interval_ms", self.score.tick_interval_ms),
            ("comments.spawn_interval_ms", self.comments.spawn_interval_ms),
            ("comments.lifetime_ms", self.comments.lifetime_ms),
            ("feedback.rotation_interval_ms", self.feedback.rotation_interval_ms),
            ("feedback.donation_display_ms", self.feedback.donation_display_ms),
        ];
        for (name, value) in periods {
            if value == 0 {
                return Err(DanceLiveError::config(format!("{} must be positive", name)));
            }
            if value > MAX_PERIOD_MS {
                return Err(DanceLiveError::config(format!(
                    "{} must not exceed {} ms (got {})",
                    name, MAX_PERIOD_MS, value
                )));
            }
        }

        if self.score.window_size == 0 || self.score.window_size > MAX_WINDOW_SIZE {
            return Err(DanceLiveError::config(format!(
                "score.window_size must be within 1..={} (got {})",
                MAX_WINDOW_SIZE, self.score.window_size
            )));
        }
        if !(0.0..=100.0).contains(&self.score.initial_score) {
            return Err(DanceLiveError::config(format!(
                "score.initial_score must be within 0..=100 (got {})",
                self.score.initial_score
            )));
        }
        if !(0.0..=1.0).contains(&self.score.initial_emotion) {
            return Err(DanceLiveError::config(format!(
                "score.initial_emotion must be within 0..=1 (got {})",
                self.score.initial_emotion
            )));
        }
        let steps = [
            ("score.score_step", self.score.score_step),
            ("score.emotion_step", self.score.emotion_step),
        ];
        for (name, step) in steps {
            if !step.is_finite() || step < 0.0 {
                return Err(DanceLiveError::config(format!(
                    "{} must be a finite non-negative number (got {})",
                    name, step
                )));
            }
        }

        Ok(())
    }
}

/// 設定管理マネージャー
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// XDG設定ディレクトリを使う設定マネージャーを作成
    pub fn new() -> DanceLiveResult<Self> {
        let config_path = Self::default_config_path()?;
        Ok(Self { config_path })
    }

    /// 任意のパスを使う設定マネージャーを作成
    pub fn with_path(path: impl AsRef<Path>) -> Self {
        Self {
            config_path: path.as_ref().to_path_buf(),
        }
    }

    /// XDGディレクトリに基づく設定ファイルパスを取得
    pub fn default_config_path() -> DanceLiveResult<PathBuf> {
        let project_dirs = ProjectDirs::from("dev", "sifyfy", "dancelive")
            .ok_or_else(|| DanceLiveError::config("Failed to get project directories"))?;

        let config_file = project_dirs.config_dir().join("config.toml");
        debug!("Config file path: {}", config_file.display());

        Ok(config_file)
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// 設定を読み込み（ファイルが無ければデフォルト）
    pub fn load_config(&self) -> DanceLiveResult<AppConfig> {
        if !self.config_path.exists() {
            info!(
                "Config file not found, using default settings: {}",
                self.config_path.display()
            );
            return Ok(AppConfig::default());
        }

        let config_content = fs::read_to_string(&self.config_path)?;
        let config: AppConfig = toml::from_str(&config_content)?;
        config.validate()?;

        info!(
            "✅ Configuration loaded from: {}",
            self.config_path.display()
        );

        Ok(config)
    }

    /// 設定を保存
    pub fn save_config(&self, config: &AppConfig) -> DanceLiveResult<()> {
        config.validate()?;

        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, config_content)?;

        info!("💾 Configuration saved to: {}", self.config_path.display());
        Ok(())
    }
}
