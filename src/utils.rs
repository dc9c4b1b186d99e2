// ログ初期化と表示用ユーティリティ

use crate::config::LogConfig;
use crate::error::{DanceLiveError, DanceLiveResult};
use directories::ProjectDirs;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 強化されたログ初期化
///
/// RUST_LOGが設定されていればそれを優先し、無ければ設定ファイルのレベルを使う。
/// ファイル出力を有効にした場合は返されたガードを保持し続けること。
pub fn init_logging(config: &LogConfig) -> DanceLiveResult<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| DanceLiveError::Logging(e.to_string()))?;

    let (json_layer, compact_layer) = if config.json {
        (Some(fmt::layer().json().with_target(false)), None)
    } else {
        (
            None,
            Some(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .compact(),
            ),
        )
    };

    let (file_layer, guard) = if config.enable_file_logging {
        let log_dir = match &config.log_dir {
            Some(dir) => dir.clone(),
            None => default_log_dir()?,
        };
        std::fs::create_dir_all(&log_dir)?;

        let appender = tracing_appender::rolling::daily(&log_dir, &config.log_file_prefix);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        (
            Some(fmt::layer().with_ansi(false).with_writer(writer)),
            Some(guard),
        )
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(compact_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| DanceLiveError::Logging(e.to_string()))?;

    Ok(guard)
}

/// XDGデータディレクトリ配下のログディレクトリ
pub fn default_log_dir() -> DanceLiveResult<PathBuf> {
    let project_dirs = ProjectDirs::from("dev", "sifyfy", "dancelive")
        .ok_or_else(|| DanceLiveError::Logging("Failed to get project directories".to_string()))?;
    Ok(project_dirs.data_local_dir().join("logs"))
}

/// 円表記（3桁区切り）
pub fn format_yen(amount: u64) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("¥{}", grouped)
}

/// スコアの簡易バー表示（0-100を20マスで表現）
pub fn score_bar(score: f64) -> String {
    let filled = ((score.clamp(0.0, 100.0) / 5.0).round()) as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(20 - filled))
}
