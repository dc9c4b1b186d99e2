//! dancelive共通エラー型

use thiserror::Error;

/// ライブラリ全体のエラー型
#[derive(Debug, Error)]
pub enum DanceLiveError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("投げ銭額が不正です: ¥{0}（100 / 500 / 1000 のみ）")]
    InvalidDonationAmount(u64),

    #[error("このロールでは投げ銭を受け付けません: {0}")]
    DonationNotAccepted(String),

    #[error("I/Oエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("設定ファイルのパースに失敗しました: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("設定ファイルのシリアライズに失敗しました: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("ログ初期化エラー: {0}")]
    Logging(String),
}

impl DanceLiveError {
    /// 設定エラーを生成
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

/// ライブラリ共通のResult型
pub type DanceLiveResult<T> = Result<T, DanceLiveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = DanceLiveError::InvalidDonationAmount(300);
        assert!(err.to_string().contains("¥300"));

        let err = DanceLiveError::config("score.tick_interval_ms must be positive");
        assert!(err.to_string().contains("tick_interval_ms"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: DanceLiveError = io.into();
        assert!(matches!(err, DanceLiveError::Io(_)));
    }
}
