//! 固定のコメント・フィードバック文面

use crate::models::{CommentTemplate, DonationAmount, Emotion};

/// 視聴者コメントのテンプレート
pub const COMMENT_TEMPLATES: [CommentTemplate; 10] = [
    CommentTemplate { username: "ダンサーA", text: "すごい！", emotion: Emotion::Positive },
    CommentTemplate { username: "ユーザーB", text: "かっこいい！", emotion: Emotion::Positive },
    CommentTemplate { username: "ビギナーC", text: "リズム感抜群", emotion: Emotion::Positive },
    CommentTemplate { username: "ファンD", text: "投げ銭します！", emotion: Emotion::Positive },
    CommentTemplate { username: "視聴者E", text: "キレッキレ！", emotion: Emotion::Positive },
    CommentTemplate { username: "見習いF", text: "うますぎる…", emotion: Emotion::Positive },
    CommentTemplate { username: "リスナーG", text: "NICE!", emotion: Emotion::Positive },
    CommentTemplate { username: "匿名H", text: "最高です！", emotion: Emotion::Positive },
    CommentTemplate { username: "ダンス好きI", text: "参考にします", emotion: Emotion::Neutral },
    CommentTemplate { username: "ファンJ", text: "見てて楽しい", emotion: Emotion::Positive },
];

/// 配信者向けの定期コーチングメッセージ（先頭が開始時の表示）
pub const REGULAR_FEEDBACK: [&str; 6] = [
    "いい感じ！リズムに乗れています",
    "腕の振りをもう少し大きく！",
    "ステップが正確になってきました",
    "表情も意識してみよう",
    "重心を低く保つと安定します",
    "カウントを口ずさむとタイミングが合いやすい",
];

/// 投げ銭を受けたときのお礼メッセージ
pub fn donation_feedback(amount: DonationAmount) -> &'static str {
    match amount {
        DonationAmount::Yen100 => "応援ありがとう！パワーが届きました",
        DonationAmount::Yen500 => "投げ銭ありがとう！スコアアップ！",
        DonationAmount::Yen1000 => "大きな応援！テンション最高潮！",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_are_mostly_positive() {
        let positive = COMMENT_TEMPLATES
            .iter()
            .filter(|t| t.emotion == Emotion::Positive)
            .count();
        assert_eq!(positive, 9);
    }

    #[test]
    fn test_each_donation_has_distinct_feedback() {
        let messages: std::collections::HashSet<_> =
            DonationAmount::ALL.iter().map(|a| donation_feedback(*a)).collect();
        assert_eq!(messages.len(), 3);
    }
}
