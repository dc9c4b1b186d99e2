//! dancelive CLI
//!
//! ダンスコーチング配信のスコア・コメントシミュレーションを実行する。

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use dancelive::{
    utils, AppConfig, Clock, ConfigManager, DonationAmount, LiveSession, ManualClock,
    RandomSource, SessionDriver, SessionRole, SharedSession, StdRandom, SystemClock,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "dancelive")]
#[command(about = "Realtime dance-coaching session simulator")]
#[command(version)]
struct Cli {
    /// 設定ファイル（省略時はXDG設定ディレクトリ）
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 手動クロックで高速にシミュレーション
    Simulate {
        #[command(flatten)]
        session: SessionArgs,

        /// 出力形式
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// 実時間で駆動してサンプルをログ出力
    Live {
        #[command(flatten)]
        session: SessionArgs,
    },
}

#[derive(clap::Args)]
struct SessionArgs {
    #[arg(long, value_enum, default_value_t = RoleArg::Viewer)]
    role: RoleArg,

    /// 実行時間（秒）
    #[arg(long, default_value_t = 60)]
    duration: u64,

    /// 乱数シード（省略時はランダム）
    #[arg(long)]
    seed: Option<u64>,

    /// 投げ銭予約 `<秒>:<円>`（例: 20:500）
    #[arg(long = "donate", value_parser = parse_donation)]
    donations: Vec<ScheduledDonation>,
}

impl SessionArgs {
    /// 投げ銭予約が実行時間内にあるか確認
    fn validate(&self) -> Result<()> {
        if let Some(late) = self.donations.iter().find(|d| d.at_secs > self.duration) {
            anyhow::bail!(
                "Donation at {}s is scheduled after the end of the run (--duration {})",
                late.at_secs,
                self.duration
            );
        }
        Ok(())
    }

    fn donations_at(&self, elapsed: u64) -> impl Iterator<Item = &ScheduledDonation> {
        self.donations.iter().filter(move |d| d.at_secs == elapsed)
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum RoleArg {
    Streamer,
    Viewer,
}

impl From<RoleArg> for SessionRole {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Streamer => SessionRole::Streamer,
            RoleArg::Viewer => SessionRole::Viewer,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy)]
struct ScheduledDonation {
    at_secs: u64,
    amount: DonationAmount,
}

fn parse_donation(value: &str) -> Result<ScheduledDonation, String> {
    let (at, yen) = value
        .split_once(':')
        .ok_or_else(|| format!("expected <secs>:<yen>, got '{}'", value))?;
    let at_secs = at
        .trim()
        .parse::<u64>()
        .map_err(|e| format!("invalid time '{}': {}", at, e))?;
    let yen = yen
        .trim()
        .parse::<u64>()
        .map_err(|e| format!("invalid amount '{}': {}", yen, e))?;
    let amount = DonationAmount::try_from(yen).map_err(|e| e.to_string())?;
    Ok(ScheduledDonation { at_secs, amount })
}

fn load_config(path: Option<&PathBuf>) -> Result<AppConfig> {
    let manager = match path {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new().context("Failed to resolve config directory")?,
    };
    manager
        .load_config()
        .with_context(|| format!("Failed to load config: {}", manager.config_path().display()))
}

fn build_rng(seed: Option<u64>) -> Box<dyn RandomSource> {
    match seed {
        Some(seed) => Box::new(StdRandom::seeded(seed)),
        None => Box::new(StdRandom::from_entropy()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    // ファイル出力時はガードを最後まで保持する
    let _log_guard = utils::init_logging(&config.log).context("Failed to initialize logging")?;

    tracing::info!("🎬 Starting dancelive - Dance coaching session simulator");

    match cli.command {
        Commands::Simulate { session, format } => run_simulation(&config, &session, format),
        Commands::Live { session } => run_live(&config, &session).await,
    }
}

/// `elapsed`秒に予約された投げ銭を反映し、反映件数を返す
fn apply_scheduled_donations(
    session: &mut LiveSession,
    args: &SessionArgs,
    elapsed: u64,
    now: DateTime<Utc>,
) -> Result<usize> {
    let mut applied = 0;
    for donation in args.donations_at(elapsed) {
        let outcome = session
            .donate(donation.amount, now)
            .with_context(|| format!("Donation at {}s failed", elapsed))?;
        tracing::info!(
            at_secs = elapsed,
            amount = %outcome.amount,
            score = outcome.sample.as_ref().map(|s| s.score),
            "💰 {}",
            outcome.feedback
        );
        applied += 1;
    }
    Ok(applied)
}

/// 1秒刻みで手動クロックを進めるシミュレーション
fn run_simulation(config: &AppConfig, args: &SessionArgs, format: OutputFormat) -> Result<()> {
    args.validate()?;

    let clock = ManualClock::new(Utc::now());
    let mut session = LiveSession::new(args.role.into(), config, build_rng(args.seed));
    session.start(clock.now());
    apply_scheduled_donations(&mut session, args, 0, clock.now())?;

    for elapsed in 1..=args.duration {
        let now = clock.advance(chrono::Duration::seconds(1));
        session.advance(now);
        apply_scheduled_donations(&mut session, args, elapsed, now)?;
    }

    let now = clock.now();
    let snapshot = session.snapshot(now);
    let insights = session.insights();

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "snapshot": snapshot,
                "insights": insights,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            println!(
                "{} {} session ({}s simulated)",
                snapshot.role.icon(),
                snapshot.role.to_string(),
                args.duration
            );
            for sample in &snapshot.samples {
                println!(
                    "{}  {} {:5.1}  {:>8}  💬{:<4} 😊{:.2}",
                    sample.timestamp.format("%H:%M:%S"),
                    utils::score_bar(sample.score),
                    sample.score,
                    utils::format_yen(sample.donation_amount),
                    sample.comment_count,
                    sample.emotion_avg
                );
            }
            for comment in &snapshot.comments {
                println!(
                    "{} {}: {}",
                    comment.emotion.icon(),
                    comment.username,
                    comment.text
                );
            }
            if let Some(feedback) = &snapshot.feedback {
                println!("🗣️ {}", feedback);
            }
            println!();
            print!("{}", insights);
        }
    }

    session.stop();
    Ok(())
}

/// 実時間ドライバーで駆動
async fn run_live(config: &AppConfig, args: &SessionArgs) -> Result<()> {
    args.validate()?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let session: SharedSession =
        LiveSession::new(args.role.into(), config, build_rng(args.seed)).into_shared();
    {
        let mut guard = session.lock();
        let now = clock.now();
        guard.start(now);
        if let Err(e) = apply_scheduled_donations(&mut guard, args, 0, now) {
            tracing::warn!("投げ銭を処理できませんでした: {:#}", e);
        }
    }

    let driver = SessionDriver::spawn(session.clone(), clock.clone(), driver_resolution(config));

    let mut monitor = tokio::time::interval(Duration::from_secs(1));
    let mut last_logged = None;
    let mut elapsed = 0u64;

    // 最初のtickは即時に完了する
    monitor.tick().await;

    let shutdown_signal = tokio::signal::ctrl_c();
    tokio::pin!(shutdown_signal);

    loop {
        tokio::select! {
            _ = &mut shutdown_signal => {
                tracing::info!("🛑 終了シグナルを受信しました");
                break;
            }
            _ = monitor.tick() => {
                elapsed += 1;
                let now = clock.now();
                let mut guard = session.lock();

                if let Err(e) = apply_scheduled_donations(&mut guard, args, elapsed, now) {
                    tracing::warn!("投げ銭を処理できませんでした: {:#}", e);
                }

                if let Some(sample) = guard.latest_sample() {
                    if last_logged != Some(sample.timestamp) {
                        last_logged = Some(sample.timestamp);
                        tracing::info!(
                            score = sample.score,
                            donations = sample.donation_amount,
                            comments = sample.comment_count,
                            emotion = sample.emotion_avg,
                            "📈 New sample"
                        );
                    }
                }
                for comment in guard.comments() {
                    tracing::debug!(id = %comment.id, "{} {}: {}", comment.emotion.icon(), comment.username, comment.text);
                }
                drop(guard);

                if elapsed >= args.duration {
                    break;
                }
            }
        }
    }

    driver.shutdown().await;

    let report = {
        let mut guard = session.lock();
        let report = guard.insights();
        guard.stop();
        report
    };
    print!("{}", report);

    tracing::info!("👋 dancelive shutting down");
    Ok(())
}

/// 最短周期の1/10（10ms〜250ms）でadvanceを呼ぶ
fn driver_resolution(config: &AppConfig) -> Duration {
    let shortest = [
        config.score.tick_interval_ms,
        config.comments.spawn_interval_ms,
        config.comments.lifetime_ms,
        config.feedback.rotation_interval_ms,
        config.feedback.donation_display_ms,
    ]
    .into_iter()
    .min()
    .unwrap_or(1_000);
    Duration::from_millis((shortest / 10).clamp(10, 250))
}
