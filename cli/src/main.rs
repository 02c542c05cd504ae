//! Wallnance Tycoon - command line entry point

mod args;

use anyhow::{Context, Result};
use args::Command;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wallnance_core::{RewardTransaction, SystemClock, LESSONS};
use wallnance_engine::Game;
use wallnance_persistence::SqliteStore;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wallnance_cli=info,wallnance_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = match args::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {}\n\n{}", e, args::USAGE);
            std::process::exit(2);
        }
    };

    let data_dir = args.data_dir.unwrap_or_else(default_data_dir);
    let db_path = data_dir.join("wallnance.db");
    tracing::debug!("Using database at {}", db_path.display());

    let store = Arc::new(
        SqliteStore::connect(&db_path)
            .await
            .with_context(|| format!("opening {}", db_path.display()))?,
    );
    let game = Game::open(store, Arc::new(SystemClock)).await?;

    run(&game, args.command).await
}

fn default_data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("WALLNANCE_DATA_DIR") {
        return PathBuf::from(dir);
    }
    dirs_next::data_local_dir()
        .map(|p| p.join("Wallnance"))
        .unwrap_or_else(|| PathBuf::from("."))
}

async fn run(game: &Game<SqliteStore>, command: Command) -> Result<()> {
    match command {
        Command::Status => {
            let status = game.status().await;
            let p = &status.portfolio;
            println!(
                "Level {} ({}/{} pts) | {} points | {} WLC | streak {} (best {}) | x{:.2}",
                status.level.level,
                status.level.current_level_points,
                status.level.next_level_points,
                status.total_points,
                status.total_wlc,
                status.current_streak,
                status.max_streak,
                status.reward_multiplier,
            );
            println!(
                "Balance {:.2} | holdings {:.2} ({}) | total {:.2} | P/L {:+.2} ({:+.2}%)",
                p.balance,
                p.holdings_value,
                p.holdings_count,
                p.total_value,
                p.total_profit_loss,
                p.total_profit_loss_pct,
            );
            println!(
                "Unclaimed: {} points, {} coins, {} WLC | achievements: {}",
                status.unclaimed.points,
                status.unclaimed.coins,
                status.unclaimed.wlc,
                status.achievements_unlocked,
            );
            for c in &status.challenges {
                let mark = if c.completed { "x" } else { " " };
                println!("[{}] {} ({}/{}, {} pts)", mark, c.description, c.progress, c.target, c.points);
            }
        }
        Command::Daily => {
            let login = game.daily_login().await?;
            if login.bonus.claimed {
                println!(
                    "Daily bonus: {} points, streak {}",
                    login.bonus.points, login.bonus.streak
                );
            } else {
                println!("Daily bonus already claimed today (streak {})", login.bonus.streak);
            }
            print_rewards(&login.extra_rewards);
        }
        Command::Lessons => {
            let progress = game.progress().snapshot().await;
            for lesson in LESSONS {
                let done = if progress.completed_lessons.contains(lesson.id) { "x" } else { " " };
                let quiz = if progress.passed_quizzes.contains(lesson.id) { "x" } else { " " };
                println!(
                    "[{}][{}] {:<18} {} ({} pts, quiz {})",
                    done, quiz, lesson.id, lesson.title, lesson.points, lesson.quiz_points
                );
            }
        }
        Command::Lesson(id) => {
            let granted = game.complete_lesson(&id).await?;
            if granted.is_empty() {
                println!("Lesson {} already completed", id);
            }
            print_rewards(&granted);
        }
        Command::Quiz(id) => {
            let granted = game.pass_quiz(&id).await?;
            if granted.is_empty() {
                println!("Quiz for {} already passed", id);
            }
            print_rewards(&granted);
        }
        Command::Claim => {
            let claimed = game.claim().await?;
            if claimed.is_empty() {
                println!("Nothing to claim");
            } else {
                println!(
                    "Claimed {} points: +{} coins, +{} WLC. Balance {:.2}",
                    claimed.points,
                    claimed.coins,
                    claimed.wlc,
                    game.wallet().balance().await
                );
            }
        }
        Command::Buy { symbol, coins } => {
            let outcome = game.buy(&symbol, coins).await?;
            let r = &outcome.record;
            println!("Bought {} {} @ {:.4} for {:.2}", r.quantity, r.symbol, r.price, r.total);
            print_rewards(&outcome.rewards);
        }
        Command::Sell { symbol, quantity } => {
            let outcome = game.sell(&symbol, quantity).await?;
            let r = &outcome.record;
            println!("Sold {} {} @ {:.4} for {:.2}", r.quantity, r.symbol, r.price, r.total);
            print_rewards(&outcome.rewards);
        }
        Command::Market { ticks } => {
            for _ in 0..ticks {
                game.market().tick().await?;
            }
            let market = game.market().snapshot().await;
            println!("Tick {}", market.tick_count());
            for asset in market.assets() {
                println!(
                    "{:<6} {:<22} {:>12.4} {:>+7.2}%",
                    asset.symbol, asset.name, asset.price, asset.change_pct
                );
            }
        }
    }
    Ok(())
}

fn print_rewards(rewards: &[RewardTransaction]) {
    for t in rewards {
        println!("  +{} points  {} ({})", t.amount, t.description, t.reward_type);
    }
}
