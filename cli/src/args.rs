//! Command line parsing

use anyhow::{anyhow, bail, Result};
use std::path::PathBuf;

pub const USAGE: &str = "usage: wallnance [--data-dir DIR] <command>

commands:
  status              balance, level, rewards and portfolio
  daily               claim today's login bonus
  lessons             list lessons
  lesson <id>         complete a lesson
  quiz <id>           pass a lesson's quiz
  claim               move unclaimed rewards into the wallet
  buy <SYM> <coins>   spend coins on an asset
  sell <SYM> <qty>    sell units of an asset
  market [--ticks N]  advance prices N ticks (default 0) and show them";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Status,
    Daily,
    Lessons,
    Lesson(String),
    Quiz(String),
    Claim,
    Buy { symbol: String, coins: f64 },
    Sell { symbol: String, quantity: f64 },
    Market { ticks: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Args {
    pub data_dir: Option<PathBuf>,
    pub command: Command,
}

pub fn parse<I>(args: I) -> Result<Args>
where
    I: IntoIterator<Item = String>,
{
    let mut data_dir = None;
    let mut words = Vec::new();
    let mut it = args.into_iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--data-dir" => {
                let dir = it.next().ok_or_else(|| anyhow!("--data-dir needs a value"))?;
                data_dir = Some(PathBuf::from(dir));
            }
            _ => words.push(arg),
        }
    }

    let mut words = words.into_iter();
    let name = words.next().ok_or_else(|| anyhow!("missing command"))?;
    let command = match name.as_str() {
        "status" => Command::Status,
        "daily" => Command::Daily,
        "lessons" => Command::Lessons,
        "claim" => Command::Claim,
        "lesson" => Command::Lesson(required(&mut words, "lesson id")?),
        "quiz" => Command::Quiz(required(&mut words, "lesson id")?),
        "buy" => Command::Buy {
            symbol: required(&mut words, "symbol")?,
            coins: number(&required(&mut words, "coin amount")?)?,
        },
        "sell" => Command::Sell {
            symbol: required(&mut words, "symbol")?,
            quantity: number(&required(&mut words, "quantity")?)?,
        },
        "market" => {
            let mut ticks = 0;
            while let Some(word) = words.next() {
                match word.as_str() {
                    "--ticks" => {
                        let n = required(&mut words, "tick count")?;
                        ticks = n.parse().map_err(|_| anyhow!("invalid tick count: {}", n))?;
                    }
                    other => bail!("unexpected argument: {}", other),
                }
            }
            Command::Market { ticks }
        }
        other => bail!("unknown command: {}", other),
    };

    if let Some(extra) = words.next() {
        bail!("unexpected argument: {}", extra);
    }

    Ok(Args { data_dir, command })
}

fn required(words: &mut impl Iterator<Item = String>, what: &str) -> Result<String> {
    words.next().ok_or_else(|| anyhow!("missing {}", what))
}

fn number(s: &str) -> Result<f64> {
    s.parse().map_err(|_| anyhow!("not a number: {}", s))
}
