use std::collections::BTreeMap;

use clap::{Args, Parser, Subcommand};
use engine::{Counts, Delta, Denomination, Group, PerGroup};

use crate::error::{AppError, Result};

#[derive(Parser, Debug)]
#[command(name = "cashbox")]
#[command(about = "Keep track of the banknotes and coins you hold")]
pub struct Cli {
    /// Optional settings file path (TOML).
    #[arg(long)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show counts, totals and projections.
    Status,
    /// Add banknotes or coins.
    Deposit(EntryArgs),
    /// Take banknotes or coins out.
    Withdraw(EntryArgs),
    /// Replace the counts; denominations not given become 0.
    Set(EntryArgs),
    /// Show the most recent operations.
    Logs {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Change the savings plan.
    Plan {
        #[arg(long)]
        monthly: f64,
        #[arg(long)]
        months: u64,
    },
    /// Change the savings goal. Target 0 without deadline clears it.
    Goal {
        #[arg(long)]
        target: f64,
        #[arg(long, default_value = "")]
        deadline: String,
    },
    /// Check that consecutive log entries agree on totals.
    Audit {
        #[arg(long, default_value_t = 1000)]
        limit: usize,
    },
    /// Replace the wallet with the default one.
    Reset,
}

/// A `denomination=count` pair given on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Entry {
    pub denomination: Denomination,
    pub count: u64,
}

#[derive(Args, Debug)]
pub struct EntryArgs {
    /// Banknote entry, e.g. `--banknote 100=2`. Repeatable.
    #[arg(long = "banknote", value_parser = parse_entry)]
    pub banknotes: Vec<Entry>,
    /// Coin entry, e.g. `--coin 5=3`. Repeatable.
    #[arg(long = "coin", value_parser = parse_entry)]
    pub coins: Vec<Entry>,
    #[arg(long)]
    pub comment: Option<String>,
    /// Id of the log entry; generated when missing.
    #[arg(long)]
    pub id: Option<String>,
}

impl EntryArgs {
    /// Entries as absolute counts. Repeated denominations are summed.
    pub fn counts(&self) -> Result<Counts> {
        self.collect(Ok)
    }

    /// Entries as a delta. Repeated denominations are summed.
    pub fn delta(&self) -> Result<Delta> {
        self.collect(|count| {
            i64::try_from(count)
                .map_err(|_| AppError::InvalidEntry(format!("count {count} is too large")))
        })
    }

    fn collect<T>(&self, convert: impl Fn(u64) -> Result<T>) -> Result<PerGroup<T>> {
        let mut out = PerGroup::new();
        for (group, entries) in [(Group::Banknotes, &self.banknotes), (Group::Coins, &self.coins)] {
            let mut sums: BTreeMap<Denomination, u64> = BTreeMap::new();
            for entry in entries {
                let slot = sums.entry(entry.denomination).or_default();
                *slot = slot.checked_add(entry.count).ok_or_else(|| {
                    AppError::InvalidEntry(format!("{group} {} adds up to too much", entry.denomination))
                })?;
            }
            for (denomination, count) in sums {
                out.group_mut(group).insert(denomination, convert(count)?);
            }
        }
        Ok(out)
    }
}

/// Parse `denomination=count`.
pub fn parse_entry(raw: &str) -> std::result::Result<Entry, String> {
    let (denomination, count) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected DENOMINATION=COUNT, got `{raw}`"))?;
    let denomination = denomination
        .trim()
        .parse::<Denomination>()
        .ok()
        .filter(|d| *d > 0)
        .ok_or_else(|| format!("denomination must be a positive integer, got `{denomination}`"))?;
    let count = count
        .trim()
        .parse::<u64>()
        .map_err(|_| format!("count must be a non-negative integer, got `{count}`"))?;
    Ok(Entry {
        denomination,
        count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_entries() {
        assert_eq!(
            parse_entry("100=2").unwrap(),
            Entry {
                denomination: 100,
                count: 2
            }
        );
        assert_eq!(parse_entry(" 5 = 0 ").unwrap().count, 0);
        assert!(parse_entry("100").is_err());
        assert!(parse_entry("0=1").is_err());
        assert!(parse_entry("100=-1").is_err());
        assert!(parse_entry("abc=1").is_err());
    }

    #[test]
    fn parses_deposit_command() {
        let cli = Cli::try_parse_from([
            "cashbox",
            "deposit",
            "--banknote",
            "100=2",
            "--banknote",
            "100=1",
            "--coin",
            "5=3",
            "--comment",
            "change",
        ])
        .unwrap();
        let Command::Deposit(args) = cli.command else {
            panic!("expected deposit");
        };
        let delta = args.delta().unwrap();
        assert_eq!(delta, Delta::new().with(Group::Banknotes, 100, 3).with(Group::Coins, 5, 3));
        assert_eq!(args.comment.as_deref(), Some("change"));
    }

    #[test]
    fn set_counts_and_overflow() {
        let cli = Cli::try_parse_from(["cashbox", "set", "--coin", "10=0"]).unwrap();
        let Command::Set(args) = cli.command else {
            panic!("expected set");
        };
        assert_eq!(args.counts().unwrap(), Counts::new().with(Group::Coins, 10, 0));

        let args = EntryArgs {
            banknotes: vec![Entry {
                denomination: 100,
                count: u64::MAX,
            }],
            coins: Vec::new(),
            comment: None,
            id: None,
        };
        assert!(matches!(args.delta(), Err(AppError::InvalidEntry(_))));
    }

    #[test]
    fn parses_other_commands() {
        let cli = Cli::try_parse_from(["cashbox", "--config", "alt.toml", "logs"]).unwrap();
        assert_eq!(cli.config.as_deref(), Some("alt.toml"));
        assert!(matches!(cli.command, Command::Logs { limit: 10 }));

        let cli = Cli::try_parse_from(["cashbox", "goal", "--target", "0"]).unwrap();
        assert!(matches!(cli.command, Command::Goal { target, ref deadline } if target == 0.0 && deadline.is_empty()));
    }
}
