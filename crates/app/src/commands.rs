//! Runs one command against the queue and renders its output.
use engine::{
    ChainBreak, CommitQueue, Goal, LedgerStore, LogEntry, OperationInput, Plan, SqliteStore,
    WalletState, WalletStore,
    calculator::{rows, total},
    projection::{required_to_deadline, savings_projection},
    verify_chain,
};

use crate::{
    cli::{Command, EntryArgs},
    error::Result,
};

pub async fn run(queue: &CommitQueue<SqliteStore>, command: Command) -> Result<String> {
    let output = match command {
        Command::Status => render_status(&queue.snapshot().await?),
        Command::Deposit(args) => {
            commit(queue, with_meta(OperationInput::deposit(args.delta()?), &args)).await?
        }
        Command::Withdraw(args) => {
            commit(queue, with_meta(OperationInput::withdraw(args.delta()?), &args)).await?
        }
        Command::Set(args) => {
            commit(queue, with_meta(OperationInput::set(args.counts()?), &args)).await?
        }
        Command::Logs { limit } => {
            let store = queue.store();
            render_logs(&store.list_recent_logs(limit, store.wallet_ref()).await?)
        }
        Command::Plan { monthly, months } => {
            let wallet = queue.update_plan(Plan::new(monthly, months)?).await?;
            render_status(&wallet)
        }
        Command::Goal { target, deadline } => {
            let wallet = queue.update_goal(Goal::new(target, &deadline)?).await?;
            render_status(&wallet)
        }
        Command::Audit { limit } => {
            let store = queue.store();
            let mut entries = store.list_recent_logs(limit, store.wallet_ref()).await?;
            entries.reverse();
            render_audit(entries.len(), &verify_chain(&entries))
        }
        Command::Reset => {
            let wallet = queue.reset().await?;
            render_status(&wallet)
        }
    };
    Ok(output)
}

async fn commit(queue: &CommitQueue<SqliteStore>, op: OperationInput) -> Result<String> {
    let committed = queue.commit(op).await?;
    tracing::info!(handle = %committed.handle, "operation stored");
    Ok(render_commit(&committed.record, &committed.wallet))
}

fn with_meta(mut op: OperationInput, args: &EntryArgs) -> OperationInput {
    if let Some(comment) = &args.comment {
        op = op.comment(comment);
    }
    if let Some(id) = &args.id {
        op = op.log_id(id);
    }
    op
}

pub fn render_status(wallet: &WalletState) -> String {
    let currency = wallet.currency();
    let mut out = String::new();
    let mut group = None;
    for row in rows(wallet) {
        if group != Some(row.group) {
            out.push_str(&format!("{}:\n", row.group));
            group = Some(row.group);
        }
        out.push_str(&format!(
            "  {:>6} x {:<5} = {} {currency}\n",
            row.denomination, row.count, row.subtotal
        ));
    }
    out.push_str(&format!("Total: {} {currency}\n", total(wallet)));

    let plan = savings_projection(wallet);
    if plan.monthly > 0.0 && plan.months > 0 {
        out.push_str(&format!(
            "Plan: {} {currency}/month for {} months -> {} {currency}\n",
            plan.monthly, plan.months, plan.projected_total
        ));
    }

    if let Some(goal) = wallet.goal() {
        let pace = required_to_deadline(total(wallet) as f64, goal.target, &goal.deadline);
        let line = if pace.is_deadline_passed {
            format!(
                "Goal: {} {currency} by {} (deadline passed, {} {currency} missing)\n",
                goal.target, goal.deadline, pace.remaining
            )
        } else {
            format!(
                "Goal: {} {currency} by {} ({} days left, {:.2}/day, {:.2}/week, {:.2}/month)\n",
                goal.target,
                goal.deadline,
                pace.days_left,
                pace.required_per_day,
                pace.required_per_week,
                pace.required_per_month
            )
        };
        out.push_str(&line);
    }
    out
}

fn render_commit(record: &LogEntry, wallet: &WalletState) -> String {
    let mut out = format!(
        "{} {} ({} -> {})\n",
        record.kind,
        record.id,
        record.total_before.unwrap_or_default(),
        record.total_after
    );
    out.push_str(&render_status(wallet));
    out
}

pub fn render_logs(entries: &[LogEntry]) -> String {
    if entries.is_empty() {
        return "No operations yet.\n".to_string();
    }
    let mut out = String::new();
    for entry in entries {
        let changes = entry
            .delta
            .entries()
            .map(|(group, denomination, change)| format!("{group} {denomination}: {change:+}"))
            .collect::<Vec<_>>()
            .join(", ");
        let before = entry
            .total_before
            .map_or_else(|| "?".to_string(), |t| t.to_string());
        out.push_str(&format!(
            "{} {:<8} {before:>10} -> {:<10} {changes}",
            entry.ts,
            entry.kind.as_str(),
            entry.total_after
        ));
        if !entry.comment.is_empty() {
            out.push_str(" # ");
            out.push_str(&entry.comment);
        }
        out.push('\n');
    }
    out
}

pub fn render_audit(checked: usize, breaks: &[ChainBreak]) -> String {
    if breaks.is_empty() {
        return format!("{checked} entries checked, totals chain correctly.\n");
    }
    let mut out = format!("{checked} entries checked, {} breaks:\n", breaks.len());
    for item in breaks {
        let before = item
            .total_before
            .map_or_else(|| "missing".to_string(), |t| t.to_string());
        out.push_str(&format!(
            "  {} -> {}: total_after {} but total_before {before}\n",
            item.previous_id, item.id, item.previous_total_after
        ));
    }
    out
}
