use anyhow::{Result, bail};
use console::style;

use super::{Context, parse_args};
use crate::core::admin::{AdminService, LogFilter, LogLevel};
use crate::core::store::AdminDataStore;
use crate::core::terminal::{GuideSection, print_warn};

fn level_label(level: LogLevel) -> String {
    let padded = format!("{:<5}", level.as_str());
    match level {
        LogLevel::Error => style(padded).red().bold().to_string(),
        LogLevel::Warn => style(padded).yellow().to_string(),
        LogLevel::Info => style(padded).cyan().to_string(),
        LogLevel::Debug => style(padded).dim().to_string(),
    }
}

fn warn_fallback(what: &str, error: Option<&str>) {
    print_warn(&format!(
        "{} unavailable ({}). Showing demo data.",
        what,
        error.unwrap_or("unknown error")
    ));
}

pub async fn run_logs(ctx: &Context, args: &[String]) -> Result<()> {
    let parsed = parse_args(args, &["--level", "--service", "--search", "--limit"]);
    let level = match parsed.value("--level") {
        Some(raw) => Some(
            LogLevel::from_name(raw)
                .ok_or_else(|| anyhow::anyhow!("unknown level '{}'", raw))?,
        ),
        None => None,
    };
    let limit = match parsed.value("--limit") {
        Some(raw) => match raw.parse::<usize>() {
            Ok(n) => Some(n),
            Err(_) => bail!("--limit must be a number"),
        },
        None => None,
    };
    let filter = LogFilter {
        level,
        service: parsed.value("--service").map(str::to_string),
        text: parsed.value("--search").map(str::to_string),
    };

    let mut store = AdminDataStore::new(AdminService::new(ctx.api.clone()));
    store.fetch_logs().await;
    let slot = store.logs();

    let mut entries = store.filtered_logs(&filter);
    if let Some(limit) = limit {
        entries.truncate(limit);
    }

    if ctx.json {
        return ctx.print_json(&entries);
    }
    if slot.using_fallback {
        warn_fallback("Log service", slot.error.as_deref());
    }
    if entries.is_empty() {
        println!("  {} No log entries match.", style("●").dim());
        return Ok(());
    }
    println!();
    for entry in entries {
        println!(
            "  {} {} {} {:>3} {:<14} {}  {}",
            style(&entry.date).dim(),
            style(&entry.time).dim(),
            level_label(entry.level),
            entry.status_code,
            style(&entry.service).magenta(),
            entry.message,
            style(format!("{} ({})", entry.user_name, entry.role)).dim()
        );
    }
    println!();
    Ok(())
}

pub async fn run_billing(ctx: &Context) -> Result<()> {
    let mut store = AdminDataStore::new(AdminService::new(ctx.api.clone()));
    store.fetch_billing().await;
    let slot = store.billing();
    let summary = store.billing_summary();

    if ctx.json {
        return ctx.print_json(&serde_json::json!({
            "entries": slot.data,
            "summary": summary,
            "usingFallback": slot.using_fallback,
        }));
    }
    if slot.using_fallback {
        warn_fallback("Billing service", slot.error.as_deref());
    }
    if slot.data.is_empty() {
        println!("  {} No billing data.", style("●").dim());
        return Ok(());
    }

    let peak_cost = summary.peak.as_ref().map(|p| p.cost).unwrap_or(0.0);
    println!();
    for entry in &slot.data {
        let width = if peak_cost > 0.0 {
            ((entry.cost / peak_cost) * 30.0).round() as usize
        } else {
            0
        };
        println!(
            "  {}  {:>10.2}  {}",
            entry.date,
            entry.cost,
            style("█".repeat(width)).green()
        );
    }

    let mut section = GuideSection::new("Summary")
        .status("Days", &summary.days.to_string())
        .status("Total", &format!("{:.2}", summary.total))
        .status("Average", &format!("{:.2}", summary.average));
    if let Some(peak) = &summary.peak {
        section = section.status("Peak", &format!("{:.2} on {}", peak.cost, peak.date));
    }
    section.print();
    println!();
    Ok(())
}
