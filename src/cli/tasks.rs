use anyhow::{Result, bail};
use chrono::Utc;
use console::style;

use super::{Context, ParsedArgs, parse_args};
use crate::core::automation::{
    AutomationTask, AutomationTaskService, CreateTaskRequest, Frequency, TaskEvent,
    TaskResultStatus, TaskStatus, UpdateTaskRequest,
};
use crate::core::store::AutomationTaskStore;
use crate::core::terminal::{GuideSection, print_info, print_success, print_warn};

const VALUE_FLAGS: &[&str] = &[
    "--title",
    "--instruction",
    "--category",
    "--at",
    "--every",
    "--time",
    "--day",
    "--date",
    "--status",
];

fn print_usage() {
    GuideSection::new("bankops tasks")
        .command("list", "List tasks [--status active|inactive]")
        .command("create", "--title T --instruction I <trigger> [--category C]")
        .command("update", "<id> [--title T] [--instruction I] [--category C] [<trigger>]")
        .command("activate", "<id>")
        .command("deactivate", "<id>")
        .command("delete", "<id>")
        .command("run", "<id>  Execute now and refresh the list")
        .command("execute", "<id> [--legacy]  Execute and print the result")
        .blank()
        .text("Triggers:")
        .hint("--at 2025-07-07T09:00:00Z", "run once")
        .hint("--every daily --time 09:00", "")
        .hint("--every weekly --time 09:00 --day MON", "")
        .hint("--every monthly --time 09:00 --date 15", "")
        .print();
}

/// `MON`, `monday`, `Mon` or `1`, as 0 = Sunday .. 6 = Saturday.
pub(crate) fn parse_weekday(value: &str) -> Option<u8> {
    let value = value.trim().to_ascii_lowercase();
    if let Ok(n) = value.parse::<u8>() {
        return (n < 7).then_some(n);
    }
    ["sun", "mon", "tue", "wed", "thu", "fri", "sat"]
        .iter()
        .position(|day| value.get(..3) == Some(*day))
        .map(|i| i as u8)
}

/// Builds the trigger from `--at` or `--every`. `Ok(None)` when neither was given.
pub(crate) fn parse_event(args: &ParsedArgs) -> Result<Option<TaskEvent>> {
    match (args.value("--at"), args.value("--every")) {
        (Some(_), Some(_)) => bail!("use either --at or --every, not both"),
        (Some(at), None) => {
            chrono::DateTime::parse_from_rfc3339(at)
                .map_err(|e| anyhow::anyhow!("--at must be an RFC 3339 timestamp: {}", e))?;
            Ok(Some(TaskEvent::once(at)))
        }
        (None, Some(every)) => {
            let frequency = Frequency::from_name(every)
                .ok_or_else(|| anyhow::anyhow!("--every must be daily, weekly or monthly"))?;
            let time = args
                .value("--time")
                .ok_or_else(|| anyhow::anyhow!("--time HH:MM is required with --every"))?;
            chrono::NaiveTime::parse_from_str(time, "%H:%M")
                .map_err(|_| anyhow::anyhow!("--time must look like 09:00"))?;

            let mut event = TaskEvent::recurring(frequency, time);
            match frequency {
                Frequency::Weekly => {
                    let day = args
                        .value("--day")
                        .ok_or_else(|| anyhow::anyhow!("--day is required for weekly tasks"))?;
                    let day = parse_weekday(day)
                        .ok_or_else(|| anyhow::anyhow!("unknown day '{}'", day))?;
                    event = event.on_day_of_week(day);
                }
                Frequency::Monthly => {
                    let date = args
                        .value("--date")
                        .and_then(|d| d.parse::<u32>().ok())
                        .filter(|d| (1..=31).contains(d))
                        .ok_or_else(|| anyhow::anyhow!("--date 1..31 is required for monthly tasks"))?;
                    event = event.on_day_of_month(date);
                }
                Frequency::Daily => {}
            }
            Ok(Some(event))
        }
        (None, None) => Ok(None),
    }
}

fn status_label(status: TaskStatus) -> String {
    match status {
        TaskStatus::Active => style("active").green().to_string(),
        TaskStatus::Inactive => style("inactive").dim().to_string(),
    }
}

fn print_task(task: &AutomationTask) {
    let next = if task.is_active() {
        task.trigger_config
            .next_run_after(Utc::now())
            .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
            .unwrap_or_else(|| "-".to_string())
    } else {
        "-".to_string()
    };
    let last = task
        .last_executed
        .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "never".to_string());

    println!(
        "  {} {} [{}]",
        style("→").cyan(),
        style(&task.title).white().bold(),
        status_label(task.status)
    );
    println!("      id: {}  category: {}", style(&task.id).dim(), task.category);
    println!("      {}", task.trigger_config.describe());
    println!("      next run: {}  last run: {}", next, last);
    if let Some(result) = task.latest_result() {
        let marker = match result.status {
            TaskResultStatus::Success => style("✓").green(),
            TaskResultStatus::Error => style("✗").red(),
        };
        let first_line = result.output.lines().next().unwrap_or_default();
        println!("      {} {}", marker, style(first_line).dim());
    }
}

fn required_id<'a>(args: &'a ParsedArgs, usage: &str) -> Result<&'a str> {
    args.positional(0)
        .ok_or_else(|| anyhow::anyhow!("Usage: bankops tasks {}", usage))
}

pub async fn run(ctx: &Context, args: &[String]) -> Result<()> {
    let sub_cmd = args.first().map(String::as_str).unwrap_or("");
    if matches!(sub_cmd, "" | "help" | "--help") {
        print_usage();
        return Ok(());
    }
    let parsed = parse_args(args.get(1..).unwrap_or_default(), VALUE_FLAGS);

    let service = AutomationTaskService::new(ctx.api.clone());
    let operator = ctx.operator()?;
    let mut store = AutomationTaskStore::new(service.clone(), operator, ctx.config.reconcile);

    match sub_cmd {
        "list" | "ls" => {
            store.fetch_tasks().await?;
            let wanted = match parsed.value("--status") {
                Some("active") => Some(TaskStatus::Active),
                Some("inactive") => Some(TaskStatus::Inactive),
                Some(other) => bail!("unknown status '{}'", other),
                None => None,
            };
            let tasks: Vec<&AutomationTask> = store
                .tasks()
                .iter()
                .filter(|t| wanted.is_none_or(|s| t.status == s))
                .collect();

            if ctx.json {
                return ctx.print_json(&tasks);
            }
            if tasks.is_empty() {
                println!("  {} No automation tasks.", style("●").dim());
                return Ok(());
            }
            println!(
                "\n  {} Automation tasks for '{}':\n",
                style("●").cyan(),
                style(&store.operator().user_id).bold()
            );
            for task in tasks {
                print_task(task);
            }
            println!();
        }
        "create" => {
            let event = parse_event(&parsed)?
                .ok_or_else(|| anyhow::anyhow!("a trigger is required (--at or --every)"))?;
            let mut request = CreateTaskRequest::new(
                &store.operator().user_id,
                parsed.value("--title").unwrap_or_default(),
                parsed.value("--instruction").unwrap_or_default(),
                event,
            );
            if let Some(category) = parsed.value("--category") {
                request = request.with_category(category);
            }
            let task = store.create_task(&request).await?;
            if ctx.json {
                return ctx.print_json(&task);
            }
            print_success(&format!("Task '{}' created (id: {}).", task.title, task.id));
            print_task(&task);
        }
        "update" => {
            let id = required_id(&parsed, "update <id> [options]")?;
            let patch = UpdateTaskRequest {
                title: parsed.value("--title").map(str::to_string),
                instruction: parsed.value("--instruction").map(str::to_string),
                category: parsed.value("--category").map(str::to_string),
                event: parse_event(&parsed)?,
                ..Default::default()
            };
            let task = store.update_task(id, &patch).await?;
            if ctx.json {
                return ctx.print_json(&task);
            }
            print_success(&format!("Task '{}' updated.", task.id));
            print_task(&task);
        }
        "activate" | "deactivate" => {
            let id = required_id(&parsed, &format!("{} <id>", sub_cmd))?;
            if sub_cmd == "activate" {
                store.activate_task(id).await?;
                print_success(&format!("Task '{}' activated.", id));
            } else {
                store.deactivate_task(id).await?;
                print_success(&format!("Task '{}' deactivated.", id));
            }
        }
        "delete" | "rm" => {
            let id = required_id(&parsed, "delete <id>")?;
            store.delete_task(id).await?;
            print_success(&format!("Task '{}' deleted.", id));
        }
        "run" => {
            let id = required_id(&parsed, "run <id>")?;
            store.fetch_tasks().await?;
            let resp = store.execute_task_immediately(id).await?;
            if ctx.json {
                return ctx.print_json(&resp);
            }
            if resp.success {
                print_success(&format!("Task '{}' executed.", id));
            } else {
                print_warn(store.error().unwrap_or("Task execution failed"));
            }
            if !resp.message.is_empty() {
                print_info(&resp.message);
            }
            if let Some(execution_id) = &resp.execution_id {
                println!("  execution: {}", style(execution_id).dim());
            }
            if let Some(task) = store.task(id) {
                print_task(task);
            }
        }
        "execute" | "exec" => {
            let id = required_id(&parsed, "execute <id> [--legacy]")?;
            if parsed.has("--legacy") {
                let body = service.execute_legacy(id).await?;
                return ctx.print_json(&body);
            }
            store.fetch_tasks().await?;
            #[allow(deprecated)]
            let result = store.execute_task(id).await?;
            if ctx.json {
                return ctx.print_json(&result);
            }
            match result.status {
                TaskResultStatus::Success => print_success(&format!(
                    "Execution {} finished in {} ms.",
                    result.id, result.duration
                )),
                TaskResultStatus::Error => print_warn(&format!("Execution {} failed.", result.id)),
            }
            println!("{}", result.output);
            if let Some(location) = &result.content_location {
                println!("  content: {}", style(location).dim());
            }
        }
        _ => print_usage(),
    }

    Ok(())
}
