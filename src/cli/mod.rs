mod admin;
mod auth;
mod knowledge;
mod settings;
mod tasks;

use anyhow::Result;
use console::style;
use serde::Serialize;
use std::sync::Arc;
use tracing::Level;

use crate::api::ApiClient;
use crate::core::config::ConsoleConfig;
use crate::core::credentials::{
    ChainedCredentials, CredentialProvider, EnvToken, VaultTokenStore,
};
use crate::core::store::Operator;
use crate::core::terminal::{self, GuideSection, print_error};
use crate::logging::{init_logging, parse_level};
use crate::platform::{NativePlatform, Platform};

fn print_help() {
    terminal::print_banner();

    GuideSection::new("Automation")
        .command("tasks list", "List your automation tasks")
        .command("tasks create", "Schedule a new task")
        .command("tasks update", "Change a task's title, instruction or trigger")
        .command("tasks activate", "Resume a task")
        .command("tasks deactivate", "Pause a task")
        .command("tasks delete", "Remove a task")
        .command("tasks run", "Execute a task now")
        .command("tasks execute", "Execute a task and print its result")
        .print();

    GuideSection::new("Knowledge base")
        .command("kb list", "List knowledge entries")
        .command("kb add", "Add a text entry")
        .command("kb upload", "Upload a document")
        .command("kb update", "Rename or re-describe an entry")
        .command("kb delete", "Remove an entry")
        .command("kb show", "Print an entry's content")
        .command("kb check", "Check whether a file can be uploaded")
        .print();

    GuideSection::new("Administration")
        .command("logs", "Show system logs")
        .command("billing", "Show daily costs")
        .print();

    GuideSection::new("Setup")
        .command("login", "Store your access token")
        .command("logout", "Forget the stored token")
        .command("config", "Show or change settings")
        .print();

    GuideSection::new("Global options")
        .bullet("--api-url <url>   Use another backend for this run")
        .bullet("--user <id>       Act as this user")
        .bullet("--json            Print raw JSON")
        .bullet("--verbose, -v     Debug logging on stderr")
        .print();

    println!(
        "\n {} {} <command> [subcommand]\n",
        style("Usage:").bold(),
        style(NativePlatform::binary_name()).green()
    );
}

/// Flags accepted anywhere on the command line, split from the rest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct GlobalArgs {
    pub api_url: Option<String>,
    pub user: Option<String>,
    pub verbose: bool,
    pub json: bool,
    pub rest: Vec<String>,
}

pub(crate) fn split_global_flags(args: &[String]) -> GlobalArgs {
    let mut globals = GlobalArgs::default();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--api-url" => {
                if i + 1 < args.len() {
                    globals.api_url = Some(args[i + 1].clone());
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "--user" | "-u" => {
                if i + 1 < args.len() {
                    globals.user = Some(args[i + 1].clone());
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "--verbose" | "-v" => {
                globals.verbose = true;
                i += 1;
            }
            "--json" => {
                globals.json = true;
                i += 1;
            }
            _ => {
                globals.rest.push(args[i].clone());
                i += 1;
            }
        }
    }
    globals
}

/// Positional arguments plus `--flag value` options of one subcommand.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ParsedArgs {
    pub positionals: Vec<String>,
    options: Vec<(String, String)>,
    switches: Vec<String>,
}

impl ParsedArgs {
    pub fn value(&self, name: &str) -> Option<&str> {
        self.options
            .iter()
            .rev()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has(&self, name: &str) -> bool {
        self.switches.iter().any(|s| s == name)
    }

    pub fn positional(&self, index: usize) -> Option<&str> {
        self.positionals.get(index).map(String::as_str)
    }
}

/// `value_flags` take the next argument as their value; any other `--x` is a
/// switch. A value flag at the end of the line is treated as a switch.
pub(crate) fn parse_args(args: &[String], value_flags: &[&str]) -> ParsedArgs {
    let mut parsed = ParsedArgs::default();
    let mut i = 0;
    while i < args.len() {
        let arg = args[i].as_str();
        if value_flags.contains(&arg) && i + 1 < args.len() {
            parsed.options.push((arg.to_string(), args[i + 1].clone()));
            i += 2;
        } else if arg.starts_with("--") {
            parsed.switches.push(arg.to_string());
            i += 1;
        } else {
            parsed.positionals.push(arg.to_string());
            i += 1;
        }
    }
    parsed
}

/// What every backend-facing command needs.
pub(crate) struct Context {
    pub config: ConsoleConfig,
    pub api: ApiClient,
    pub json: bool,
    user: Option<String>,
}

impl Context {
    fn new(config: ConsoleConfig, globals: &GlobalArgs) -> Result<Self> {
        let vault = VaultTokenStore::open_default()?;
        let credentials: Arc<dyn CredentialProvider> = Arc::new(
            ChainedCredentials::new()
                .with(Arc::new(EnvToken::session()))
                .with(Arc::new(vault)),
        );
        let mut api = ApiClient::new(&config.api_url, credentials);
        if let Some(timeout) = config.request_timeout() {
            api = api.with_timeout(timeout);
        }
        Ok(Self {
            user: globals.user.clone().or_else(|| config.user_id.clone()),
            config,
            api,
            json: globals.json,
        })
    }

    pub fn operator(&self) -> Result<Operator> {
        let user_id = self
            .user
            .clone()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| {
                anyhow::anyhow!("No user set. Pass --user <id> or run `bankops config set user <id>`.")
            })?;
        Ok(Operator {
            user_id,
            user_role: self.config.user_role.clone(),
            co_code_ld: self.config.co_code_ld.clone(),
        })
    }

    pub fn print_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

pub async fn run_main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let globals = split_global_flags(&args);

    let mut config = ConsoleConfig::load()?;
    if let Some(url) = &globals.api_url {
        config.api_url = url.trim().to_string();
        config.validate()?;
    }

    let level = if globals.verbose {
        Level::DEBUG
    } else {
        parse_level(&config.log_level)
    };
    init_logging(level, Some(&ConsoleConfig::log_file()), globals.verbose);

    let cmd = globals.rest.first().map(String::as_str).unwrap_or("help");
    let rest = globals.rest.get(1..).unwrap_or_default();

    match cmd {
        "tasks" | "task" => tasks::run(&Context::new(config, &globals)?, rest).await,
        "kb" | "knowledge" => knowledge::run(&Context::new(config, &globals)?, rest).await,
        "logs" => admin::run_logs(&Context::new(config, &globals)?, rest).await,
        "billing" => admin::run_billing(&Context::new(config, &globals)?).await,
        "login" => auth::login(rest).await,
        "logout" => auth::logout().await,
        "config" => settings::run(rest),
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        other => {
            print_error(&format!("Unknown command '{}'.", other));
            print_help();
            Ok(())
        }
    }
}
