use anyhow::Result;

use crate::core::config::ConsoleConfig;
use crate::core::terminal::{GuideSection, print_success};

pub fn run(args: &[String]) -> Result<()> {
    let path = ConsoleConfig::default_path();

    match args.first().map(String::as_str) {
        Some("set") => {
            let (Some(key), Some(value)) = (args.get(1), args.get(2)) else {
                anyhow::bail!("Usage: bankops config set <key> <value>");
            };
            let mut config = ConsoleConfig::read_file(&path)?;
            config.set_field(key, value)?;
            config.save_to(&path)?;
            print_success(&format!("{} updated in {}.", key, path.display()));
        }
        Some("path") => println!("{}", path.display()),
        _ => {
            let config = ConsoleConfig::load()?;
            let timeout = config
                .request_timeout_secs
                .map(|s| format!("{}s", s))
                .unwrap_or_else(|| "none".to_string());
            GuideSection::new("Configuration")
                .status("File", &path.display().to_string())
                .status("api_url", &config.api_url)
                .status("timeout", &timeout)
                .status("log_level", &config.log_level)
                .status("reconcile", config.reconcile.as_str())
                .status("user", config.user_id.as_deref().unwrap_or("(not set)"))
                .status("role", &config.user_role)
                .status("co_code_ld", config.co_code_ld.as_deref().unwrap_or("(not set)"))
                .blank()
                .hint("bankops config set api_url https://ops.example.com/api", "")
                .hint("bankops config set reconcile local", "merge server answers instead of reloading")
                .print();
            println!();
        }
    }
    Ok(())
}
