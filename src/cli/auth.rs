use anyhow::Result;
use console::style;

use super::parse_args;
use crate::core::credentials::{SESSION_TOKEN_ENV, TOKEN_KEY, VaultTokenStore};
use crate::core::terminal::{print_info, print_success, print_warn};

pub async fn login(args: &[String]) -> Result<()> {
    let parsed = parse_args(args, &["--token"]);
    let token = match parsed.value("--token") {
        Some(token) => token.trim().to_string(),
        None => inquire::Password::new("Access token:")
            .without_confirmation()
            .with_help_message("Paste the token issued by the VPBank identity portal")
            .prompt()?
            .trim()
            .to_string(),
    };
    if token.is_empty() {
        println!("  No token provided. Aborting.");
        return Ok(());
    }

    if parsed.has("--session") {
        // A child process cannot change its parent's environment.
        print_info("Session tokens live in your shell. Run:");
        println!(
            "\n  {}\n",
            style(format!("export {}={}", SESSION_TOKEN_ENV, token)).green()
        );
        return Ok(());
    }

    let vault = VaultTokenStore::open_default()?;
    vault.set_secret(TOKEN_KEY, &token).await?;
    print_success(&format!("Token saved to {}.", vault.path().display()));
    Ok(())
}

pub async fn logout() -> Result<()> {
    let vault = VaultTokenStore::open_default()?;
    if vault.remove_secret(TOKEN_KEY).await? {
        print_success("Stored token removed.");
    } else {
        print_info("No stored token.");
    }
    if std::env::var(SESSION_TOKEN_ENV).is_ok_and(|v| !v.trim().is_empty()) {
        print_warn(&format!(
            "{} is still set in this shell; unset it to log out completely.",
            SESSION_TOKEN_ENV
        ));
    }
    Ok(())
}
