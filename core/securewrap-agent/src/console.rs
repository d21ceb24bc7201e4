//! User interaction surface of the agent.

use dialoguer::Password;
use tracing::debug;

/// Prompts and notices shown to the person running a package.
pub trait Console {
    /// Asks for the package password. `None` means the user cancelled.
    fn password(&self) -> Option<String>;

    fn error(&self, title: &str, message: &str);

    fn info(&self, title: &str, message: &str);
}

/// Interactive terminal console.
#[derive(Debug, Default)]
pub struct TerminalConsole;

impl Console for TerminalConsole {
    fn password(&self) -> Option<String> {
        match Password::new()
            .with_prompt("Enter the password to unlock this file")
            .allow_empty_password(true)
            .interact()
        {
            Ok(password) if !password.is_empty() => Some(password),
            Ok(_) => None,
            Err(e) => {
                debug!("Password prompt closed: {}", e);
                None
            }
        }
    }

    fn error(&self, title: &str, message: &str) {
        eprintln!("\n[{title}] {message}");
    }

    fn info(&self, title: &str, message: &str) {
        println!("\n[{title}] {message}");
    }
}
