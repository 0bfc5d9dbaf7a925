//! Terminal host adapters: permission prompt and console alerts.

use std::io::{self, BufRead, Write};

use async_trait::async_trait;

use super::{Notifier, PermissionProvider};
use crate::subscription::PermissionState;

/// Asks for notification permission on the controlling terminal.
///
/// With `assume_yes` the prompt is skipped and permission is granted, which
/// is how scripted runs (no TTY) get past the capability check.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalPermission {
    assume_yes: bool,
}

impl TerminalPermission {
    /// Interactive prompt on stdin.
    pub fn interactive() -> Self {
        Self { assume_yes: false }
    }

    /// Grant without prompting.
    pub fn assume_yes() -> Self {
        Self { assume_yes: true }
    }
}

/// Map a prompt answer to a permission decision.
///
/// Blank input counts as dismissing the prompt.
pub fn parse_answer(input: &str) -> PermissionState {
    match input.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => PermissionState::Granted,
        "n" | "no" => PermissionState::Denied,
        _ => PermissionState::Default,
    }
}

fn prompt_stdin() -> PermissionState {
    print!("Allow push notifications? [y/N] ");
    if io::stdout().flush().is_err() {
        return PermissionState::Default;
    }

    let mut input = String::new();
    match io::stdin().lock().read_line(&mut input) {
        Ok(0) | Err(_) => PermissionState::Default,
        Ok(_) => parse_answer(&input),
    }
}

#[async_trait]
impl PermissionProvider for TerminalPermission {
    fn is_supported(&self) -> bool {
        self.assume_yes || atty::is(atty::Stream::Stdin)
    }

    fn unsupported_hint(&self) -> String {
        "To enable notifications:\n\
         • Run pushsub from an interactive terminal\n\
         • Or pass --yes to grant permission non-interactively"
            .to_string()
    }

    async fn request_permission(&self) -> PermissionState {
        if self.assume_yes {
            log::debug!("[Push] Permission granted via --yes");
            return PermissionState::Granted;
        }

        match tokio::task::spawn_blocking(prompt_stdin).await {
            Ok(state) => state,
            Err(e) => {
                log::warn!("[Push] Permission prompt task failed: {e}");
                PermissionState::Default
            }
        }
    }
}

/// Prints alerts to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn alert(&self, message: &str) {
        println!("{message}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_answer() {
        assert_eq!(parse_answer("y\n"), PermissionState::Granted);
        assert_eq!(parse_answer("  YES "), PermissionState::Granted);
        assert_eq!(parse_answer("n"), PermissionState::Denied);
        assert_eq!(parse_answer("No\r\n"), PermissionState::Denied);
        assert_eq!(parse_answer(""), PermissionState::Default);
        assert_eq!(parse_answer("maybe"), PermissionState::Default);
    }

    #[tokio::test]
    async fn test_assume_yes_grants_without_prompt() {
        let permission = TerminalPermission::assume_yes();
        assert!(permission.is_supported());
        assert_eq!(
            permission.request_permission().await,
            PermissionState::Granted
        );
    }

    #[test]
    fn test_unsupported_hint_mentions_yes_flag() {
        assert!(TerminalPermission::interactive()
            .unsupported_hint()
            .contains("--yes"));
    }
}
