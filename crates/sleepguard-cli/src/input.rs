//! Input parsing for the session screen and command arguments

use sleepguard_api::{DURATION_PRESETS, MAX_SESSION_MINUTES, MIN_SESSION_MINUTES};

/// Commands accepted on the session screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenCommand {
    /// Begin the cancel countdown
    Cancel,
    /// Abort the cancel countdown
    Abort,
    /// Emergency reset
    Reset,
    /// Leave the screen; the session keeps running
    Quit,
}

/// Maps one line of input to a screen command
pub fn line_to_command(line: &str) -> Option<ScreenCommand> {
    match line.trim().to_ascii_lowercase().as_str() {
        "c" | "cancel" => Some(ScreenCommand::Cancel),
        "a" | "abort" => Some(ScreenCommand::Abort),
        "r" | "reset" => Some(ScreenCommand::Reset),
        "q" | "quit" | "exit" => Some(ScreenCommand::Quit),
        _ => None,
    }
}

/// Parse a session length: a preset label (`30m`, `1h`, ...), `<n>m`,
/// `<n>h`, or plain minutes
pub fn parse_duration_minutes(s: &str) -> Result<u32, String> {
    let s = s.trim().to_ascii_lowercase();

    if let Some((_, minutes)) = DURATION_PRESETS.iter().find(|(label, _)| *label == s) {
        return Ok(*minutes);
    }

    let minutes = if let Some(hours) = s.strip_suffix('h') {
        hours
            .trim()
            .parse::<u32>()
            .map_err(|_| format!("invalid hours '{}'", hours))?
            .checked_mul(60)
            .ok_or_else(|| format!("duration '{}' too long", s))?
    } else {
        let digits = s.strip_suffix('m').unwrap_or(&s).trim();
        digits
            .parse::<u32>()
            .map_err(|_| format!("invalid duration '{}'", s))?
    };

    if (MIN_SESSION_MINUTES..=MAX_SESSION_MINUTES).contains(&minutes) {
        Ok(minutes)
    } else {
        Err(format!(
            "duration must be between {} and {} minutes, got {}",
            MIN_SESSION_MINUTES, MAX_SESSION_MINUTES, minutes
        ))
    }
}
