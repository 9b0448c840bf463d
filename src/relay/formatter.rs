//! Yell formatting for display in Discord.

/// Truncate a message to at most `max_chars` characters.
///
/// Counts Unicode scalar values, so multi-byte text is never split
/// mid-character.
pub fn truncate_chars(message: &str, max_chars: usize) -> &str {
    match message.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &message[..byte_index],
        None => message,
    }
}

/// Format a yell for Discord.
///
/// The message is truncated to `max_chars` first, then rendered as
/// `[server] player: message`, or `[server] message` when no (non-blank)
/// player name is given.
pub fn format_yell(
    server_name: &str,
    player_name: Option<&str>,
    message: &str,
    max_chars: usize,
) -> String {
    let message = truncate_chars(message, max_chars);

    match player_name.filter(|name| !name.trim().is_empty()) {
        Some(player) => format!("[{}] {}: {}", server_name, player, message),
        None => format!("[{}] {}", server_name, message),
    }
}
