//! Reply text cleanup for Discord -> game messages.
//!
//! Game chat cannot render Discord emojis, so both Unicode emojis and
//! custom server emojis are turned into `:shortcode:` text before a reply
//! is sent back into the game.

use emojis;
use fancy_regex::Regex;

use crate::relay::formatter::truncate_chars;

/// Converts Discord message text into plain game chat text.
#[derive(Debug, Clone)]
pub struct ReplyResolver {
    /// Pattern for Discord custom emojis (<:name:id> or <a:name:id>).
    emoji_pattern: Regex,
}

impl Default for ReplyResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplyResolver {
    pub fn new() -> Self {
        Self {
            emoji_pattern: Regex::new(r"<a?:([a-zA-Z0-9_]+):\d+>").unwrap(),
        }
    }

    /// Convert Discord custom emojis to text representation.
    pub fn resolve_custom_emojis_to_text(&self, message: &str) -> String {
        self.emoji_pattern.replace_all(message, ":$1:").to_string()
    }

    /// Convert Unicode emojis to text aliases (e.g., 😀 -> :grinning:).
    ///
    /// Uses the shortcode if there is one, otherwise the emoji name. Two-char
    /// sequences (emoji + variation selector and similar) are tried first.
    pub fn resolve_unicode_emojis_to_text(&self, message: &str) -> String {
        let mut result = String::with_capacity(message.len() * 2);
        let mut chars = message.chars().peekable();

        while let Some(ch) = chars.next() {
            if ch.is_ascii() {
                result.push(ch);
                continue;
            }

            if let Some(&next) = chars.peek() {
                let pair: String = [ch, next].iter().collect();
                if let Some(emoji) = emojis::get(&pair) {
                    chars.next();
                    push_alias(&mut result, emoji);
                    continue;
                }
            }

            let mut buf = [0u8; 4];
            match emojis::get(ch.encode_utf8(&mut buf)) {
                Some(emoji) => push_alias(&mut result, emoji),
                None => result.push(ch),
            }
        }

        result
    }

    /// Prepare a Discord reply for the game.
    ///
    /// `content` should already have mentions resolved to names. Returns
    /// `None` when nothing printable is left.
    pub fn prepare_reply(&self, content: &str, max_chars: usize) -> Option<String> {
        let text = self.resolve_unicode_emojis_to_text(content);
        let text = self.resolve_custom_emojis_to_text(&text);
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        Some(truncate_chars(text, max_chars).to_string())
    }
}

fn push_alias(result: &mut String, emoji: &emojis::Emoji) {
    let alias = emoji.shortcode().unwrap_or_else(|| emoji.name());
    result.push(':');
    result.push_str(alias);
    result.push(':');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_custom_emojis_to_text() {
        let resolver = ReplyResolver::new();

        let output = resolver.resolve_custom_emojis_to_text("gg <:pepe:123456> <a:dance:42>");
        assert_eq!(output, "gg :pepe: :dance:");
    }

    #[test]
    fn test_resolve_unicode_emojis() {
        let resolver = ReplyResolver::new();

        let output = resolver.resolve_unicode_emojis_to_text("Hello 😀");
        assert!(
            output.starts_with("Hello :") && output.contains("grinning"),
            "Expected emoji name with 'grinning' in output, got: {}",
            output
        );
    }

    #[test]
    fn test_non_emoji_unicode_is_kept() {
        let resolver = ReplyResolver::new();

        assert_eq!(resolver.resolve_unicode_emojis_to_text("café über"), "café über");
    }

    #[test]
    fn test_emoji_after_accented_char() {
        let resolver = ReplyResolver::new();

        let output = resolver.resolve_unicode_emojis_to_text("é😀");
        assert!(output.starts_with("é:"), "got: {}", output);
        assert!(output.contains("grinning"), "got: {}", output);
    }

    #[test]
    fn test_prepare_reply_skips_blank() {
        let resolver = ReplyResolver::new();

        assert_eq!(resolver.prepare_reply("   ", 300), None);
        assert_eq!(resolver.prepare_reply("", 300), None);
    }

    #[test]
    fn test_prepare_reply_truncates() {
        let resolver = ReplyResolver::new();

        let long = "b".repeat(350);
        let reply = resolver.prepare_reply(&long, 300).unwrap();
        assert_eq!(reply.chars().count(), 300);

        assert_eq!(
            resolver.prepare_reply("  hi <:wave:1>  ", 300).as_deref(),
            Some("hi :wave:")
        );
    }
}
