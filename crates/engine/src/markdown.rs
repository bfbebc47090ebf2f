//! Telegram MarkdownV2 escaping.

/// Characters MarkdownV2 treats as markup.
const RESERVED: &[char] = &[
    '\\', '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

/// Escape `text` so it renders literally under `parse_mode=MarkdownV2`.
pub fn escape_markdown_v2(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + text.len() / 4);
    for c in text.chars() {
        if RESERVED.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Wrap already-escaped text in a spoiler.
pub fn spoiler(escaped: &str) -> String {
    format!("||{}||", escaped)
}
