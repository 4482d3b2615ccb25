pub const DEFAULT_PREVIEW_LENGTH: usize = 100;

/// Shorten `value` to at most `limit` characters, appending `...` when cut.
pub fn truncate_text(value: &str, limit: usize) -> String {
    if value.chars().count() <= limit {
        return value.to_string();
    }
    let cut: String = value.chars().take(limit).collect();
    format!("{}...", cut.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_untouched() {
        assert_eq!(truncate_text("Totoro", 10), "Totoro");
        assert_eq!(truncate_text("", 10), "");
    }

    #[test]
    fn long_text_cut_and_trimmed() {
        assert_eq!(truncate_text("My Neighbor Totoro", 12), "My Neighbor...");
    }

    #[test]
    fn counts_characters_not_bytes() {
        assert_eq!(truncate_text("千と千尋の神隠し", 4), "千と千尋...");
    }
}
