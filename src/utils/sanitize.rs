use ammonia;

/// Clean authored display text using the ammonia library.
///
/// Whitelist-based sanitization: safe tags (like <b>, <p>) survive, dangerous
/// tags (like <script>, <iframe>) and attributes (like onclick) are stripped.
/// Applied to titles, descriptions, subject names and question text before
/// storage, as a fail-safe against stored XSS in whatever client renders them.
///
/// Choice text is NOT passed through here: it doubles as the answer-key
/// matching key, and entity encoding would break the match for submissions
/// containing characters like '&'.
pub fn clean_text(input: &str) -> String {
    ammonia::clean(input)
}
