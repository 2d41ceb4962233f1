// src/utils/html.rs

/// Sanitizes author-supplied rich text with ammonia.
///
/// Safe formatting tags (<b>, <p>, <code>...) survive; <script>, <iframe>
/// and event-handler attributes are stripped. Only quiz explanations are
/// rich text; questions and option texts are stored as plain text.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

/// Sanitizes and trims; `None` when nothing is left.
pub fn clean_optional(input: Option<&str>) -> Option<String> {
    input
        .map(|s| clean_html(s.trim()))
        .filter(|s| !s.is_empty())
}
