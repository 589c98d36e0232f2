/// Longest variant label shown in progress output
const LABEL_DISPLAY_CHARS: usize = 25;

/// Shortens a variant label for progress output
pub fn short_label(label: &str) -> String {
    label.chars().take(LABEL_DISPLAY_CHARS).collect()
}

/// Convert a page title to a sanitized filename stem
pub fn sanitize_filename(title: &str) -> String {
    let name: String = title
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '?' | '&' | '=' | '#' | '%' | '*' | '"' | '<' | '>' | '|' => '_',
            c if c.is_whitespace() => '_',
            c => c,
        })
        .take(100)
        .collect();

    if name.trim_matches('_').is_empty() {
        "product_images".to_string()
    } else {
        name
    }
}
