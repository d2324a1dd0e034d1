//! Text cleaning and category normalization

/// Category assigned when the source label is empty or unknown
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Trims the text and collapses every internal whitespace run to one space
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalizes a category label to title case
///
/// Empty labels and the collector's "Unknown" placeholder map to
/// [`UNCATEGORIZED`].
pub fn normalize_category(category: &str) -> String {
    let cleaned = clean_text(category);
    if cleaned.is_empty() || cleaned.eq_ignore_ascii_case("unknown") {
        return UNCATEGORIZED.to_string();
    }
    title_case(&cleaned)
}

/// Uppercases the first letter of every word and lowercases the rest
///
/// A word starts after any character that is neither alphanumeric nor an
/// apostrophe, so "children's" stays "Children's".
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;

    for ch in text.chars() {
        if ch.is_alphanumeric() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = ch != '\'';
        }
    }

    out
}
