//! Sanitizers applied to form input: trimming, escaping and array normalization.

use super::FieldValue;

/// Replaces markup-significant characters with HTML entities.
///
/// ```
/// use corner_store::validation::escape_html;
///
/// assert_eq!(escape_html("<b>Tom & Jerry's</b>"),
///            "&lt;b&gt;Tom &amp; Jerry&#x27;s&lt;&#x2F;b&gt;");
/// ```
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '/' => out.push_str("&#x2F;"),
            other => out.push(other),
        }
    }
    out
}

/// Absent → empty, scalar → one element, list → unchanged (order kept).
pub fn normalize_array(value: Option<&FieldValue>) -> Vec<String> {
    match value {
        None => Vec::new(),
        Some(FieldValue::Scalar(single)) => vec![single.clone()],
        Some(FieldValue::List(items)) => items.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_every_markup_character() {
        assert_eq!(
            escape_html(r#"& < > " ' /"#),
            "&amp; &lt; &gt; &quot; &#x27; &#x2F;"
        );
    }

    #[test]
    fn leaves_plain_text_alone() {
        assert_eq!(escape_html("Caffè latte 2.50"), "Caffè latte 2.50");
    }

    #[test]
    fn normalizes_array_shapes() {
        assert!(normalize_array(None).is_empty());
        assert_eq!(
            normalize_array(Some(&FieldValue::Scalar("a".into()))),
            vec!["a"]
        );
        assert_eq!(
            normalize_array(Some(&FieldValue::List(vec!["b".into(), "a".into()]))),
            vec!["b", "a"]
        );
    }
}
