use super::FieldError;
use super::sanitize::escape_html;
use crate::model::RecordId;
use once_cell::sync::Lazy;
use regex::Regex;

static DECIMAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+(\.\d*)?|\.\d+)$").expect("decimal pattern compiles"));
static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").expect("digit pattern compiles"));

/// A single check on a trimmed, unescaped field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Non-empty after trimming.
    Required,
    /// At most `n` characters.
    MaxLength(usize),
    /// At least `n` characters.
    MinLength(usize),
    /// Unsigned decimal such as `2`, `2.50` or `.5`.
    Numeric,
    /// Unsigned whole number.
    Integer,
    /// Parses as a [`RecordId`].
    RecordId,
}

impl Rule {
    pub fn check(&self, value: &str) -> bool {
        match self {
            Rule::Required => !value.is_empty(),
            Rule::MaxLength(max) => value.chars().count() <= *max,
            Rule::MinLength(min) => value.chars().count() >= *min,
            Rule::Numeric => DECIMAL.is_match(value),
            Rule::Integer => DIGITS.is_match(value),
            Rule::RecordId => RecordId::parse(value).is_ok(),
        }
    }
}

/// Rule chain for one field: trim, check each rule in order, escape.
#[derive(Debug, Clone)]
pub struct FieldRules {
    field: &'static str,
    rules: Vec<(Rule, &'static str)>,
}

impl FieldRules {
    pub fn new(field: &'static str) -> Self {
        Self {
            field,
            rules: Vec::new(),
        }
    }

    pub fn field(&self) -> &'static str {
        self.field
    }

    pub fn rule(mut self, rule: Rule, message: &'static str) -> Self {
        self.rules.push((rule, message));
        self
    }

    /// Runs the chain and returns the escaped value.
    ///
    /// An empty value only reports `Required`; the remaining rules describe
    /// the shape of a present value.
    pub fn apply(&self, raw: Option<&str>, errors: &mut Vec<FieldError>) -> String {
        let trimmed = raw.unwrap_or_default().trim();
        for (rule, message) in &self.rules {
            if trimmed.is_empty() && *rule != Rule::Required {
                continue;
            }
            if !rule.check(trimmed) {
                errors.push(FieldError::new(self.field, *message));
            }
        }
        escape_html(trimmed)
    }

    /// Checks each element of an array field and returns them escaped.
    pub fn apply_each(&self, values: &[String], errors: &mut Vec<FieldError>) -> Vec<String> {
        values
            .iter()
            .map(|value| self.apply(Some(value), errors))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_accepts_decimals_only() {
        for ok in ["2", "2.50", "0.99", ".5", "100."] {
            assert!(Rule::Numeric.check(ok), "{ok} should be numeric");
        }
        for bad in ["", "-1", "1e3", "two", "1.2.3", " 1"] {
            assert!(!Rule::Numeric.check(bad), "{bad} should not be numeric");
        }
    }

    #[test]
    fn integer_rejects_fractions_and_signs() {
        assert!(Rule::Integer.check("10"));
        assert!(!Rule::Integer.check("1.5"));
        assert!(!Rule::Integer.check("-3"));
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        assert!(Rule::MaxLength(5).check("caffè"));
        assert!(!Rule::MaxLength(4).check("caffè"));
        assert!(Rule::MinLength(1).check("a"));
    }

    #[test]
    fn chain_trims_checks_and_escapes() {
        let rules = FieldRules::new("name")
            .rule(Rule::Required, "Name must be specified.")
            .rule(Rule::MaxLength(5), "Name is too long.");
        let mut errors = Vec::new();
        let cleaned = rules.apply(Some("  <a>  "), &mut errors);
        assert_eq!(cleaned, "&lt;a&gt;");
        assert!(errors.is_empty());

        let cleaned = rules.apply(Some(" Tom & Jerry "), &mut errors);
        assert_eq!(cleaned, "Tom &amp; Jerry");
        assert_eq!(errors, vec![FieldError::new("name", "Name is too long.")]);
    }

    #[test]
    fn empty_value_reports_required_only() {
        let rules = FieldRules::new("price")
            .rule(Rule::Required, "Price must be specified.")
            .rule(Rule::Numeric, "Price must be a number.");
        let mut errors = Vec::new();
        rules.apply(Some("   "), &mut errors);
        assert_eq!(errors, vec![FieldError::new("price", "Price must be specified.")]);
    }
}
