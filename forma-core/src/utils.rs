//! Utility functions for message formatting
//!
//! Field names are turned into display phrases before they are substituted
//! into validation messages.

/// Naming helpers for field labels
pub mod naming {
    /// Converts a field name into a human readable phrase.
    ///
    /// A trailing `_pk` is dropped. Names without separators are split on
    /// lower-to-upper case transitions; all-uppercase words are kept as
    /// acronyms and words containing `idnp` are upper-cased.
    ///
    /// # Examples
    ///
    /// ```
    /// use forma_core::utils::naming::to_human_phrase;
    ///
    /// assert_eq!(to_human_phrase("firstName"), "First name");
    /// assert_eq!(to_human_phrase("user_pk"), "User");
    /// assert_eq!(to_human_phrase("IDNP"), "IDNP");
    /// assert_eq!(to_human_phrase("idnpCode"), "IDNP code");
    /// assert_eq!(to_human_phrase("billing-address"), "Billing address");
    /// ```
    pub fn to_human_phrase(field: &str) -> String {
        let field = field.strip_suffix("_pk").unwrap_or(field);

        let has_separator = field
            .chars()
            .any(|ch| ch.is_whitespace() || ch == '_' || ch == '-');

        if has_separator {
            return capitalize(&field.replace(|ch: char| ch == '-' || ch == '_', " "));
        }

        let mut spaced = String::with_capacity(field.len() + 4);
        let mut previous: Option<char> = None;
        for ch in field.chars() {
            if ch.is_ascii_uppercase() && previous.is_some_and(|p| !p.is_ascii_uppercase()) {
                spaced.push(' ');
            }
            spaced.push(ch);
            previous = Some(ch);
        }

        let words: Vec<String> = spaced
            .trim()
            .split(' ')
            .map(|word| {
                if !word.is_empty() && word.chars().all(|ch| ch.is_ascii_uppercase()) {
                    word.to_string()
                } else if word.contains("idnp") {
                    word.to_uppercase()
                } else {
                    word.to_lowercase()
                }
            })
            .collect();

        capitalize(&words.join(" "))
    }

    /// Trims the input and upper-cases its first character.
    ///
    /// ```
    /// use forma_core::utils::naming::capitalize;
    ///
    /// assert_eq!(capitalize("  email address "), "Email address");
    /// assert_eq!(capitalize("   "), "");
    /// ```
    pub fn capitalize(text: &str) -> String {
        let trimmed = text.trim();
        let mut chars = trimmed.chars();
        match chars.next() {
            None => String::new(),
            Some(first) => {
                let mut result = String::with_capacity(trimmed.len());
                result.extend(first.to_uppercase());
                result.push_str(chars.as_str());
                result
            }
        }
    }
}

/// Placeholder substitution
pub mod template {
    /// Replaces every `{key}` with its value. Placeholders without a
    /// replacement are left as they are.
    ///
    /// ```
    /// use forma_core::utils::template::template_string;
    ///
    /// assert_eq!(
    ///     template_string("{field} is required", &[("field", "Email")]),
    ///     "Email is required"
    /// );
    /// assert_eq!(template_string("{other} stays", &[("field", "x")]), "{other} stays");
    /// ```
    pub fn template_string(template: &str, replacements: &[(&str, &str)]) -> String {
        replacements
            .iter()
            .fold(template.to_string(), |result, (key, value)| {
                result.replace(&format!("{{{key}}}"), value)
            })
    }
}
