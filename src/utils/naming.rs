//! Identifier rules and table-name derivation.

/// `[A-Za-z_][A-Za-z0-9_]*`, at most 63 bytes.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    name.len() <= 63 && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// `IdeaCategory` -> `idea_category`.
pub fn snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                Some(p) if p.is_ascii_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_ascii_uppercase() => next.is_some_and(|n| n.is_ascii_lowercase()),
                _ => false,
            };
            if boundary {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// English plural good enough for table names.
pub fn pluralize(word: &str) -> String {
    let is_vowel = |c: char| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u');
    if let Some(stem) = word.strip_suffix('y') {
        if stem.chars().last().is_some_and(|c| !is_vowel(c)) {
            return format!("{stem}ies");
        }
    }
    if ["s", "x", "z", "ch", "sh"].iter().any(|s| word.ends_with(s)) {
        return format!("{word}es");
    }
    format!("{word}s")
}

/// Table name for a model: snake_case plural of the model name.
pub fn table_name_for(model: &str) -> String {
    pluralize(&snake_case(model))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_table_names() {
        assert_eq!(table_name_for("User"), "users");
        assert_eq!(table_name_for("Idea"), "ideas");
        assert_eq!(table_name_for("Category"), "categories");
        assert_eq!(table_name_for("Day"), "days");
        assert_eq!(table_name_for("Box"), "boxes");
        assert_eq!(table_name_for("IdeaBatch"), "idea_batches");
        assert_eq!(table_name_for("HTTPRequest"), "http_requests");
    }

    #[test]
    fn validates_identifiers() {
        assert!(is_valid_identifier("name"));
        assert!(is_valid_identifier("_private2"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("2fast"));
        assert!(!is_valid_identifier("drop table"));
        assert!(!is_valid_identifier("name\"; --"));
        assert!(!is_valid_identifier(&"x".repeat(64)));
    }
}
