//! Word-form helpers used when deriving permission names
//!
//! Deliberately small: these cover the resource tokens that show up in
//! route URIs (ASCII identifiers), not general English.

/// Convert a token to snake_case, folding `-`, spaces, and camelCase humps
pub fn snake_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 4);
    let mut prev_lower = false;

    for ch in input.chars() {
        if ch == '-' || ch == ' ' {
            if !out.ends_with('_') {
                out.push('_');
            }
            prev_lower = false;
        } else if ch.is_ascii_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
            prev_lower = false;
        } else {
            out.push(ch);
            prev_lower = ch.is_ascii_lowercase() || ch.is_ascii_digit();
        }
    }

    out
}

/// Singularize a resource token.
///
/// The literal token `media` is kept as-is: naive rules would turn it into
/// `medium`, which is wrong for a media-library resource.
pub fn singularize(word: &str) -> String {
    if word == "media" {
        return word.to_string();
    }

    if word.len() > 3 && word.ends_with("ies") {
        let stem = &word[..word.len() - 3];
        return format!("{}y", stem);
    }

    for suffix in ["sses", "xes", "zes", "ches", "shes", "uses"] {
        if word.len() > suffix.len() && word.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }

    if word.len() > 1 && word.ends_with('s') && !word.ends_with("ss") {
        return word[..word.len() - 1].to_string();
    }

    word.to_string()
}

/// Pluralize a resource token; `media` is already a plural form
pub fn pluralize(word: &str) -> String {
    if word == "media" || word.is_empty() {
        return word.to_string();
    }

    let bytes = word.as_bytes();
    let last = bytes[bytes.len() - 1] as char;

    if last == 'y' && word.len() > 1 {
        let before = bytes[bytes.len() - 2] as char;
        if !matches!(before, 'a' | 'e' | 'i' | 'o' | 'u') {
            return format!("{}ies", &word[..word.len() - 1]);
        }
    }

    if word.ends_with('s')
        || word.ends_with('x')
        || word.ends_with('z')
        || word.ends_with("ch")
        || word.ends_with("sh")
    {
        return format!("{}es", word);
    }

    format!("{}s", word)
}

/// Turn a snake_case token into a human title: `user_profiles` → `User Profiles`
pub fn title_case(input: &str) -> String {
    input
        .split(['_', ' '])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_case() {
        assert_eq!(snake_case("userProfiles"), "user_profiles");
        assert_eq!(snake_case("user-profiles"), "user_profiles");
        assert_eq!(snake_case("users"), "users");
        assert_eq!(snake_case("API"), "api");
    }

    #[test]
    fn test_singularize_common_forms() {
        assert_eq!(singularize("users"), "user");
        assert_eq!(singularize("categories"), "category");
        assert_eq!(singularize("statuses"), "status");
        assert_eq!(singularize("boxes"), "box");
        assert_eq!(singularize("branches"), "branch");
        assert_eq!(singularize("class"), "class");
    }

    #[test]
    fn test_media_is_never_singularized() {
        assert_eq!(singularize("media"), "media");
    }

    #[test]
    fn test_pluralize() {
        assert_eq!(pluralize("user"), "users");
        assert_eq!(pluralize("category"), "categories");
        assert_eq!(pluralize("status"), "statuses");
        assert_eq!(pluralize("branch"), "branches");
        assert_eq!(pluralize("media"), "media");
        assert_eq!(pluralize("day"), "days");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("user_profiles"), "User Profiles");
        assert_eq!(title_case("media"), "Media");
        assert_eq!(title_case("unknown"), "Unknown");
    }
}
