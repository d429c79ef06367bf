use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref PASCAL: Regex = Regex::new(r"^[A-Z][A-Za-z0-9]*$").unwrap();
    static ref CAMEL: Regex = Regex::new(r"^[a-z][A-Za-z0-9]*$").unwrap();
}

/// `[A-Z][A-Za-z0-9]*`, ASCII only.
pub fn is_pascal(s: &str) -> bool {
    PASCAL.is_match(s)
}

/// `[a-z][A-Za-z0-9]*`, ASCII only.
pub fn is_camel(s: &str) -> bool {
    CAMEL.is_match(s)
}

/// Converts a string to PascalCase.
/// - If the string contains underscores, it splits on underscores and
///   uppercases the first letter of each word, lowercasing the rest.
/// - If the string is fully uppercase, only the first letter stays uppercase.
/// - Otherwise only the first letter is forced uppercase.
pub fn to_pascal(s: &str) -> String {
    if s.contains('_') {
        s.split('_')
            .filter(|word| !word.is_empty())
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    None => String::new(),
                    Some(first) => {
                        first.to_uppercase().to_string() + &chars.as_str().to_lowercase()
                    }
                }
            })
            .collect()
    } else if s == s.to_uppercase() {
        let mut chars = s.chars();
        match chars.next() {
            None => String::new(),
            Some(first) => first.to_uppercase().to_string() + &chars.as_str().to_lowercase(),
        }
    } else {
        let mut chars = s.chars();
        match chars.next() {
            None => String::new(),
            Some(first) => first.to_uppercase().to_string() + chars.as_str(),
        }
    }
}

/// Converts a string to camelCase via PascalCase with a lowered first letter.
pub fn to_camel(s: &str) -> String {
    let pascal = to_pascal(s);
    let mut chars = pascal.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_lowercase().to_string() + chars.as_str(),
    }
}

/// Converts a string to snake_case without splitting acronyms apart,
/// so "sessionID" becomes "session_id".
pub fn to_snake(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut snake = String::new();
    for i in 0..chars.len() {
        let c = chars[i];
        if c.is_uppercase() {
            if i > 0 {
                let prev = chars[i - 1];
                if !prev.is_uppercase() || (i + 1 < chars.len() && chars[i + 1].is_lowercase()) {
                    snake.push('_');
                }
            }
            snake.extend(c.to_lowercase());
        } else {
            snake.push(c);
        }
    }
    snake
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_pascal() {
        assert!(is_pascal("User"));
        assert!(is_pascal("HttpUserService"));
        assert!(is_pascal("A"));
        assert!(!is_pascal("user"));
        assert!(!is_pascal("User_Name"));
        assert!(!is_pascal("_"));
        assert!(!is_pascal(""));
    }

    #[test]
    fn test_is_camel() {
        assert!(is_camel("userId"));
        assert!(is_camel("a"));
        assert!(!is_camel("UserId"));
        assert!(!is_camel("user_id"));
        assert!(!is_camel(""));
    }

    #[test]
    fn test_to_pascal() {
        assert_eq!(to_pascal("user_name"), "UserName");
        assert_eq!(to_pascal("SIGNAL"), "Signal");
        assert_eq!(to_pascal("userId"), "UserId");
        assert_eq!(to_pascal("User"), "User");
    }

    #[test]
    fn test_to_camel() {
        assert_eq!(to_camel("UserId"), "userId");
        assert_eq!(to_camel("user_name"), "userName");
        assert_eq!(to_camel("Id"), "id");
    }

    #[test]
    fn test_to_snake() {
        assert_eq!(to_snake("UserName"), "user_name");
        assert_eq!(to_snake("sessionID"), "session_id");
        assert_eq!(to_snake("Name"), "name");
    }
}
