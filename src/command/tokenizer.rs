//! Console command tokenizer

use crate::utils::{AdminError, Result};

/// Whitespace-split command. The verb is upper-cased for matching; every
/// other token keeps its original case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tokens {
    verb: String,
    tokens: Vec<String>,
}

impl Tokens {
    /// Upper-cased first token
    pub fn verb(&self) -> &str {
        &self.verb
    }

    /// Token at `index` in original case; index 0 is the verb as typed
    pub fn get(&self, index: usize) -> Option<&str> {
        self.tokens.get(index).map(String::as_str)
    }

    /// Tokens from `index` onwards
    pub fn rest(&self, index: usize) -> &[String] {
        self.tokens.get(index..).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Split `raw` on runs of whitespace
pub fn tokenize(raw: &str) -> Result<Tokens> {
    let tokens: Vec<String> = raw.split_whitespace().map(String::from).collect();
    let Some(first) = tokens.first() else {
        return Err(AdminError::MalformedCommand("empty command".to_string()));
    };
    Ok(Tokens {
        verb: first.to_ascii_uppercase(),
        tokens,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verb_is_normalised_values_are_not() {
        let tokens = tokenize("hset  User:1\tName  Alice").unwrap();
        assert_eq!(tokens.verb(), "HSET");
        assert_eq!(tokens.get(0), Some("hset"));
        assert_eq!(tokens.get(1), Some("User:1"));
        assert_eq!(tokens.rest(2), &["Name".to_string(), "Alice".to_string()]);
        assert_eq!(tokens.len(), 4);
    }

    #[test]
    fn test_empty_is_malformed() {
        assert!(matches!(tokenize(""), Err(AdminError::MalformedCommand(_))));
        assert!(matches!(tokenize("  \t \n"), Err(AdminError::MalformedCommand(_))));
    }

    #[test]
    fn test_rest_past_end() {
        let tokens = tokenize("LLEN").unwrap();
        assert!(tokens.rest(5).is_empty());
        assert_eq!(tokens.get(1), None);
    }
}
