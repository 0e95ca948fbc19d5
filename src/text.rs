//! Word-level text helpers shared by the extractor, style checker and
//! drift detector.

use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;
use sha2::{Digest, Sha256};

lazy_static::lazy_static! {
    /// Identifier-shaped tokens.
    static ref IDENT: Regex = Regex::new(r"[A-Za-z_][A-Za-z0-9_]*").unwrap();

    /// Words that carry no information about the documented code.
    static ref STOPWORDS: BTreeSet<&'static str> = [
        // function words
        "a", "about", "above", "after", "again", "all", "also", "am", "an", "and", "any",
        "are", "as", "at", "be", "because", "been", "before", "being", "below", "between",
        "both", "but", "by", "can", "could", "did", "do", "does", "doing", "done", "down",
        "during", "each", "either", "else", "etc", "ever", "every", "few", "for", "from",
        "further", "get", "gets", "given", "has", "have", "having", "he", "her", "here",
        "him", "his", "how", "however", "i", "if", "in", "into", "is", "it", "its",
        "itself", "just", "may", "me", "might", "more", "most", "must", "my", "need",
        "needs", "neither", "no", "nor", "not", "now", "of", "off", "on", "once", "one",
        "only", "or", "other", "otherwise", "our", "out", "over", "own", "same", "set",
        "shall", "she", "should", "since", "so", "some", "such", "than", "that", "the",
        "their", "them", "then", "there", "these", "they", "this", "those", "through",
        "thus", "to", "too", "two", "under", "until", "up", "upon", "use", "used", "uses",
        "using", "very", "via", "was", "we", "were", "what", "when", "where", "whether",
        "which", "while", "who", "whom", "why", "will", "with", "within", "without",
        "would", "yet", "you", "your",
        // generic documentation vocabulary
        "arg", "args", "argument", "arguments", "attribute", "attributes", "call",
        "called", "caller", "calls", "class", "code", "default", "defaults", "example",
        "examples", "false", "func", "function", "functions", "helper", "input",
        "instance", "method", "methods", "none", "note", "null", "object", "optional",
        "output", "param", "params", "parameter", "parameters", "raise", "raises",
        "result", "results", "return", "returned", "returns", "see", "self", "true",
        "type", "types", "value", "values", "yield", "yields", "throws", "todo", "fixme",
        "new", "provided", "specified", "whose",
    ]
    .into_iter()
    .collect();
}

/// Split an identifier into lowercase words on `_` and camel-case
/// boundaries (`parseHTTPHeader` -> `parse`, `http`, `header`).
pub fn split_identifier(ident: &str) -> Vec<String> {
    let mut words = Vec::new();
    for piece in ident.split(|c: char| c == '_' || c == '$' || c == '-') {
        let chars: Vec<char> = piece.chars().collect();
        let mut current = String::new();
        for (i, &c) in chars.iter().enumerate() {
            if c.is_uppercase() && !current.is_empty() {
                let prev = chars[i - 1];
                let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
                if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_lower)
                {
                    words.push(std::mem::take(&mut current).to_lowercase());
                }
            }
            current.push(c);
        }
        if !current.is_empty() {
            words.push(current.to_lowercase());
        }
    }
    words
}

/// Reduce a lowercase word to a crude stem so that `counts`, `counted`
/// and `counting` compare equal.
pub fn stem(word: &str) -> String {
    let w = word.to_lowercase();
    if w.len() <= 3 {
        return w;
    }
    let mut s = if let Some(base) = w.strip_suffix("ies") {
        format!("{}y", base)
    } else if let Some(base) = w.strip_suffix("ing").filter(|b| b.len() >= 3) {
        base.to_string()
    } else if let Some(base) = w.strip_suffix("ed").filter(|b| b.len() >= 3) {
        base.to_string()
    } else if let Some(base) = w.strip_suffix("es").filter(|b| b.len() >= 3) {
        base.to_string()
    } else if let Some(base) = w
        .strip_suffix('s')
        .filter(|b| b.len() >= 3 && !b.ends_with('s'))
    {
        base.to_string()
    } else {
        w
    };
    if s.len() > 3 && s.ends_with('e') {
        s.pop();
    }
    s
}

/// Whether `word` is an English function word or generic documentation
/// vocabulary.
pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(word.to_lowercase().as_str())
}

/// Identifier-shaped tokens of `text`, in order.
pub fn identifiers(text: &str) -> impl Iterator<Item = &str> {
    IDENT.find_iter(text).map(|m| m.as_str())
}

/// Whether a token looks like a code identifier rather than prose:
/// `snake_case`, or `camelCase` starting with a lowercase letter.
/// Capitalized words such as `JavaScript` read as prose.
pub fn is_identifier_shaped(token: &str) -> bool {
    let trimmed = token.trim_matches('_');
    if trimmed.is_empty() {
        return false;
    }
    if trimmed.contains('_') {
        return true;
    }
    trimmed.starts_with(|c: char| c.is_lowercase())
        && trimmed.chars().skip(1).any(|c| c.is_uppercase())
}

/// Stemmed content words of free text, with stopwords and one-letter
/// words removed.
pub fn content_words(text: &str) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    for ident in identifiers(text) {
        for word in split_identifier(ident) {
            if word.len() < 2 || word.chars().all(|c| c.is_ascii_digit()) || is_stopword(&word) {
                continue;
            }
            out.insert(stem(&word));
        }
    }
    out
}

/// Add the stemmed words of an identifier-bearing token to a multiset.
pub fn add_token_words(tokens: &mut BTreeMap<String, u32>, text: &str) {
    for ident in identifiers(text) {
        for word in split_identifier(ident) {
            if word.len() < 2 || word.chars().all(|c| c.is_ascii_digit()) {
                continue;
            }
            *tokens.entry(stem(&word)).or_insert(0) += 1;
        }
    }
}

/// Lowercase hex SHA-256 of a string.
pub fn sha256_hex(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Collapse whitespace so that a run survives as a single space only
/// between two word characters.
pub fn canonical_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            let prev_word = out.chars().last().is_some_and(is_word_char);
            if prev_word && is_word_char(c) {
                out.push(' ');
            }
            pending_space = false;
        }
        out.push(c);
    }
    out
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_identifier() {
        assert_eq!(split_identifier("max_count"), vec!["max", "count"]);
        assert_eq!(split_identifier("getUserName"), vec!["get", "user", "name"]);
        assert_eq!(split_identifier("parseHTTPHeader"), vec!["parse", "http", "header"]);
        assert_eq!(split_identifier("total"), vec!["total"]);
    }

    #[test]
    fn test_stem_merges_inflections() {
        assert_eq!(stem("counts"), stem("count"));
        assert_eq!(stem("counting"), stem("count"));
        assert_eq!(stem("entries"), stem("entry"));
        assert_eq!(stem("parsed"), stem("parse"));
        assert_eq!(stem("class"), "class");
    }

    #[test]
    fn test_content_words_drop_stopwords() {
        let words = content_words("Returns the number of active users.");
        assert!(words.contains(&stem("number")));
        assert!(words.contains(&stem("active")));
        assert!(words.contains(&stem("users")));
        assert!(!words.contains("the"));
        assert!(!words.contains(&stem("returns")));
    }

    #[test]
    fn test_identifier_shape() {
        assert!(is_identifier_shaped("max_count"));
        assert!(is_identifier_shaped("userName"));
        assert!(!is_identifier_shaped("Hello"));
        assert!(!is_identifier_shaped("count"));
        assert!(!is_identifier_shaped("HTTP"));
        assert!(!is_identifier_shaped("JavaScript"));
    }

    #[test]
    fn test_canonical_whitespace() {
        assert_eq!(canonical_whitespace("(a,\n    b: int)  ->  str"), "(a,b:int)->str");
        assert_eq!(canonical_whitespace("(mut  x: u32)"), "(mut x:u32)");
    }

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
