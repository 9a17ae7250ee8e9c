use std::fmt::Display;

use crate::{errors::QueryError, tags::is_valid_tag_name};

/// Prefix that marks a word as a tag reference.
pub const TAG_PREFIX: &str = "tag:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Tag(String),
    And,
    Or,
    Not,
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Tag(name) => write!(f, "{TAG_PREFIX}{name}"),
            Token::And => write!(f, "AND"),
            Token::Or => write!(f, "OR"),
            Token::Not => write!(f, "NOT"),
        }
    }
}

/// Splits on whitespace and classifies each word. Operators are the literal
/// uppercase words; `and`/`And` are not operators.
///
/// Empty or blank input yields no tokens.
pub fn tokenize(input: &str) -> Result<Vec<Token>, QueryError> {
    input
        .split_whitespace()
        .enumerate()
        .map(|(position, word)| classify(word, position))
        .collect()
}

fn classify(word: &str, position: usize) -> Result<Token, QueryError> {
    match word {
        "AND" => return Ok(Token::And),
        "OR" => return Ok(Token::Or),
        "NOT" => return Ok(Token::Not),
        _ => {}
    }

    let Some(name) = word.strip_prefix(TAG_PREFIX) else {
        return Err(QueryError::UnknownToken {
            word: word.to_string(),
            position,
        });
    };

    if !is_valid_tag_name(name) {
        return Err(QueryError::InvalidTagName {
            name: name.to_string(),
            position,
        });
    }

    Ok(Token::Tag(name.to_string()))
}
