use super::lexer::Token;
use crate::errors::QueryError;

/// Structural check of a token stream, without building a tree or touching
/// any candidate. Accepts exactly the sequences the parser accepts:
/// `[NOT] tag ((AND|OR) [NOT] tag)*`, or nothing at all.
pub fn validate(tokens: &[Token]) -> Result<(), QueryError> {
    // true while a tag reference (optionally preceded by one NOT) is required
    let mut expect_operand = true;
    let mut prev: Option<&Token> = None;

    for (position, tok) in tokens.iter().enumerate() {
        match tok {
            Token::Tag(_) => {
                if !expect_operand {
                    return Err(QueryError::malformed(
                        format!("expected AND or OR before {tok}"),
                        position,
                    ));
                }
                expect_operand = false;
            }
            Token::Not => {
                if !expect_operand {
                    return Err(QueryError::malformed(
                        "expected AND or OR before NOT",
                        position,
                    ));
                }
                if matches!(prev, Some(Token::Not)) {
                    return Err(QueryError::malformed(
                        "NOT must be followed by a tag",
                        position,
                    ));
                }
            }
            Token::And | Token::Or => {
                if expect_operand {
                    let message = match prev {
                        None => format!("query cannot start with {tok}"),
                        Some(Token::Not) => "NOT must be followed by a tag".to_string(),
                        Some(p) => format!("{tok} cannot follow {p}"),
                    };
                    return Err(QueryError::malformed(message, position));
                }
                expect_operand = true;
            }
        }
        prev = Some(tok);
    }

    match prev {
        Some(Token::Not) if expect_operand => Err(QueryError::malformed(
            "NOT must be followed by a tag",
            tokens.len() - 1,
        )),
        Some(tok) if expect_operand => Err(QueryError::malformed(
            format!("query cannot end with {tok}"),
            tokens.len() - 1,
        )),
        _ => Ok(()),
    }
}
