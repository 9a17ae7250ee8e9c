//! Tag query language.
//!
//! ```text
//! tag:desk AND NOT tag:small OR tag:lamp   ==   (desk AND (NOT small)) OR lamp
//! ```
//!
//! Precedence is NOT > AND > OR, left-associative, with no grouping. Text
//! goes through [`lexer::tokenize`], then [`validate::validate`], then the
//! parser; the resulting tree is evaluated against a candidate's tags.

mod eval;
mod lexer;
mod parser;
mod validate;

pub use eval::eval;
pub use lexer::{tokenize, Token, TAG_PREFIX};
pub use parser::QueryExpr;
pub use validate::validate;

use crate::{errors::QueryError, tags::TagSet};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Compiled {
    /// Empty query: no constraint.
    All,
    Expr(QueryExpr),
    /// The parser rejected input the validator accepted.
    Nothing,
}

/// A validated query, ready to test many candidates without re-parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    compiled: Compiled,
}

impl Query {
    /// Tokenizes and validates `text`. Tokenizer and validator errors are
    /// returned as-is.
    ///
    /// Validated input the parser still rejects is a bug in one of the two;
    /// it is logged and the query then matches nothing.
    pub fn compile(text: &str) -> Result<Query, QueryError> {
        let tokens = tokenize(text)?;
        validate(&tokens)?;

        let compiled = match parser::parse(tokens) {
            Ok(None) => Compiled::All,
            Ok(Some(expr)) => Compiled::Expr(expr),
            Err(err) => {
                log::error!("validated query rejected by parser: {text:?}: {err}");
                Compiled::Nothing
            }
        };
        Ok(Query { compiled })
    }

    /// True for the empty query, which places no constraint on candidates.
    pub fn is_unconstrained(&self) -> bool {
        self.compiled == Compiled::All
    }

    pub fn matches(&self, tags: &TagSet) -> bool {
        match &self.compiled {
            Compiled::All => true,
            Compiled::Expr(expr) => eval(expr, tags),
            Compiled::Nothing => false,
        }
    }
}

/// Checks `text` without evaluating it against anything; suited to live
/// input feedback.
pub fn validate_query(text: &str) -> Result<(), QueryError> {
    validate(&tokenize(text)?)
}

/// One-shot evaluation of `text` against a tag set.
pub fn evaluate_query(text: &str, tags: &TagSet) -> Result<bool, QueryError> {
    Ok(Query::compile(text)?.matches(tags))
}

/// Parses tokens that have not been validated. Errors on anything outside
/// the grammar.
pub fn parse(tokens: Vec<Token>) -> Result<Option<QueryExpr>, QueryError> {
    parser::parse(tokens)
}
