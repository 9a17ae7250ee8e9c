use super::lexer::Token;
use crate::errors::QueryError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryExpr {
    Tag(String),
    And(Box<QueryExpr>, Box<QueryExpr>),
    Or(Box<QueryExpr>, Box<QueryExpr>),
    Not(Box<QueryExpr>),
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    /// or_expr = and_expr ("OR" and_expr)*
    fn parse_or(&mut self) -> Result<QueryExpr, QueryError> {
        let mut left = self.parse_and()?;
        while matches!(self.peek(), Some(Token::Or)) {
            self.advance();
            let right = self.parse_and()?;
            left = QueryExpr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    /// and_expr = not_expr ("AND" not_expr)*
    fn parse_and(&mut self) -> Result<QueryExpr, QueryError> {
        let mut left = self.parse_not()?;
        while matches!(self.peek(), Some(Token::And)) {
            self.advance();
            let right = self.parse_not()?;
            left = QueryExpr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    /// not_expr = ["NOT"] tag_ref
    fn parse_not(&mut self) -> Result<QueryExpr, QueryError> {
        if matches!(self.peek(), Some(Token::Not)) {
            self.advance();
            let inner = self.parse_tag()?;
            return Ok(QueryExpr::Not(Box::new(inner)));
        }
        self.parse_tag()
    }

    fn parse_tag(&mut self) -> Result<QueryExpr, QueryError> {
        match self.advance() {
            Some(Token::Tag(name)) => Ok(QueryExpr::Tag(name)),
            Some(tok) => Err(QueryError::malformed(
                format!("expected a tag, got {tok}"),
                self.pos - 1,
            )),
            None => Err(QueryError::malformed(
                "unexpected end of query",
                self.pos,
            )),
        }
    }
}

/// Parses tokens into an expression tree. `Ok(None)` means an empty query,
/// which matches every candidate.
pub fn parse(tokens: Vec<Token>) -> Result<Option<QueryExpr>, QueryError> {
    if tokens.is_empty() {
        return Ok(None);
    }
    let mut parser = Parser::new(tokens);
    let result = parser.parse_or()?;
    if let Some(tok) = parser.peek() {
        return Err(QueryError::malformed(
            format!("unexpected {tok}"),
            parser.pos,
        ));
    }
    Ok(Some(result))
}
