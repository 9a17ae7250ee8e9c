use super::parser::QueryExpr;
use crate::tags::TagSet;

/// Pure evaluation against one candidate's tags. Tag comparison is exact and
/// case-sensitive.
pub fn eval(expr: &QueryExpr, tags: &TagSet) -> bool {
    match expr {
        QueryExpr::Tag(name) => tags.contains(name),
        QueryExpr::And(a, b) => eval(a, tags) && eval(b, tags),
        QueryExpr::Or(a, b) => eval(a, tags) || eval(b, tags),
        QueryExpr::Not(inner) => !eval(inner, tags),
    }
}
