//! Filter expressions and their driver-native document form.
//!
//! Model operations take filters as BSON documents in the store's native syntax
//! (`{ "age": { "$gte": 18 } }`), so `bson::doc!` literals work directly. The
//! [`Filter`] helpers build the same documents from a typed expression tree:
//!
//! ```ignore
//! use docmodel::query::Filter;
//!
//! let filter = Filter::eq("status", "active")
//!     .and(Filter::gte("age", 18));
//!
//! let adults = users.find(filter, None).await?;
//! ```
//!
//! Expressions are walked with a [`QueryVisitor`]. [`FilterDocumentWriter`] renders an
//! expression into a filter document, and [`Expr::from_document`] reads a filter
//! document back into an expression so drivers without a query engine of their own
//! can evaluate it.
//!
//! Supported operators: `$eq`, `$ne`, `$gt`, `$gte`, `$lt`, `$lte`, `$in`, `$nin`,
//! `$exists`, `$not` (field level), `$and`, `$or`, `$nor`.

use bson::{Bson, Document as BsonDocument, doc};

use crate::error::{DocumentStoreError, DocumentStoreResult};

/// Field comparison operators for filter expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOp {
    /// Equal to (exact match, or any element of an array field).
    Eq,
    /// Not equal to.
    Ne,
    /// Greater than.
    Gt,
    /// Greater than or equal to.
    Gte,
    /// Less than.
    Lt,
    /// Less than or equal to.
    Lte,
    /// Field matches any of the values.
    AnyOf,
    /// Field matches none of the values.
    NoneOf,
}

impl FieldOp {
    /// The operator keyword used in filter documents.
    pub fn keyword(&self) -> &'static str {
        match self {
            FieldOp::Eq => "$eq",
            FieldOp::Ne => "$ne",
            FieldOp::Gt => "$gt",
            FieldOp::Gte => "$gte",
            FieldOp::Lt => "$lt",
            FieldOp::Lte => "$lte",
            FieldOp::AnyOf => "$in",
            FieldOp::NoneOf => "$nin",
        }
    }

    fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "$eq" => FieldOp::Eq,
            "$ne" => FieldOp::Ne,
            "$gt" => FieldOp::Gt,
            "$gte" => FieldOp::Gte,
            "$lt" => FieldOp::Lt,
            "$lte" => FieldOp::Lte,
            "$in" => FieldOp::AnyOf,
            "$nin" => FieldOp::NoneOf,
            _ => return None,
        })
    }
}

/// A filter expression for querying documents.
///
/// Expressions can be combined using logical operators (`And`, `Or`, `Not`)
/// to build complex filter predicates.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Logical AND of multiple expressions (all must match). An empty list matches everything.
    And(Vec<Expr>),
    /// Logical OR of multiple expressions (any must match).
    Or(Vec<Expr>),
    /// Logical NOT of an expression (inverts the result).
    Not(Box<Expr>),
    /// Checks if a field exists or doesn't exist.
    Exists(String, bool),
    /// Field comparison expression.
    Field {
        /// The field name to compare. Dotted names address nested fields.
        field: String,
        /// The comparison operator.
        op: FieldOp,
        /// The value to compare against.
        value: Bson,
    },
}

impl Expr {
    /// Creates a field comparison expression.
    pub fn field(field: String, op: FieldOp, value: Bson) -> Self {
        Expr::Field { field, op, value }
    }

    /// Combines this expression with another using logical AND.
    ///
    /// If this expression is already an AND, the other expression is appended
    /// to the list. Otherwise, a new AND expression is created.
    pub fn and(self, other: Expr) -> Self {
        match self {
            Expr::And(mut list) => {
                list.push(other);
                Expr::And(list)
            }
            _ => Expr::And(vec![self, other]),
        }
    }

    /// Combines this expression with another using logical OR.
    pub fn or(self, other: Expr) -> Self {
        match self {
            Expr::Or(mut list) => {
                list.push(other);
                Expr::Or(list)
            }
            _ => Expr::Or(vec![self, other]),
        }
    }

    /// Negates this expression (logical NOT).
    pub fn not(self) -> Self {
        Expr::Not(Box::new(self))
    }

    /// Renders this expression as a filter document.
    pub fn to_document(&self) -> BsonDocument {
        match FilterDocumentWriter.visit_expr(self) {
            Ok(document) => document,
            Err(never) => match never {},
        }
    }

    /// Parses a filter document into an expression.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::InvalidFilter`] for unsupported operators or
    /// operands of the wrong type (for example `$in` without an array).
    pub fn from_document(filter: &BsonDocument) -> DocumentStoreResult<Expr> {
        let mut conditions = Vec::with_capacity(filter.len());

        for (key, value) in filter {
            match key.as_str() {
                "$and" => conditions.push(Expr::And(parse_clauses(key, value)?)),
                "$or" => conditions.push(Expr::Or(parse_clauses(key, value)?)),
                "$nor" => conditions.push(Expr::Or(parse_clauses(key, value)?).not()),
                op if op.starts_with('$') => {
                    return Err(DocumentStoreError::InvalidFilter(format!(
                        "unsupported top-level operator {op}"
                    )));
                }
                field => conditions.push(parse_condition(field, value)?),
            }
        }

        Ok(match conditions.len() {
            1 => conditions.remove(0),
            _ => Expr::And(conditions),
        })
    }
}

impl From<Expr> for BsonDocument {
    fn from(expr: Expr) -> Self {
        expr.to_document()
    }
}

fn parse_clauses(op: &str, value: &Bson) -> DocumentStoreResult<Vec<Expr>> {
    let Bson::Array(clauses) = value else {
        return Err(DocumentStoreError::InvalidFilter(format!("{op} requires an array")));
    };

    clauses
        .iter()
        .map(|clause| match clause {
            Bson::Document(clause) => Expr::from_document(clause),
            _ => Err(DocumentStoreError::InvalidFilter(format!(
                "{op} entries must be documents"
            ))),
        })
        .collect()
}

fn is_operator_document(value: &Bson) -> bool {
    match value {
        Bson::Document(doc) => doc.keys().next().is_some_and(|key| key.starts_with('$')),
        _ => false,
    }
}

fn parse_condition(field: &str, value: &Bson) -> DocumentStoreResult<Expr> {
    let operators = match value {
        Bson::Document(operators) if is_operator_document(value) => operators,
        _ => return Ok(Expr::field(field.to_string(), FieldOp::Eq, value.clone())),
    };

    let mut conditions = Vec::with_capacity(operators.len());

    for (keyword, operand) in operators {
        let condition = match keyword.as_str() {
            "$exists" => match operand {
                Bson::Boolean(should_exist) => Expr::Exists(field.to_string(), *should_exist),
                _ => {
                    return Err(DocumentStoreError::InvalidFilter(
                        "$exists requires a boolean".to_string(),
                    ));
                }
            },
            "$not" if is_operator_document(operand) => parse_condition(field, operand)?.not(),
            "$not" => {
                return Err(DocumentStoreError::InvalidFilter(
                    "$not requires an operator document".to_string(),
                ));
            }
            keyword => {
                let op = FieldOp::from_keyword(keyword).ok_or_else(|| {
                    DocumentStoreError::InvalidFilter(format!("unsupported operator {keyword}"))
                })?;

                if matches!(op, FieldOp::AnyOf | FieldOp::NoneOf) && !matches!(operand, Bson::Array(_)) {
                    return Err(DocumentStoreError::InvalidFilter(format!(
                        "{keyword} requires an array"
                    )));
                }

                Expr::field(field.to_string(), op, operand.clone())
            }
        };

        conditions.push(condition);
    }

    Ok(match conditions.len() {
        1 => conditions.remove(0),
        _ => Expr::And(conditions),
    })
}

/// Helper struct for constructing filter expressions.
///
/// All methods accept field names and values as `Into<String>` and `Into<Bson>` for ergonomics.
pub struct Filter;

impl Filter {
    /// Matches documents where the field equals the specified value.
    pub fn eq(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Eq, value.into())
    }

    /// Matches documents where the field does not equal the specified value.
    pub fn ne(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Ne, value.into())
    }

    /// Matches documents where the field is greater than the specified value.
    pub fn gt(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Gt, value.into())
    }

    /// Matches documents where the field is greater than or equal to the specified value.
    pub fn gte(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Gte, value.into())
    }

    /// Matches documents where the field is less than the specified value.
    pub fn lt(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Lt, value.into())
    }

    /// Matches documents where the field is less than or equal to the specified value.
    pub fn lte(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Lte, value.into())
    }

    /// Matches documents where the field exists.
    pub fn exists(field: impl Into<String>) -> Expr {
        Expr::Exists(field.into(), true)
    }

    /// Matches documents where the field is missing.
    pub fn not_exists(field: impl Into<String>) -> Expr {
        Expr::Exists(field.into(), false)
    }

    /// Combines multiple expressions such that all must match.
    pub fn and(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::And(exprs.into_iter().collect())
    }

    /// Combines multiple expressions such that any can match.
    pub fn or(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::Or(exprs.into_iter().collect())
    }

    /// Matches documents where the field equals any of the values.
    pub fn any_of<V: Into<Bson>>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Expr {
        Expr::field(
            field.into(),
            FieldOp::AnyOf,
            Bson::Array(values.into_iter().map(Into::into).collect()),
        )
    }

    /// Matches documents where the field equals none of the values.
    pub fn none_of<V: Into<Bson>>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Expr {
        Expr::field(
            field.into(),
            FieldOp::NoneOf,
            Bson::Array(values.into_iter().map(Into::into).collect()),
        )
    }
}

pub trait QueryVisitor {
    type Output;
    type Error;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error>;
    fn visit_exists(
        &mut self,
        field: &str,
        should_exist: bool,
    ) -> Result<Self::Output, Self::Error>;
    fn visit_field(
        &mut self,
        field: &str,
        op: &FieldOp,
        value: &Bson,
    ) -> Result<Self::Output, Self::Error>;

    fn visit_expr(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        match expr {
            Expr::And(exprs) => self.visit_and(exprs),
            Expr::Or(exprs) => self.visit_or(exprs),
            Expr::Not(expr) => self.visit_not(expr),
            Expr::Exists(field, should_exist) => self.visit_exists(field, *should_exist),
            Expr::Field { field, op, value } => self.visit_field(field, op, value),
        }
    }
}

/// Renders expressions into driver-native filter documents.
pub struct FilterDocumentWriter;

impl QueryVisitor for FilterDocumentWriter {
    type Output = BsonDocument;
    type Error = std::convert::Infallible;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        if exprs.is_empty() {
            return Ok(BsonDocument::new());
        }

        Ok(doc! {
            "$and": exprs
                .iter()
                .map(|expr| self.visit_expr(expr))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            "$or": exprs
                .iter()
                .map(|expr| self.visit_expr(expr))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    // Field-level $not cannot wrap $and/$or, $nor can wrap anything.
    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            "$nor": [self.visit_expr(expr)?],
        })
    }

    fn visit_exists(&mut self, field: &str, should_exist: bool) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            field: { "$exists": should_exist },
        })
    }

    fn visit_field(&mut self, field: &str, op: &FieldOp, value: &Bson) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            field: { op.keyword(): value.clone() },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_field_operators() {
        assert_eq!(Filter::eq("name", "Alice").to_document(), doc! { "name": { "$eq": "Alice" } });
        assert_eq!(Filter::gte("age", 18).to_document(), doc! { "age": { "$gte": 18 } });
        assert_eq!(
            Filter::any_of("tag", ["a", "b"]).to_document(),
            doc! { "tag": { "$in": ["a", "b"] } }
        );
        assert_eq!(Filter::not_exists("deleted_at").to_document(), doc! { "deleted_at": { "$exists": false } });
    }

    #[test]
    fn renders_logical_operators() {
        let filter = Filter::eq("a", 1).and(Filter::eq("b", 2)).to_document();
        assert_eq!(filter, doc! { "$and": [{ "a": { "$eq": 1 } }, { "b": { "$eq": 2 } }] });

        let filter = Filter::eq("a", 1).not().to_document();
        assert_eq!(filter, doc! { "$nor": [{ "a": { "$eq": 1 } }] });

        assert_eq!(Expr::And(vec![]).to_document(), doc! {});
    }

    #[test]
    fn parses_implicit_equality() {
        let expr = Expr::from_document(&doc! { "name": "Alice" }).unwrap();
        assert_eq!(expr, Filter::eq("name", "Alice"));

        let expr = Expr::from_document(&doc! { "name": "Alice", "age": 30 }).unwrap();
        assert_eq!(expr, Filter::and([Filter::eq("name", "Alice"), Filter::eq("age", 30)]));
    }

    #[test]
    fn embedded_documents_without_operators_are_equality() {
        let expr = Expr::from_document(&doc! { "address": { "city": "Lima" } }).unwrap();
        assert_eq!(expr, Filter::eq("address", doc! { "city": "Lima" }));
    }

    #[test]
    fn parses_operator_documents() {
        let expr = Expr::from_document(&doc! { "age": { "$gte": 18, "$lt": 65 } }).unwrap();
        assert_eq!(expr, Filter::and([Filter::gte("age", 18), Filter::lt("age", 65)]));

        let expr = Expr::from_document(&doc! { "age": { "$not": { "$gt": 5 } } }).unwrap();
        assert_eq!(expr, Filter::gt("age", 5).not());

        let expr = Expr::from_document(&doc! { "$or": [{ "a": 1 }, { "b": { "$exists": true } }] }).unwrap();
        assert_eq!(expr, Filter::or([Filter::eq("a", 1), Filter::exists("b")]));
    }

    #[test]
    fn written_documents_parse_back() {
        let expr = Filter::eq("status", "active")
            .and(Filter::none_of("role", ["guest"]))
            .and(Filter::lte("score", 10).not());

        assert_eq!(Expr::from_document(&expr.to_document()).unwrap(), Filter::and([
            Filter::eq("status", "active"),
            Filter::none_of("role", ["guest"]),
            Filter::or([Filter::lte("score", 10)]).not(),
        ]));
    }

    #[test]
    fn rejects_unsupported_operators() {
        for filter in [
            doc! { "$where": "true" },
            doc! { "name": { "$regex": "^A" } },
            doc! { "tags": { "$in": "a" } },
            doc! { "a": { "$exists": 1 } },
            doc! { "$and": { "a": 1 } },
            doc! { "a": { "$not": 5 } },
        ] {
            assert!(
                matches!(Expr::from_document(&filter), Err(DocumentStoreError::InvalidFilter(_))),
                "expected {filter} to be rejected"
            );
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert_eq!(Expr::from_document(&doc! {}).unwrap(), Expr::And(vec![]));
    }
}
