//! Recursive predicate compilation.
//!
//! Translates a [`Filter`] tree into a single composable [`Condition`]
//! against the hybrid schema. Conditions on fixed columns compare against
//! the user table directly; conditions on dynamic attributes each open
//! their own aliased join against the attribute table so that sibling
//! attribute conditions never interfere with each other's row selection.
//!
//! The mandatory tenant/service-account base predicate is composed by the
//! executor around whatever this module produces — it applies even when the
//! caller supplies no filter at all.

use sea_orm::sea_query::{Alias, Expr, ExprTrait, Func, LikeExpr, SimpleExpr};
use sea_orm::{Condition, Value};

use crate::entities::{user, user_attribute};

use super::fields::{Storage, fixed_field, storage};
use super::filter::{self, Filter, FilterError, Operator, OperatorMode};

/// One aliased join from the user table to the attribute table. Every
/// attribute condition gets its own instance; aliases are derived from a
/// per-compilation counter, so identical input always compiles to identical
/// SQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeJoin {
    pub alias: String,
}

/// Output of a filter compilation: the WHERE condition plus the attribute
/// joins it references. The executor applies the joins to both the page
/// query and the count query.
#[derive(Debug, Clone)]
pub struct CompiledFilter {
    pub condition: Condition,
    pub joins: Vec<AttributeJoin>,
}

/// Compile an optional filter tree. An absent tree compiles to a
/// tautological condition, scoped only by the executor's base predicate.
pub fn compile_filter(
    tree: Option<&Filter>,
    mode: OperatorMode,
) -> Result<CompiledFilter, FilterError> {
    let mut compiler = Compiler {
        mode,
        joins: Vec::new(),
    };
    let condition = match tree {
        None => Condition::all(),
        Some(node) => compiler.node(node)?,
    };
    Ok(CompiledFilter {
        condition,
        joins: compiler.joins,
    })
}

struct Compiler {
    mode: OperatorMode,
    joins: Vec<AttributeJoin>,
}

impl Compiler {
    fn node(&mut self, node: &Filter) -> Result<Condition, FilterError> {
        match node {
            Filter::And(children) => {
                let mut all = Condition::all();
                for child in children {
                    all = all.add(self.node(child)?);
                }
                Ok(all)
            }
            Filter::Or(children) => {
                let mut any = Condition::any();
                for child in children {
                    any = any.add(self.node(child)?);
                }
                Ok(any)
            }
            Filter::Condition(leaf) => self.leaf(leaf),
        }
    }

    fn leaf(&mut self, cond: &filter::Condition) -> Result<Condition, FilterError> {
        // The parser rejects empty value lists; re-check here so that
        // programmatically built trees hold the same invariant.
        if cond.values.is_empty() {
            return Err(FilterError::EmptyValues {
                key: cond.key.clone(),
            });
        }
        let op = cond.operator(self.mode)?;
        match fixed_field(&cond.key) {
            Some(column) => self.fixed(cond, column, op),
            None => Ok(self.attribute(cond, op)),
        }
    }

    /// Attribute condition: fresh aliased join, comparison on the joined
    /// value column. The name-equality clause is appended after negation —
    /// `NOT(value = x)` still requires a row with `name = key`, so a user
    /// without the attribute never matches, negated or not.
    fn attribute(&mut self, cond: &filter::Condition, op: Operator) -> Condition {
        let alias = format!("ua{}", self.joins.len());
        self.joins.push(AttributeJoin {
            alias: alias.clone(),
        });

        let value_col = Expr::col((Alias::new(&alias), user_attribute::Column::Value));
        let (target, values) = folded(value_col, &cond.values, cond.ignore_case);
        let mut predicate = string_predicate(target, op, &values);
        if cond.negate {
            predicate = predicate.not();
        }
        let name_match =
            Expr::col((Alias::new(&alias), user_attribute::Column::Name)).eq(cond.key.clone());
        Condition::all().add(name_match).add(predicate)
    }

    fn fixed(
        &self,
        cond: &filter::Condition,
        column: user::Column,
        op: Operator,
    ) -> Result<Condition, FilterError> {
        let column_expr = Expr::col((user::Entity, column));
        let mut predicate = match storage(column) {
            Storage::Text => {
                let (target, values) = folded(column_expr, &cond.values, cond.ignore_case);
                string_predicate(target, op, &values)
            }
            kind => {
                let values = coerce_values(cond, kind)?;
                value_predicate(column_expr.into(), op, values, &cond.key)?
            }
        };
        if cond.negate {
            predicate = predicate.not();
        }
        Ok(Condition::all().add(predicate))
    }
}

/// Apply case folding: lower-case both the compared expression and every
/// input value. Uniform across all operators, including the ordering ones.
fn folded(column: Expr, values: &[String], ignore_case: bool) -> (SimpleExpr, Vec<String>) {
    if ignore_case {
        (
            SimpleExpr::FunctionCall(Func::lower(column)),
            values.iter().map(|v| v.to_lowercase()).collect(),
        )
    } else {
        (column.into(), values.to_vec())
    }
}

/// Operator semantics over a textual target. `IN` consumes every value; all
/// other operators use the first. Ordering comparisons are lexicographic.
fn string_predicate(target: SimpleExpr, op: Operator, values: &[String]) -> SimpleExpr {
    let first = values[0].clone();
    match op {
        Operator::Eq => target.eq(first),
        Operator::In => target.is_in(values.iter().cloned()),
        Operator::Contains => like(target, format!("%{}%", escape_like(&first))),
        Operator::Starts => like(target, format!("{}%", escape_like(&first))),
        Operator::Ends => like(target, format!("%{}", escape_like(&first))),
        Operator::Gt => target.gt(first),
        Operator::Gte => target.gte(first),
        Operator::Lt => target.lt(first),
        Operator::Lte => target.lte(first),
    }
}

/// Operator semantics over coerced (non-text) values.
fn value_predicate(
    target: SimpleExpr,
    op: Operator,
    values: Vec<Value>,
    key: &str,
) -> Result<SimpleExpr, FilterError> {
    if op.is_substring() {
        return Err(FilterError::UnsupportedOperator {
            key: key.to_owned(),
            op: op.name(),
        });
    }
    let first = values[0].clone();
    Ok(match op {
        Operator::In => target.is_in(values),
        Operator::Gt => target.gt(first),
        Operator::Gte => target.gte(first),
        Operator::Lt => target.lt(first),
        Operator::Lte => target.lte(first),
        _ => target.eq(first),
    })
}

fn coerce_values(cond: &filter::Condition, kind: Storage) -> Result<Vec<Value>, FilterError> {
    cond.values
        .iter()
        .map(|raw| match kind {
            Storage::Boolean => {
                if raw.eq_ignore_ascii_case("true") {
                    Ok(Value::from(true))
                } else if raw.eq_ignore_ascii_case("false") {
                    Ok(Value::from(false))
                } else {
                    Err(invalid(cond, raw))
                }
            }
            Storage::EpochMillis => raw
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| invalid(cond, raw)),
            Storage::Text => Ok(Value::from(raw.clone())),
        })
        .collect()
}

fn invalid(cond: &filter::Condition, raw: &str) -> FilterError {
    FilterError::InvalidValue {
        key: cond.key.clone(),
        value: raw.to_owned(),
    }
}

fn like(target: SimpleExpr, pattern: String) -> SimpleExpr {
    target.like(LikeExpr::new(pattern).escape('\\'))
}

/// Escape LIKE wildcards in a literal so user input never acts as a pattern.
fn escape_like(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
