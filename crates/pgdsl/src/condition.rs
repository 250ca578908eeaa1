//! Predicate trees used by `on`, `filter` and `and`.

use crate::render::Renderer;
use crate::schema::{Column, Field, IntoField};
use crate::value::{ColumnType, IntoValue, Value};

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl CompareOp {
    pub fn as_sql(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
        }
    }
}

/// One side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Field(Field),
    Value(Value),
    /// `lower(operand)`
    Lower(Box<Operand>),
}

impl Operand {
    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a Field>) {
        match self {
            Operand::Field(f) => out.push(f),
            Operand::Value(_) => {}
            Operand::Lower(inner) => inner.collect_fields(out),
        }
    }

    fn lower(self) -> Self {
        Operand::Lower(Box::new(self))
    }

    fn render(&self, r: &mut Renderer<'_>) {
        match self {
            Operand::Field(f) => f.render_qualified(r),
            Operand::Value(v) => r.bind(v),
            Operand::Lower(inner) => {
                r.keyword("lower");
                r.push("(");
                inner.render(r);
                r.push(")");
            }
        }
    }
}

/// A boolean predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Compare {
        left: Operand,
        op: CompareOp,
        right: Operand,
    },
    IsNull {
        operand: Operand,
        negated: bool,
    },
    And(Box<Condition>, Box<Condition>),
}

impl Condition {
    pub fn compare(left: Operand, op: CompareOp, right: Operand) -> Self {
        Condition::Compare { left, op, right }
    }

    /// Conjunction with `other`; chains associate to the left.
    pub fn and(self, other: Condition) -> Self {
        Condition::And(Box::new(self), Box::new(other))
    }

    /// Every column referenced by this predicate, left to right.
    pub fn fields(&self) -> Vec<&Field> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a Field>) {
        match self {
            Condition::Compare { left, right, .. } => {
                left.collect_fields(out);
                right.collect_fields(out);
            }
            Condition::IsNull { operand, .. } => operand.collect_fields(out),
            Condition::And(l, r) => {
                l.collect_fields(out);
                r.collect_fields(out);
            }
        }
    }

    pub(crate) fn render(&self, r: &mut Renderer<'_>) {
        match self {
            Condition::Compare { left, op, right } => {
                left.render(r);
                r.push(" ");
                r.push(op.as_sql());
                r.push(" ");
                right.render(r);
            }
            Condition::IsNull { operand, negated } => {
                operand.render(r);
                r.push(" ");
                r.keyword("is");
                r.push(" ");
                if *negated {
                    r.keyword("not");
                    r.push(" ");
                }
                r.keyword("null");
            }
            Condition::And(left, right) => {
                left.render(r);
                r.push(" ");
                r.keyword("and");
                r.push(" ");
                right.render(r);
            }
        }
    }
}

impl<T: ColumnType> Column<T> {
    fn against_value(&self, op: CompareOp, value: T) -> Condition {
        Condition::compare(
            Operand::Field(self.field().clone()),
            op,
            Operand::Value(value.into_value()),
        )
    }

    /// `column = value`
    pub fn eq(&self, value: impl Into<T>) -> Condition {
        self.against_value(CompareOp::Eq, value.into())
    }

    /// Alias for [`Column::eq`].
    pub fn equal(&self, value: impl Into<T>) -> Condition {
        self.eq(value)
    }

    pub fn ne(&self, value: impl Into<T>) -> Condition {
        self.against_value(CompareOp::Ne, value.into())
    }

    pub fn gt(&self, value: impl Into<T>) -> Condition {
        self.against_value(CompareOp::Gt, value.into())
    }

    pub fn ge(&self, value: impl Into<T>) -> Condition {
        self.against_value(CompareOp::Ge, value.into())
    }

    pub fn lt(&self, value: impl Into<T>) -> Condition {
        self.against_value(CompareOp::Lt, value.into())
    }

    pub fn le(&self, value: impl Into<T>) -> Condition {
        self.against_value(CompareOp::Le, value.into())
    }

    /// `column = other`, both sides columns of the same type.
    pub fn eq_col(&self, other: &Column<T>) -> Condition {
        Condition::compare(
            Operand::Field(self.field().clone()),
            CompareOp::Eq,
            Operand::Field(other.field().clone()),
        )
    }

    /// Alias for [`Column::eq_col`].
    pub fn equal_col(&self, other: &Column<T>) -> Condition {
        self.eq_col(other)
    }

    pub fn is_null(&self) -> Condition {
        Condition::IsNull {
            operand: Operand::Field(self.field().clone()),
            negated: false,
        }
    }

    pub fn is_not_null(&self) -> Condition {
        Condition::IsNull {
            operand: Operand::Field(self.field().clone()),
            negated: true,
        }
    }
}

impl Field {
    /// `field = other`. Untyped, for plain-SQL fields.
    pub fn equal(&self, other: impl IntoField) -> Condition {
        Condition::compare(
            Operand::Field(self.clone()),
            CompareOp::Eq,
            Operand::Field(other.into_field()),
        )
    }

    /// `field = value`. Untyped, for plain-SQL fields.
    pub fn equal_value(&self, value: impl IntoValue) -> Condition {
        Condition::compare(
            Operand::Field(self.clone()),
            CompareOp::Eq,
            Operand::Value(value.into_value()),
        )
    }
}

impl Column<String> {
    /// `lower(column) = lower(value)`
    pub fn equal_ignore_case(&self, value: impl Into<String>) -> Condition {
        Condition::compare(
            Operand::Field(self.field().clone()).lower(),
            CompareOp::Eq,
            Operand::Value(Value::Text(value.into())).lower(),
        )
    }

    /// `lower(column) = lower(other)`
    pub fn equal_ignore_case_col(&self, other: &Column<String>) -> Condition {
        Condition::compare(
            Operand::Field(self.field().clone()).lower(),
            CompareOp::Eq,
            Operand::Field(other.field().clone()).lower(),
        )
    }
}
