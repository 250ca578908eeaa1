//! Schema metadata: tables, aliases and typed columns.
//!
//! Table bindings are plain structs generated with [`table!`](crate::table): one
//! [`Column<T>`] field per declared column plus a [`TableRef`] naming the relation. Aliasing a
//! table (`PERSON.as_alias("p")`) rebinds every column to the aliased reference, so columns
//! of `p` and of `PERSON` are distinct scope entries within one statement.
//!
//! [`PlainTable`] and plain fields cover the untyped side: names written as raw SQL, rendered
//! without quoting, still checked against the statement's scope.

use crate::render::Renderer;
use crate::value::ColumnType;
use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;

/// Declared SQL type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlType {
    SmallInt,
    Integer,
    BigInt,
    Real,
    Double,
    Boolean,
    Text,
    Timestamp,
    TimestampTz,
    Date,
    Uuid,
    Jsonb,
    Bytea,
    /// Plain-SQL field; the database decides.
    Unknown,
}

impl SqlType {
    /// PostgreSQL spelling of the type.
    pub fn as_sql(&self) -> &'static str {
        match self {
            SqlType::SmallInt => "smallint",
            SqlType::Integer => "integer",
            SqlType::BigInt => "bigint",
            SqlType::Real => "real",
            SqlType::Double => "double precision",
            SqlType::Boolean => "boolean",
            SqlType::Text => "text",
            SqlType::Timestamp => "timestamp",
            SqlType::TimestampTz => "timestamptz",
            SqlType::Date => "date",
            SqlType::Uuid => "uuid",
            SqlType::Jsonb => "jsonb",
            SqlType::Bytea => "bytea",
            SqlType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// A reference to a relation, optionally aliased.
///
/// Two references denote the same scope entry iff schema, name and alias all match. A plain
/// reference carries raw SQL text as its name and no schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    schema: &'static str,
    name: Cow<'static, str>,
    alias: Option<Cow<'static, str>>,
    plain: bool,
}

impl TableRef {
    /// Create an unaliased reference to `schema.name`.
    pub const fn new(schema: &'static str, name: &'static str) -> Self {
        Self {
            schema,
            name: Cow::Borrowed(name),
            alias: None,
            plain: false,
        }
    }

    /// Reference rendered exactly as written, e.g. `PERSON` or `public.person`.
    pub fn plain(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            schema: "",
            name: name.into(),
            alias: None,
            plain: true,
        }
    }

    /// Same relation under a different alias.
    pub fn with_alias(&self, alias: impl Into<Cow<'static, str>>) -> Self {
        Self {
            alias: Some(alias.into()),
            ..self.clone()
        }
    }

    /// Schema name; empty for plain references.
    pub fn schema(&self) -> &'static str {
        self.schema
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn is_plain(&self) -> bool {
        self.plain
    }

    /// Whether both references point at the same relation, ignoring aliases.
    pub fn same_relation(&self, other: &TableRef) -> bool {
        self.plain == other.plain && self.schema == other.schema && self.name == other.name
    }

    /// Whether both references would expose the same name in one FROM clause.
    ///
    /// Unaliased tables clash when they are the same relation; otherwise the alias (or bare
    /// table name) is compared.
    pub fn clashes_with(&self, other: &TableRef) -> bool {
        match (&self.alias, &other.alias) {
            (None, None) => self.same_relation(other),
            _ => self.exposed_name() == other.exposed_name(),
        }
    }

    fn exposed_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    fn render_name(&self, r: &mut Renderer<'_>) {
        if self.plain {
            r.push(&self.name);
        } else {
            r.ident(self.schema);
            r.push(".");
            r.ident(&self.name);
        }
    }

    /// Render as a FROM/JOIN source: `"schema"."table"` or `"schema"."table" as "alias"`.
    pub(crate) fn render_source(&self, r: &mut Renderer<'_>) {
        self.render_name(r);
        if let Some(alias) = &self.alias {
            r.push(" ");
            r.keyword("as");
            r.push(" ");
            r.ident(alias);
        }
    }

    /// Render the qualifier used in front of column names.
    pub(crate) fn render_qualifier(&self, r: &mut Renderer<'_>) {
        match &self.alias {
            Some(alias) => r.ident(alias),
            None => self.render_name(r),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.plain {
            f.write_str(&self.name)?;
        } else {
            write!(f, "{}.{}", self.schema, self.name)?;
        }
        if let Some(alias) = &self.alias {
            write!(f, " as {alias}")?;
        }
        Ok(())
    }
}

/// An untyped column reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    table: TableRef,
    name: Cow<'static, str>,
    sql_type: SqlType,
    nullable: bool,
}

impl Field {
    pub const fn new(table: TableRef, name: &'static str, sql_type: SqlType, nullable: bool) -> Self {
        Self {
            table,
            name: Cow::Borrowed(name),
            sql_type,
            nullable,
        }
    }

    /// Untyped, nullable column of a plain table.
    pub fn plain(table: TableRef, name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            table,
            name: name.into(),
            sql_type: SqlType::Unknown,
            nullable: true,
        }
    }

    pub fn table(&self) -> &TableRef {
        &self.table
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sql_type(&self) -> SqlType {
        self.sql_type
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// The same column on another reference to its relation.
    pub fn rebind(&self, table: &TableRef) -> Self {
        Self {
            table: table.clone(),
            ..self.clone()
        }
    }

    /// `"qualifier"."column"`.
    pub(crate) fn render_qualified(&self, r: &mut Renderer<'_>) {
        self.table.render_qualifier(r);
        r.push(".");
        if self.table.plain {
            r.push(&self.name);
        } else {
            r.ident(&self.name);
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.table.alias() {
            Some(alias) => write!(f, "{alias}.{}", self.name),
            None if self.table.plain => write!(f, "{}.{}", self.table.name, self.name),
            None => write!(f, "{}.{}.{}", self.table.schema, self.table.name, self.name),
        }
    }
}

/// A typed column reference. `T` is the Rust type of the column's non-null values.
pub struct Column<T> {
    field: Field,
    _marker: PhantomData<fn() -> T>,
}

impl<T: ColumnType> Column<T> {
    pub const fn new(table: TableRef, name: &'static str, nullable: bool) -> Self {
        Self {
            field: Field::new(table, name, T::SQL_TYPE, nullable),
            _marker: PhantomData,
        }
    }
}

impl<T> Column<T> {
    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn name(&self) -> &str {
        self.field.name()
    }

    pub fn table(&self) -> &TableRef {
        &self.field.table
    }

    /// The same column on another reference to its relation.
    pub fn rebind(&self, table: &TableRef) -> Self {
        Self {
            field: self.field.rebind(table),
            _marker: PhantomData,
        }
    }
}

impl<T> Clone for Column<T> {
    fn clone(&self) -> Self {
        Self {
            field: self.field.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Column<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Column").field(&self.field).finish()
    }
}

impl<T> PartialEq for Column<T> {
    fn eq(&self, other: &Self) -> bool {
        self.field == other.field
    }
}

/// A table binding, usually generated with [`table!`](crate::table).
pub trait Table: fmt::Debug + Clone + Send + Sync + 'static {
    /// Reference used when rendering this table.
    fn table_ref(&self) -> &TableRef;

    /// Declared columns in schema order.
    fn fields(&self) -> Vec<Field>;

    /// Primary key column.
    fn primary_key(&self) -> &Field;

    /// The same table under `alias`.
    fn as_alias(&self, alias: &str) -> Self;
}

/// Anything that can stand in a FROM or JOIN clause.
pub trait Relation {
    /// Reference rendered for this relation.
    fn relation(&self) -> &TableRef;

    /// Columns selected by an empty projection; empty when they are not known.
    fn columns(&self) -> Vec<Field>;
}

impl<T: Table> Relation for T {
    fn relation(&self) -> &TableRef {
        self.table_ref()
    }

    fn columns(&self) -> Vec<Field> {
        self.fields()
    }
}

/// A table named in plain SQL. Its columns are not known, so selecting everything from it
/// renders `*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlainTable {
    table: TableRef,
}

impl PlainTable {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            table: TableRef::plain(name),
        }
    }

    /// A column of this table, under its current alias.
    pub fn field(&self, name: impl Into<Cow<'static, str>>) -> Field {
        Field::plain(self.table.clone(), name)
    }

    pub fn as_alias(&self, alias: &str) -> Self {
        Self {
            table: self.table.with_alias(alias.to_string()),
        }
    }
}

impl Relation for PlainTable {
    fn relation(&self) -> &TableRef {
        &self.table
    }

    fn columns(&self) -> Vec<Field> {
        Vec::new()
    }
}

/// Anything usable as one projected column.
pub trait IntoField {
    fn into_field(self) -> Field;
}

impl IntoField for Field {
    fn into_field(self) -> Field {
        self
    }
}

impl IntoField for &Field {
    fn into_field(self) -> Field {
        self.clone()
    }
}

impl<T> IntoField for Column<T> {
    fn into_field(self) -> Field {
        self.field
    }
}

impl<T> IntoField for &Column<T> {
    fn into_field(self) -> Field {
        self.field.clone()
    }
}

/// Anything usable as a projection list: a single column, a tuple of columns, or a
/// collection of fields.
pub trait IntoFields {
    fn into_fields(self) -> Vec<Field>;
}

impl IntoFields for () {
    fn into_fields(self) -> Vec<Field> {
        Vec::new()
    }
}

impl IntoFields for Field {
    fn into_fields(self) -> Vec<Field> {
        vec![self]
    }
}

impl IntoFields for &Field {
    fn into_fields(self) -> Vec<Field> {
        vec![self.clone()]
    }
}

impl<T> IntoFields for &Column<T> {
    fn into_fields(self) -> Vec<Field> {
        vec![self.field.clone()]
    }
}

impl<F: IntoField> IntoFields for Vec<F> {
    fn into_fields(self) -> Vec<Field> {
        self.into_iter().map(IntoField::into_field).collect()
    }
}

impl<F: IntoField, const N: usize> IntoFields for [F; N] {
    fn into_fields(self) -> Vec<Field> {
        self.into_iter().map(IntoField::into_field).collect()
    }
}

macro_rules! tuple_into_fields {
    ($($name:ident),+) => {
        impl<$($name: IntoField),+> IntoFields for ($($name,)+) {
            #[allow(non_snake_case)]
            fn into_fields(self) -> Vec<Field> {
                let ($($name,)+) = self;
                vec![$($name.into_field()),+]
            }
        }
    };
}

tuple_into_fields!(A);
tuple_into_fields!(A, B);
tuple_into_fields!(A, B, C);
tuple_into_fields!(A, B, C, D);
tuple_into_fields!(A, B, C, D, E);
tuple_into_fields!(A, B, C, D, E, F);
tuple_into_fields!(A, B, C, D, E, F, G);
tuple_into_fields!(A, B, C, D, E, F, G, H);

/// Declare a table binding.
///
/// ```ignore
/// pgdsl::table! {
///     /// The `public.person` table.
///     pub struct Person => "public"."person" {
///         #[primary_key]
///         id: i64 = "id",
///         first_name: String = "first_name",
///         last_name: String = "last_name" [nullable],
///     }
/// }
///
/// pub const PERSON: Person = Person::new();
/// ```
#[macro_export]
macro_rules! table {
    (@nullable) => { false };
    (@nullable nullable) => { true };
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident => $schema:literal . $table:literal {
            #[primary_key]
            $pk:ident : $pk_ty:ty = $pk_col:literal,
            $( $col:ident : $col_ty:ty = $col_name:literal $([$null:ident])? ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        $vis struct $name {
            table: $crate::TableRef,
            #[doc = concat!("Primary key column `", $pk_col, "`.")]
            pub $pk: $crate::Column<$pk_ty>,
            $(
                #[doc = concat!("Column `", $col_name, "`.")]
                pub $col: $crate::Column<$col_ty>,
            )*
        }

        impl $name {
            pub const fn new() -> Self {
                Self {
                    table: $crate::TableRef::new($schema, $table),
                    $pk: $crate::Column::new($crate::TableRef::new($schema, $table), $pk_col, false),
                    $(
                        $col: $crate::Column::new(
                            $crate::TableRef::new($schema, $table),
                            $col_name,
                            $crate::table!(@nullable $($null)?),
                        ),
                    )*
                }
            }
        }

        impl ::std::default::Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl $crate::Table for $name {
            fn table_ref(&self) -> &$crate::TableRef {
                &self.table
            }

            fn fields(&self) -> ::std::vec::Vec<$crate::Field> {
                ::std::vec![
                    self.$pk.field().clone(),
                    $( self.$col.field().clone(), )*
                ]
            }

            fn primary_key(&self) -> &$crate::Field {
                self.$pk.field()
            }

            fn as_alias(&self, alias: &str) -> Self {
                let table = self.table.with_alias(alias.to_string());
                Self {
                    $pk: self.$pk.rebind(&table),
                    $( $col: self.$col.rebind(&table), )*
                    table,
                }
            }
        }
    };
}
