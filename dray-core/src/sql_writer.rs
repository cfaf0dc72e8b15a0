use crate::{
    IDENTITY, Query, SaveMode, Value, separated_by,
    temporal::{write_date, write_time},
};
use std::fmt::Write;

/// Sort direction for `ORDER BY`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

/// Row filter of a statement.
#[derive(Debug, Default, Clone, Copy)]
pub enum Predicate<'a> {
    /// No `WHERE` clause.
    #[default]
    All,
    /// Caller supplied condition, written verbatim.
    Raw(&'a str),
    /// `"column" = ?` with the value bound.
    Equals(&'a str, &'a Value),
    /// `"column" IN (?, ?, ..)` with the values bound.
    In(&'a str, &'a [Value]),
}

/// Everything a `SELECT` needs besides the table.
#[derive(Debug, Clone, Copy)]
pub struct Selection<'a> {
    /// Projection, written verbatim (`*`, `a, b`, `COUNT(*)`).
    pub fields: &'a str,
    /// Join clause written verbatim between the table and `WHERE`.
    pub join: &'a str,
    pub predicate: Predicate<'a>,
    pub order: Option<(&'a str, Order)>,
    pub limit: Option<u32>,
}

impl Default for Selection<'_> {
    fn default() -> Self {
        Self {
            fields: "*",
            join: "",
            predicate: Predicate::All,
            order: None,
            limit: None,
        }
    }
}

/// SQL dialect. Every statement the model layer sends is produced here.
///
/// Values are never spliced into statements: they go through
/// [`SqlWriter::write_placeholder`] and travel as bindings. `write_value`
/// renders literals for callers composing raw conditions.
pub trait SqlWriter {
    fn write_escaped(&self, out: &mut String, value: &str, search: char, replace: &str) {
        let mut position = 0;
        for (i, c) in value.char_indices() {
            if c == search {
                out.push_str(&value[position..i]);
                out.push_str(replace);
                position = i + c.len_utf8();
            }
        }
        out.push_str(&value[position..]);
    }

    fn write_identifier_quoted(&self, out: &mut String, value: &str) {
        out.push('"');
        self.write_escaped(out, value, '"', r#""""#);
        out.push('"');
    }

    fn write_table_ref(&self, out: &mut String, table: &str) {
        self.write_identifier_quoted(out, table);
    }

    fn write_placeholder(&self, query: &mut Query, value: Value) {
        query.sql.push('?');
        query.bindings.push(value);
    }

    fn write_value(&self, out: &mut String, value: &Value) {
        if value.is_null() {
            self.write_value_none(out);
            return;
        }
        match value {
            Value::Boolean(Some(v)) => self.write_value_bool(out, *v),
            Value::Int8(Some(v)) => drop(write!(out, "{}", v)),
            Value::Int16(Some(v)) => drop(write!(out, "{}", v)),
            Value::Int32(Some(v)) => drop(write!(out, "{}", v)),
            Value::Int64(Some(v)) => drop(write!(out, "{}", v)),
            Value::UInt8(Some(v)) => drop(write!(out, "{}", v)),
            Value::UInt16(Some(v)) => drop(write!(out, "{}", v)),
            Value::UInt32(Some(v)) => drop(write!(out, "{}", v)),
            Value::UInt64(Some(v)) => drop(write!(out, "{}", v)),
            Value::Float32(Some(v)) => self.write_value_float(out, *v as f64),
            Value::Float64(Some(v)) => self.write_value_float(out, *v),
            Value::Decimal(Some(v)) => drop(write!(out, "{}", v)),
            Value::Varchar(Some(v)) => self.write_value_string(out, v),
            Value::Blob(Some(v)) => self.write_value_blob(out, v),
            Value::Date(Some(v)) => {
                out.push('\'');
                write_date(out, v);
                out.push('\'');
            }
            Value::Time(Some(v)) => {
                out.push('\'');
                write_time(out, v);
                out.push('\'');
            }
            Value::Timestamp(Some(v)) => {
                out.push('\'');
                write_date(out, &v.date());
                out.push(' ');
                write_time(out, &v.time());
                out.push('\'');
            }
            Value::Uuid(Some(v)) => drop(write!(out, "'{}'", v)),
            _ => self.write_value_none(out),
        }
    }

    fn write_value_none(&self, out: &mut String) {
        out.push_str("NULL");
    }

    fn write_value_bool(&self, out: &mut String, value: bool) {
        out.push_str(if value { "TRUE" } else { "FALSE" });
    }

    fn write_value_float(&self, out: &mut String, value: f64) {
        if value.is_finite() {
            let _ = write!(out, "{:?}", value);
        } else {
            self.write_value_string(out, &value.to_string());
        }
    }

    fn write_value_string(&self, out: &mut String, value: &str) {
        out.push('\'');
        self.write_escaped(out, value, '\'', "''");
        out.push('\'');
    }

    fn write_value_blob(&self, out: &mut String, value: &[u8]) {
        out.push_str("X'");
        for b in value {
            let _ = write!(out, "{:02X}", b);
        }
        out.push('\'');
    }

    fn write_predicate(&self, query: &mut Query, predicate: &Predicate) {
        match *predicate {
            Predicate::All => {}
            Predicate::Raw(condition) => {
                if !condition.trim().is_empty() {
                    query.sql.push_str("\nWHERE ");
                    query.sql.push_str(condition);
                }
            }
            Predicate::Equals(column, value) => {
                query.sql.push_str("\nWHERE ");
                self.write_identifier_quoted(&mut query.sql, column);
                query.sql.push_str(" = ");
                self.write_placeholder(query, value.clone());
            }
            Predicate::In(column, values) => {
                query.sql.push_str("\nWHERE ");
                self.write_identifier_quoted(&mut query.sql, column);
                query.sql.push_str(" IN (");
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        query.sql.push_str(", ");
                    }
                    self.write_placeholder(query, value.clone());
                }
                query.sql.push(')');
            }
        }
    }

    fn write_select(&self, query: &mut Query, table: &str, selection: &Selection) {
        query.sql.push_str("SELECT ");
        query.sql.push_str(selection.fields);
        query.sql.push_str("\nFROM ");
        self.write_table_ref(&mut query.sql, table);
        if !selection.join.trim().is_empty() {
            query.sql.push(' ');
            query.sql.push_str(selection.join.trim());
        }
        self.write_predicate(query, &selection.predicate);
        if let Some((column, order)) = selection.order {
            query.sql.push_str("\nORDER BY ");
            self.write_identifier_quoted(&mut query.sql, column);
            query.sql.push_str(match order {
                Order::Asc => " ASC",
                Order::Desc => " DESC",
            });
        }
        if let Some(limit) = selection.limit {
            let _ = write!(query.sql, "\nLIMIT {}", limit);
        }
        query.sql.push(';');
    }

    /// Insert one row. `values` never contains the identity: it is appended
    /// when non-zero so that the row keeps it, and left to the backend
    /// otherwise.
    fn write_insert(
        &self,
        query: &mut Query,
        table: &str,
        values: &[(&str, Value)],
        identity: i64,
        mode: SaveMode,
    ) {
        self.write_insert_head(query, mode);
        self.write_table_ref(&mut query.sql, table);
        let identity = (identity != 0).then(|| Value::Int64(Some(identity)));
        if values.is_empty() && identity.is_none() {
            query.sql.push_str(" DEFAULT VALUES");
        } else {
            query.sql.push_str(" (");
            separated_by(
                &mut query.sql,
                values
                    .iter()
                    .map(|(name, _)| *name)
                    .chain(identity.as_ref().map(|_| IDENTITY)),
                |out, name| self.write_identifier_quoted(out, name),
                ", ",
            );
            query.sql.push_str(") VALUES (");
            let mut first = true;
            for value in values.iter().map(|(_, v)| v.clone()).chain(identity) {
                if !first {
                    query.sql.push_str(", ");
                }
                first = false;
                self.write_placeholder(query, value);
            }
            query.sql.push(')');
            self.write_insert_conflict(query, values, mode);
        }
        self.write_returning_identity(query);
        query.sql.push(';');
    }

    fn write_insert_head(&self, query: &mut Query, _mode: SaveMode) {
        query.sql.push_str("INSERT INTO ");
    }

    fn write_insert_conflict(&self, query: &mut Query, values: &[(&str, Value)], mode: SaveMode) {
        match mode {
            SaveMode::InsertOrFail => {}
            SaveMode::InsertOrIgnore => query.sql.push_str("\nON CONFLICT DO NOTHING"),
            SaveMode::InsertOrUpdate => {
                query.sql.push_str("\nON CONFLICT (");
                self.write_identifier_quoted(&mut query.sql, IDENTITY);
                query.sql.push(')');
                self.write_upsert_assignments(query, values);
            }
        }
    }

    /// ` DO UPDATE SET` list overwriting every column with the proposed row.
    fn write_upsert_assignments(&self, query: &mut Query, values: &[(&str, Value)]) {
        if values.is_empty() {
            query.sql.push_str(" DO NOTHING");
            return;
        }
        query.sql.push_str(" DO UPDATE SET\n");
        separated_by(
            &mut query.sql,
            values.iter(),
            |out, (name, _)| {
                self.write_identifier_quoted(out, name);
                out.push_str(" = EXCLUDED.");
                self.write_identifier_quoted(out, name);
            },
            ",\n",
        );
    }

    fn write_returning_identity(&self, query: &mut Query) {
        query.sql.push_str("\nRETURNING ");
        self.write_identifier_quoted(&mut query.sql, IDENTITY);
    }

    fn write_assignments(&self, query: &mut Query, values: &[(&str, Value)]) {
        for (i, (name, value)) in values.iter().enumerate() {
            if i > 0 {
                query.sql.push_str(", ");
            }
            self.write_identifier_quoted(&mut query.sql, name);
            query.sql.push_str(" = ");
            self.write_placeholder(query, value.clone());
        }
    }

    fn write_update(
        &self,
        query: &mut Query,
        table: &str,
        values: &[(&str, Value)],
        predicate: &Predicate,
    ) {
        query.sql.push_str("UPDATE ");
        self.write_table_ref(&mut query.sql, table);
        query.sql.push_str(" SET ");
        self.write_assignments(query, values);
        self.write_predicate(query, predicate);
        query.sql.push(';');
    }

    fn write_delete(&self, query: &mut Query, table: &str, predicate: &Predicate) {
        query.sql.push_str("DELETE FROM ");
        self.write_table_ref(&mut query.sql, table);
        self.write_predicate(query, predicate);
        query.sql.push(';');
    }
}

/// Dialect close to standard SQL (PostgreSQL flavored upserts).
#[derive(Debug, Default, Clone, Copy)]
pub struct GenericSqlWriter;

impl GenericSqlWriter {
    pub const fn new() -> Self {
        Self
    }
}

impl SqlWriter for GenericSqlWriter {}
