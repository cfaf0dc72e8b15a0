use dray_core::{Query, SaveMode, SqlWriter, Value};
use std::fmt::Write;

/// SQLite flavor: `INSERT OR IGNORE` and an upsert without a conflict target,
/// so that any unique constraint triggers the update.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteSqlWriter {}

impl SqlWriter for SqliteSqlWriter {
    fn write_value_bool(&self, out: &mut String, value: bool) {
        out.push(if value { '1' } else { '0' });
    }

    fn write_value_float(&self, out: &mut String, value: f64) {
        if value.is_nan() {
            self.write_value_none(out);
        } else if value.is_infinite() {
            if value.is_sign_negative() {
                out.push('-');
            }
            out.push_str("1.0e+10000");
        } else {
            let _ = write!(out, "{:?}", value);
        }
    }

    fn write_insert_head(&self, query: &mut Query, mode: SaveMode) {
        query.sql.push_str(match mode {
            SaveMode::InsertOrIgnore => "INSERT OR IGNORE INTO ",
            _ => "INSERT INTO ",
        });
    }

    fn write_insert_conflict(&self, query: &mut Query, values: &[(&str, Value)], mode: SaveMode) {
        if mode == SaveMode::InsertOrUpdate {
            query.sql.push_str("\nON CONFLICT");
            self.write_upsert_assignments(query, values);
        }
    }
}
