use crate::{
    Database, Error, Executor, OneOrMany, Order, Payload, Predicate, Query, Result, RowLabeled,
    Selection, SqlWriter, Value, database::affected,
};
use std::{
    collections::{HashMap, hash_map::Entry},
    future::Future,
};

/// Name of the identity column every model carries.
pub const IDENTITY: &str = "id";

/// Column discovered on a model.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: &'static str,
    /// Typed NULL describing the column type.
    pub value: Value,
    pub nullable: bool,
    pub identity: bool,
}

/// Conflict policy of [`Model::save`].
#[repr(u8)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    /// Plain insert, a conflict fails the statement.
    #[default]
    InsertOrFail = 0,
    /// On conflict keep the existing row untouched.
    InsertOrIgnore = 1,
    /// On conflict overwrite the existing row with the proposed values.
    InsertOrUpdate = 2,
}

impl SaveMode {
    pub const INSERT_OR_IGNORE: u8 = SaveMode::InsertOrIgnore as u8;
    pub const INSERT_OR_UPDATE: u8 = SaveMode::InsertOrUpdate as u8;
}

impl TryFrom<u8> for SaveMode {
    type Error = Error;
    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(SaveMode::InsertOrFail),
            1 => Ok(SaveMode::InsertOrIgnore),
            2 => Ok(SaveMode::InsertOrUpdate),
            _ => Err(Error::InvalidArgument(format!(
                "Unknown save mode {}",
                value
            ))),
        }
    }
}

/// A struct mapped onto one table, one instance per row.
///
/// Derive it with `#[derive(Model)]`: the macro discovers the fields and
/// implements the required methods. Everything else is provided on top of
/// them and talks to the backend through a [`Database`].
///
/// A model whose identity is `0` is transient: it has no row yet.
pub trait Model: Default + Send + Sync + Sized {
    fn table_name() -> &'static str;

    /// Persisted fields in declaration order, the identity included.
    fn fields() -> &'static [FieldDef];

    fn id(&self) -> i64;

    #[doc(hidden)]
    fn assign_identity(&mut self, id: i64);

    /// Current value of a field, `None` if the model has no such field.
    fn get_field(&self, name: &str) -> Option<Value>;

    /// Store a value into a field, `Ok(false)` if the model has no such field.
    #[doc(hidden)]
    fn write_field(&mut self, name: &str, value: Value) -> Result<bool>;

    fn field(name: &str) -> Option<&'static FieldDef> {
        Self::fields().iter().find(|f| f.name == name)
    }

    fn field_names() -> impl Iterator<Item = &'static str> {
        Self::fields().iter().map(|f| f.name)
    }

    fn is_transient(&self) -> bool {
        self.id() == 0
    }

    fn get_attribute(&self, name: &str) -> Option<Value> {
        self.get_field(name)
    }

    /// Assign a field by name. The identity is never assignable this way.
    fn set_attribute(&mut self, name: &str, value: impl Into<Value>) -> Result<bool> {
        if name == IDENTITY {
            log::warn!(
                "Refusing to assign the identity of {} by name",
                Self::table_name()
            );
            return Ok(false);
        }
        self.write_field(name, value.into())
    }

    /// Every field with its current value, the identity included.
    fn get_attributes(&self) -> Vec<(&'static str, Value)> {
        Self::fields()
            .iter()
            .filter_map(|f| self.get_field(f.name).map(|v| (f.name, v)))
            .collect()
    }

    /// Build a model from a row. Columns that are not fields, and NULL
    /// columns, are ignored. `None` for an empty row.
    fn fill(row: &RowLabeled) -> Result<Option<Self>> {
        if row.is_empty() {
            return Ok(None);
        }
        let mut model = Self::default();
        for field in Self::fields() {
            match row.get_column(field.name) {
                Some(value) if !value.is_null() => {
                    model.write_field(field.name, value.clone())?;
                }
                _ => {}
            }
        }
        Ok(Some(model))
    }

    fn fill_all(rows: &[RowLabeled]) -> Result<Vec<Self>> {
        rows.iter()
            .filter_map(|row| Self::fill(row).transpose())
            .collect()
    }

    /// Persist the model as one insert and return its identity.
    ///
    /// Without an explicit mode a persisted model is upserted and a transient
    /// one is inserted failing on conflict. A transient model receives the
    /// generated identity, a persisted one keeps its own. `0` means no row
    /// was written (ignored conflict).
    fn save<E: Executor>(
        &mut self,
        db: &mut Database<E>,
        mode: Option<SaveMode>,
    ) -> impl Future<Output = Result<i64>> + Send {
        async move {
            let current = self.id();
            let mode = mode.unwrap_or(if current != 0 {
                SaveMode::InsertOrUpdate
            } else {
                SaveMode::InsertOrFail
            });
            let values = data_values(self);
            let mut query = Query::with_capacity(128);
            db.sql_writer()
                .write_insert(&mut query, Self::table_name(), &values, current, mode);
            let generated = db
                .execute(query, false)
                .await
                .into_result()?
                .insert_id()
                .unwrap_or(0);
            let id = if current != 0 { current } else { generated };
            self.assign_identity(id);
            Ok(id)
        }
    }

    /// Write every field of a persisted model to its row.
    fn update<E: Executor>(
        &self,
        db: &mut Database<E>,
    ) -> impl Future<Output = Result<u64>> + Send {
        async move {
            let id = require_identity(self)?;
            let values = data_values(self);
            run_update(db, Self::table_name(), &values, Predicate::Equals(IDENTITY, &id)).await
        }
    }

    /// Write the given columns to the row of a persisted model. An empty
    /// list writes every field. The identity is skipped.
    fn update_with<E: Executor>(
        &self,
        db: &mut Database<E>,
        values: &[(&str, Value)],
    ) -> impl Future<Output = Result<u64>> + Send {
        async move {
            if values.is_empty() {
                return self.update(db).await;
            }
            let id = require_identity(self)?;
            let values = checked_values::<Self>(values)?;
            run_update(db, Self::table_name(), &values, Predicate::Equals(IDENTITY, &id)).await
        }
    }

    /// Remove the row of a persisted model. The instance keeps its values.
    fn delete<E: Executor>(
        &self,
        db: &mut Database<E>,
    ) -> impl Future<Output = Result<u64>> + Send {
        async move {
            let id = require_identity(self)?;
            let mut query = Query::default();
            db.sql_writer().write_delete(
                &mut query,
                Self::table_name(),
                &Predicate::Equals(IDENTITY, &id),
            );
            affected(db.execute(query, false).await)
        }
    }

    /// Build a model from named values and save it. `None` when none of the
    /// names is a field, or when no row was written.
    fn create<E: Executor>(
        db: &mut Database<E>,
        data: &[(&str, Value)],
        mode: SaveMode,
    ) -> impl Future<Output = Result<Option<Self>>> + Send {
        async move {
            if !data.iter().any(|(name, _)| Self::field(name).is_some()) {
                return Ok(None);
            }
            let row: RowLabeled = data.iter().map(|(k, v)| (*k, v.clone())).collect();
            let Some(mut model) = Self::fill(&row)? else {
                return Ok(None);
            };
            let id = model.save(db, Some(mode)).await?;
            Ok((id != 0).then_some(model))
        }
    }

    fn find<E: Executor>(
        db: &mut Database<E>,
        id: i64,
    ) -> impl Future<Output = Result<Option<Self>>> + Send {
        Self::find_by(db, IDENTITY, id)
    }

    /// First row whose `key` column equals `value`.
    fn find_by<E: Executor>(
        db: &mut Database<E>,
        key: &str,
        value: impl Into<Value>,
    ) -> impl Future<Output = Result<Option<Self>>> + Send {
        let value = value.into();
        async move {
            let mut query = Query::default();
            db.sql_writer().write_select(
                &mut query,
                Self::table_name(),
                &Selection {
                    predicate: Predicate::Equals(key, &value),
                    limit: Some(1),
                    ..Default::default()
                },
            );
            fill_first(db.execute(query, false).await.into_result()?)
        }
    }

    /// Models matching a raw condition. A single match comes back as
    /// [`OneOrMany::One`] unless `force_many` is set.
    fn get<E: Executor>(
        db: &mut Database<E>,
        condition: &str,
        fields: &str,
        force_many: bool,
    ) -> impl Future<Output = Result<OneOrMany<Self>>> + Send {
        async move {
            let mut query = Query::default();
            db.sql_writer().write_select(
                &mut query,
                Self::table_name(),
                &Selection {
                    fields: projection(fields),
                    predicate: Predicate::Raw(condition),
                    ..Default::default()
                },
            );
            match db.execute(query, force_many).await.into_result()? {
                Payload::Row(row) => Ok(match Self::fill(&row)? {
                    Some(model) => OneOrMany::One(model),
                    None => OneOrMany::Many(Vec::new()),
                }),
                payload => Ok(OneOrMany::Many(Self::fill_all(&payload.into_rows())?)),
            }
        }
    }

    /// Raw rows of the model table, optionally joined, always as a sequence.
    fn get_data<E: Executor>(
        db: &mut Database<E>,
        condition: &str,
        fields: &str,
        join: &str,
    ) -> impl Future<Output = Result<Vec<RowLabeled>>> + Send {
        async move {
            let mut query = Query::default();
            db.sql_writer().write_select(
                &mut query,
                Self::table_name(),
                &Selection {
                    fields: projection(fields),
                    join,
                    predicate: Predicate::Raw(condition),
                    ..Default::default()
                },
            );
            db.get_query_result(query).await
        }
    }

    fn count<E: Executor>(
        db: &mut Database<E>,
        condition: &str,
    ) -> impl Future<Output = Result<u64>> + Send {
        async move {
            let value = db
                .get_single_value(Self::table_name(), "COUNT(*)", condition)
                .await?;
            Ok(value
                .as_ref()
                .and_then(Value::as_i64)
                .map_or(0, |v| v.max(0) as u64))
        }
    }

    /// Set columns on every row matching a non empty condition.
    fn update_all<E: Executor>(
        db: &mut Database<E>,
        condition: &str,
        values: &[(&str, Value)],
    ) -> impl Future<Output = Result<u64>> + Send {
        async move {
            if condition.trim().is_empty() {
                return Err(Error::InvalidArgument(format!(
                    "Refusing to update every row of {} without a condition",
                    Self::table_name()
                )));
            }
            let values = checked_values::<Self>(values)?;
            if values.is_empty() {
                return Err(Error::InvalidArgument("No values to assign".into()));
            }
            run_update(db, Self::table_name(), &values, Predicate::Raw(condition)).await
        }
    }

    /// Matching row with the greatest `key`.
    fn last_by<E: Executor>(
        db: &mut Database<E>,
        condition: &str,
        key: &str,
    ) -> impl Future<Output = Result<Option<Self>>> + Send {
        select_edge(db, condition, key, Order::Desc)
    }

    /// Matching row with the smallest `key`.
    fn first_by<E: Executor>(
        db: &mut Database<E>,
        condition: &str,
        key: &str,
    ) -> impl Future<Output = Result<Option<Self>>> + Send {
        select_edge(db, condition, key, Order::Asc)
    }

    /// `(key, label)` pairs of the matching rows, in row order. A repeated key
    /// keeps its first position and its last label.
    fn get_options_data<E: Executor>(
        db: &mut Database<E>,
        key: &str,
        label: &str,
        condition: &str,
    ) -> impl Future<Output = Result<Vec<(Value, Value)>>> + Send {
        async move {
            let mut query = Query::default();
            {
                let writer = db.sql_writer();
                let mut fields = String::new();
                writer.write_identifier_quoted(&mut fields, key);
                fields.push_str(", ");
                writer.write_identifier_quoted(&mut fields, label);
                writer.write_select(
                    &mut query,
                    Self::table_name(),
                    &Selection {
                        fields: &fields,
                        predicate: Predicate::Raw(condition),
                        ..Default::default()
                    },
                );
            }
            let rows = db.get_query_result(query).await?;
            let mut options: Vec<(Value, Value)> = Vec::with_capacity(rows.len());
            // Keys are compared through their literal text
            let mut positions: HashMap<String, usize> = HashMap::with_capacity(rows.len());
            for mut row in rows {
                let v = row.take_column(label).unwrap_or_default();
                let k = if label == key {
                    v.clone()
                } else {
                    row.take_column(key).unwrap_or_default()
                };
                match positions.entry(db.executor().escape(&k)) {
                    Entry::Occupied(entry) => options[*entry.get()].1 = v,
                    Entry::Vacant(entry) => {
                        entry.insert(options.len());
                        options.push((k, v));
                    }
                }
            }
            Ok(options)
        }
    }

    /// Delete every row of the table.
    #[doc(hidden)]
    fn clear<E: Executor>(db: &mut Database<E>) -> impl Future<Output = Result<u64>> + Send {
        async move {
            let mut query = Query::default();
            db.sql_writer()
                .write_delete(&mut query, Self::table_name(), &Predicate::All);
            affected(db.execute(query, false).await)
        }
    }
}

/// Every field but the identity, with its current value.
fn data_values<M: Model>(model: &M) -> Vec<(&'static str, Value)> {
    M::fields()
        .iter()
        .filter(|f| !f.identity)
        .filter_map(|f| model.get_field(f.name).map(|v| (f.name, v)))
        .collect()
}

fn require_identity<M: Model>(model: &M) -> Result<Value> {
    match model.id() {
        0 => Err(Error::InvalidArgument(format!(
            "The {} model has no identity yet, save it first",
            M::table_name()
        ))),
        id => Ok(Value::Int64(Some(id))),
    }
}

/// Validate caller supplied assignments against the fields, dropping the
/// identity.
fn checked_values<'a, M: Model>(values: &'a [(&'a str, Value)]) -> Result<Vec<(&'a str, Value)>> {
    let mut result = Vec::with_capacity(values.len());
    for (name, value) in values {
        if *name == IDENTITY {
            log::warn!("Ignoring an assignment to the identity of {}", M::table_name());
            continue;
        }
        if M::field(name).is_none() {
            return Err(Error::InvalidArgument(format!(
                "`{}` is not a field of {}",
                name,
                M::table_name()
            )));
        }
        result.push((*name, value.clone()));
    }
    Ok(result)
}

fn projection(fields: &str) -> &str {
    if fields.trim().is_empty() { "*" } else { fields }
}

fn fill_first<M: Model>(payload: Payload) -> Result<Option<M>> {
    match payload.into_first_row() {
        Some(row) => M::fill(&row),
        None => Ok(None),
    }
}

async fn run_update<E: Executor>(
    db: &mut Database<E>,
    table: &str,
    values: &[(&str, Value)],
    predicate: Predicate<'_>,
) -> Result<u64> {
    let mut query = Query::default();
    db.sql_writer()
        .write_update(&mut query, table, values, &predicate);
    affected(db.execute(query, false).await)
}

async fn select_edge<M: Model, E: Executor>(
    db: &mut Database<E>,
    condition: &str,
    key: &str,
    order: Order,
) -> Result<Option<M>> {
    let mut query = Query::default();
    db.sql_writer().write_select(
        &mut query,
        M::table_name(),
        &Selection {
            predicate: Predicate::Raw(condition),
            order: Some((key, order)),
            limit: Some(1),
            ..Default::default()
        },
    );
    fill_first(db.execute(query, false).await.into_result()?)
}
