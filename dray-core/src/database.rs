use crate::{
    Config, Driver, DriverError, Error, Executor, IDENTITY, Payload, Predicate, Query, QueryKind,
    QueryResponse, QueryResult, Result, RowLabeled, RowsAffected, Selection, SqlWriter, Value,
    stream::StreamExt,
};
use std::{pin::pin, process};

/// Exit status of the process when a statement fails in debug mode.
pub const DEBUG_EXIT_CODE: i32 = 70;

/// The execution layer: the only place that talks to the connection.
///
/// Every statement goes through [`Database::execute`], which never fails: the
/// outcome, success or not, is normalized into a [`QueryResponse`].
pub struct Database<E: Executor> {
    executor: E,
    config: Config,
}

impl<E: Executor> Database<E> {
    pub fn new(executor: E) -> Self {
        Self::with_config(executor, Config::default())
    }

    pub fn with_config(executor: E, config: Config) -> Self {
        Self { executor, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn executor(&mut self) -> &mut E {
        &mut self.executor
    }

    pub fn into_inner(self) -> E {
        self.executor
    }

    pub fn sql_writer(&self) -> <E::Driver as Driver>::SqlWriter {
        self.executor.driver().sql_writer()
    }

    /// Escape a scalar into a literal, for callers writing raw conditions.
    pub fn quote(&self, value: impl Into<Value>) -> String {
        self.executor.escape(&value.into())
    }

    /// Run one statement and normalize its outcome.
    ///
    /// A select matching exactly one row collapses into [`Payload::Row`]
    /// unless `force_rows` is set.
    ///
    /// When [`Config::debug`] is enabled a failed statement logs the response
    /// and terminates the process with [`DEBUG_EXIT_CODE`].
    pub async fn execute(&mut self, query: impl Into<Query>, force_rows: bool) -> QueryResponse {
        let query = query.into();
        let kind = query.kind();
        let mut response = QueryResponse::new(query.sql.clone());
        log::debug!("Executing: {}", query);
        let mut rows = Vec::new();
        let mut affected = RowsAffected::default();
        let mut failure = None;
        {
            let mut stream = pin!(self.executor.run(query));
            while let Some(item) = stream.next().await {
                match item {
                    Ok(QueryResult::Row(row)) => rows.push(row),
                    Ok(QueryResult::Affected(v)) => affected.extend([v]),
                    Err(e) => {
                        failure = Some(e);
                        break;
                    }
                }
            }
        }
        if let Some(error) = failure {
            response.message = format!("{:#}", error);
            response.constraint_violation = is_constraint_violation(&error);
            log::error!("{}", response.message);
            if self.config.debug {
                log::error!("Halting after a failed statement in debug mode:\n{:#?}", response);
                process::exit(DEBUG_EXIT_CODE);
            }
            return response;
        }
        response.success = true;
        response.message = "Query executed".into();
        response.affected = affected.rows_affected;
        response.payload = if kind == QueryKind::Insert {
            // Dialects with RETURNING report the identity as the first column
            Payload::InsertId(
                rows.first()
                    .and_then(|row| row.values.first())
                    .and_then(Value::as_i64)
                    .or(affected.last_affected_id)
                    .unwrap_or(0),
            )
        } else if kind == QueryKind::Select || !rows.is_empty() {
            response.result_rows = rows.len();
            response.result_cols = rows.first().map_or(affected.columns, RowLabeled::len);
            if !force_rows && rows.len() == 1 {
                Payload::Row(rows.swap_remove(0))
            } else {
                Payload::Rows(rows)
            }
        } else {
            Payload::Done(true)
        };
        response
    }

    /// Rows of a statement that must succeed, always in sequence shape.
    pub async fn get_query_result(&mut self, query: impl Into<Query>) -> Result<Vec<RowLabeled>> {
        Ok(self.execute(query, true).await.into_result()?.into_rows())
    }

    /// First column of the first matching row. For an `expr AS alias`
    /// projection the aliased column is read.
    pub async fn get_single_value(
        &mut self,
        table: &str,
        expression: &str,
        condition: &str,
    ) -> Result<Option<Value>> {
        let alias = expression
            .rsplit_once(" AS ")
            .map(|(_, alias)| alias.trim().to_owned());
        let mut query = Query::default();
        self.sql_writer().write_select(
            &mut query,
            table,
            &Selection {
                fields: expression,
                predicate: Predicate::Raw(condition),
                ..Default::default()
            },
        );
        let row = self.execute(query, true).await.into_result()?.into_first_row();
        Ok(row.and_then(|mut row| match alias {
            Some(alias) => row.take_column(&alias),
            None => row.values.into_vec().into_iter().next(),
        }))
    }

    /// Raw `UPDATE table SET assignment WHERE condition`, returns the affected rows.
    pub async fn set_single_value(
        &mut self,
        table: &str,
        assignment: &str,
        condition: &str,
    ) -> Result<u64> {
        if assignment.trim().is_empty() {
            return Err(Error::InvalidArgument(
                "The assignment must not be empty".into(),
            ));
        }
        let mut query = Query::default();
        {
            let writer = self.sql_writer();
            query.sql.push_str("UPDATE ");
            writer.write_table_ref(&mut query.sql, table);
            query.sql.push_str(" SET ");
            query.sql.push_str(assignment);
            writer.write_predicate(&mut query, &Predicate::Raw(condition));
            query.sql.push(';');
        }
        affected(self.execute(query, false).await)
    }

    /// First row matching the condition, if any.
    pub async fn get_line_values(
        &mut self,
        table: &str,
        fields: &str,
        condition: &str,
    ) -> Result<Option<RowLabeled>> {
        let mut query = Query::default();
        self.sql_writer().write_select(
            &mut query,
            table,
            &Selection {
                fields,
                predicate: Predicate::Raw(condition),
                ..Default::default()
            },
        );
        Ok(self.execute(query, false).await.into_result()?.into_first_row())
    }

    /// Update the rows matching the condition with bound values.
    pub async fn set_line_values(
        &mut self,
        table: &str,
        values: &[(&str, Value)],
        condition: &str,
    ) -> Result<u64> {
        if values.is_empty() {
            return Err(Error::InvalidArgument("No values to assign".into()));
        }
        let mut query = Query::default();
        self.sql_writer()
            .write_update(&mut query, table, values, &Predicate::Raw(condition));
        affected(self.execute(query, false).await)
    }

    /// Row with the given identity, which must exist.
    pub async fn get_row_info(&mut self, table: &str, id: i64) -> Result<RowLabeled> {
        let id_value = Value::Int64(Some(id));
        let mut query = Query::default();
        self.sql_writer().write_select(
            &mut query,
            table,
            &Selection {
                predicate: Predicate::Equals(IDENTITY, &id_value),
                limit: Some(1),
                ..Default::default()
            },
        );
        self.execute(query, false)
            .await
            .into_result()?
            .into_first_row()
            .ok_or_else(|| Error::NotFound(format!("Item {} not found in {}", id, table)))
    }

    /// Rows for a list of identities, at least one of which must exist.
    pub async fn get_rows_info_ids(&mut self, table: &str, ids: &[i64]) -> Result<Vec<RowLabeled>> {
        if ids.is_empty() {
            return Err(Error::InvalidArgument("The identity list is empty".into()));
        }
        let ids: Vec<Value> = ids.iter().map(|v| Value::Int64(Some(*v))).collect();
        let mut query = Query::default();
        self.sql_writer().write_select(
            &mut query,
            table,
            &Selection {
                predicate: Predicate::In(IDENTITY, &ids),
                ..Default::default()
            },
        );
        let rows = self.get_query_result(query).await?;
        if rows.is_empty() {
            return Err(Error::NotFound(format!(
                "No items found in {} for the requested identities",
                table
            )));
        }
        Ok(rows)
    }
}

pub(crate) fn affected(response: QueryResponse) -> Result<u64> {
    let affected = response.affected;
    response.into_result()?;
    Ok(affected)
}

fn is_constraint_violation(error: &DriverError) -> bool {
    matches!(
        error.downcast_ref::<Error>(),
        Some(Error::ConstraintViolation(..))
    )
}
