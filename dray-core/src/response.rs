use crate::{Error, Result, RowLabeled};

/// Result of a statement, its shape depends on the statement family.
#[derive(Default, Debug, Clone, PartialEq)]
pub enum Payload {
    /// The statement failed.
    #[default]
    Empty,
    /// INSERT: identity generated for the new row, `0` when none was produced.
    InsertId(i64),
    /// UPDATE, DELETE, DDL.
    Done(bool),
    /// Row returning statement.
    Rows(Vec<RowLabeled>),
    /// Row returning statement that matched exactly one row, unless the
    /// caller forced the sequence shape.
    Row(RowLabeled),
}

impl Payload {
    pub fn insert_id(&self) -> Option<i64> {
        match self {
            Payload::InsertId(id) => Some(*id),
            _ => None,
        }
    }

    /// Rows in sequence shape regardless of collapsing.
    pub fn into_rows(self) -> Vec<RowLabeled> {
        match self {
            Payload::Rows(rows) => rows,
            Payload::Row(row) => vec![row],
            _ => Vec::new(),
        }
    }

    pub fn into_first_row(self) -> Option<RowLabeled> {
        match self {
            Payload::Rows(rows) => rows.into_iter().next(),
            Payload::Row(row) => Some(row),
            _ => None,
        }
    }
}

/// Normalized outcome of one statement execution.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResponse {
    /// Statement text as sent.
    pub query: String,
    pub success: bool,
    /// `Query executed`, or the driver error text on failure.
    pub message: String,
    pub affected: u64,
    pub result_rows: usize,
    pub result_cols: usize,
    pub payload: Payload,
    /// The failure was a constraint violation reported by the driver.
    pub constraint_violation: bool,
}

impl QueryResponse {
    pub(crate) fn new(query: String) -> Self {
        Self {
            query,
            success: false,
            message: "Not executed".into(),
            affected: 0,
            result_rows: 0,
            result_cols: 0,
            payload: Payload::Empty,
            constraint_violation: false,
        }
    }

    pub fn error(&self) -> Option<Error> {
        if self.success {
            None
        } else if self.constraint_violation {
            Some(Error::ConstraintViolation(self.message.clone()))
        } else {
            Some(Error::Query(self.message.clone()))
        }
    }

    pub fn into_result(self) -> Result<Payload> {
        match self.error() {
            Some(error) => Err(error),
            None => Ok(self.payload),
        }
    }
}

/// A single item when exactly one matched, a sequence otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn len(&self) -> usize {
        match self {
            OneOrMany::One(..) => 1,
            OneOrMany::Many(v) => v.len(),
        }
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(v) => vec![v],
            OneOrMany::Many(v) => v,
        }
    }
    /// The single item, `None` for the sequence shape.
    pub fn one(self) -> Option<T> {
        match self {
            OneOrMany::One(v) => Some(v),
            OneOrMany::Many(..) => None,
        }
    }
}

impl<T> IntoIterator for OneOrMany<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;
    fn into_iter(self) -> Self::IntoIter {
        self.into_vec().into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::{OneOrMany, Payload, QueryResponse};
    use crate::{Error, RowLabeled};

    #[test]
    fn failure_taxonomy() {
        let mut response = QueryResponse::new("INSERT".into());
        response.message = "UNIQUE constraint failed: user.name".into();
        response.constraint_violation = true;
        assert!(matches!(
            response.clone().into_result(),
            Err(Error::ConstraintViolation(..))
        ));
        response.constraint_violation = false;
        assert_eq!(
            response.into_result(),
            Err(Error::Query("UNIQUE constraint failed: user.name".into()))
        );
    }

    #[test]
    fn payload_rows() {
        let row: RowLabeled = [("a", 1)].into_iter().collect();
        assert_eq!(Payload::Row(row.clone()).into_rows(), vec![row.clone()]);
        assert_eq!(Payload::Done(true).into_rows(), vec![]);
        assert_eq!(Payload::InsertId(4).insert_id(), Some(4));
        assert_eq!(Payload::Rows(vec![]).into_first_row(), None);
    }

    #[test]
    fn one_or_many() {
        assert_eq!(OneOrMany::One(3).into_vec(), vec![3]);
        assert_eq!(OneOrMany::<i32>::Many(vec![]).len(), 0);
        assert_eq!(OneOrMany::Many(vec![1, 2]).one(), None);
        assert_eq!(OneOrMany::One(1).into_iter().sum::<i32>(), 1);
    }
}
