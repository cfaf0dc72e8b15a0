use dray_core::{
    Config, Connection, DEBUG_EXIT_CODE, Database, Driver, DriverResult, Error, Executor, FieldDef,
    GenericSqlWriter, Model, OneOrMany, Payload, Query, QueryResult, Result, RowLabeled,
    RowsAffected, SaveMode, Value, anyhow,
    stream::{self, Stream},
};
use indoc::indoc;
use std::{collections::VecDeque, env, process::Command, sync::LazyLock};

#[derive(Default)]
struct MockDriver;

impl Driver for MockDriver {
    type Connection = MockConnection;
    type SqlWriter = GenericSqlWriter;
    const NAME: &'static str = "mock";
    fn sql_writer(&self) -> GenericSqlWriter {
        GenericSqlWriter::new()
    }
}

/// Replays canned results, one batch per statement, and records the statements.
#[derive(Default)]
struct MockConnection {
    driver: MockDriver,
    results: VecDeque<Vec<DriverResult<QueryResult>>>,
    queries: Vec<Query>,
}

impl MockConnection {
    fn reply(mut self, items: Vec<DriverResult<QueryResult>>) -> Self {
        self.results.push_back(items);
        self
    }
}

impl Executor for MockConnection {
    type Driver = MockDriver;
    fn driver(&self) -> &MockDriver {
        &self.driver
    }
    fn run(&mut self, query: Query) -> impl Stream<Item = DriverResult<QueryResult>> + Send {
        self.queries.push(query);
        stream::iter(self.results.pop_front().unwrap_or_default())
    }
}

impl Connection for MockConnection {
    async fn connect(_url: &str) -> DriverResult<Self> {
        Ok(MockConnection::default())
    }
}

fn row(values: &[(&str, Value)]) -> DriverResult<QueryResult> {
    Ok(QueryResult::Row(values.iter().cloned().collect()))
}

fn affected(rows_affected: u64, last_affected_id: Option<i64>) -> DriverResult<QueryResult> {
    Ok(QueryResult::Affected(RowsAffected {
        rows_affected,
        last_affected_id,
        ..Default::default()
    }))
}

#[derive(Default, Debug, Clone, PartialEq)]
struct User {
    id: i64,
    name: String,
    age: Option<i32>,
}

static USER_FIELDS: LazyLock<Vec<FieldDef>> = LazyLock::new(|| {
    vec![
        FieldDef {
            name: "id",
            value: Value::Int64(None),
            nullable: false,
            identity: true,
        },
        FieldDef {
            name: "name",
            value: Value::Varchar(None),
            nullable: false,
            identity: false,
        },
        FieldDef {
            name: "age",
            value: Value::Int32(None),
            nullable: true,
            identity: false,
        },
    ]
});

impl Model for User {
    fn table_name() -> &'static str {
        "user"
    }
    fn fields() -> &'static [FieldDef] {
        &USER_FIELDS
    }
    fn id(&self) -> i64 {
        self.id
    }
    fn assign_identity(&mut self, id: i64) {
        self.id = id;
    }
    fn get_field(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(self.id.into()),
            "name" => Some(self.name.clone().into()),
            "age" => Some(self.age.into()),
            _ => None,
        }
    }
    fn write_field(&mut self, name: &str, value: Value) -> Result<bool> {
        use dray_core::AsValue;
        match name {
            "id" => self.id = AsValue::try_from_value(value)?,
            "name" => self.name = AsValue::try_from_value(value)?,
            "age" => self.age = AsValue::try_from_value(value)?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}

#[tokio::test]
async fn select_collapses_single_row() {
    let connection = MockConnection::default()
        .reply(vec![row(&[("a", 1.into()), ("b", "x".into())]), affected(0, None)])
        .reply(vec![row(&[("a", 1.into()), ("b", "x".into())]), affected(0, None)]);
    let mut db = Database::new(connection);
    let response = db.execute("SELECT a, b FROM t", false).await;
    assert!(response.success);
    assert_eq!(response.message, "Query executed");
    assert_eq!(response.result_rows, 1);
    assert_eq!(response.result_cols, 2);
    assert!(matches!(response.payload, Payload::Row(..)));

    let response = db.execute("SELECT a, b FROM t", true).await;
    assert!(matches!(response.payload, Payload::Rows(ref v) if v.len() == 1));
}

#[tokio::test]
async fn select_without_rows() {
    let connection = MockConnection::default()
        .reply(vec![affected(0, None)])
        .reply(vec![Ok(QueryResult::Affected(RowsAffected {
            columns: 2,
            ..Default::default()
        }))]);
    let mut db = Database::new(connection);
    let response = db.execute("SELECT * FROM t WHERE 0", false).await;
    assert!(response.success);
    assert_eq!(response.result_rows, 0);
    assert_eq!(response.result_cols, 0);
    assert_eq!(response.payload, Payload::Rows(vec![]));

    // The width of an empty result is still reported
    let response = db.execute("SELECT a, b FROM t WHERE 0", false).await;
    assert_eq!(response.result_rows, 0);
    assert_eq!(response.result_cols, 2);
}

#[tokio::test]
async fn insert_identity() {
    let connection = MockConnection::default()
        .reply(vec![row(&[("id", Value::Int64(Some(12)))]), affected(1, Some(3))])
        .reply(vec![affected(1, Some(4))])
        .reply(vec![affected(0, None)]);
    let mut db = Database::new(connection);
    let response = db.execute("INSERT INTO t (a) VALUES (1) RETURNING id", false).await;
    assert_eq!(response.payload, Payload::InsertId(12));
    assert_eq!(response.affected, 1);
    assert_eq!(response.result_rows, 0);
    assert_eq!(
        db.execute("insert into t (a) values (2)", false).await.payload,
        Payload::InsertId(4)
    );
    assert_eq!(
        db.execute("INSERT INTO t (a) VALUES (1)", false).await.payload,
        Payload::InsertId(0)
    );
}

#[tokio::test]
async fn modify_statements() {
    let connection = MockConnection::default().reply(vec![affected(3, None)]);
    let mut db = Database::new(connection);
    let response = db.execute("UPDATE t SET a = 1", false).await;
    assert!(response.success);
    assert_eq!(response.affected, 3);
    assert_eq!(response.payload, Payload::Done(true));
}

#[tokio::test]
async fn failures() {
    let connection = MockConnection::default()
        .reply(vec![Err(anyhow::anyhow!("no such table: t"))])
        .reply(vec![Err(anyhow::Error::new(Error::ConstraintViolation(
            "UNIQUE constraint failed: t.a".into(),
        ))
        .context("While executing the insert"))]);
    let mut db = Database::new(connection);
    let response = db.execute("SELECT * FROM t", false).await;
    assert!(!response.success);
    assert_eq!(response.message, "no such table: t");
    assert_eq!(response.payload, Payload::Empty);
    assert_eq!(response.query, "SELECT * FROM t");
    assert_eq!(
        response.into_result(),
        Err(Error::Query("no such table: t".into()))
    );

    let response = db.execute("INSERT INTO t (a) VALUES (1)", false).await;
    assert!(response.constraint_violation);
    assert!(response.message.contains("UNIQUE constraint failed"));
    assert!(response.into_result().unwrap_err().is_constraint_violation());
}

/// Runs in a child process, spawned by `debug_mode_halts`.
#[test]
fn debug_mode_failure() {
    if env::var(HALT_CHILD).is_err() {
        return;
    }
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to build the runtime");
    runtime.block_on(async {
        // A spawned task must not contain the failure
        let task = tokio::spawn(async {
            let connection =
                MockConnection::default().reply(vec![Err(anyhow::anyhow!("syntax error"))]);
            let mut db = Database::with_config(connection, Config::default().with_debug(true));
            db.execute("SELEC 1", false).await;
        });
        let _ = task.await;
    });
    println!("{}", STILL_RUNNING);
}

const HALT_CHILD: &str = "DRAY_TEST_HALT_CHILD";
const STILL_RUNNING: &str = "process still running after the failure";

#[test]
fn debug_mode_halts() {
    let output = Command::new(env::current_exe().expect("Failed to locate the test binary"))
        .args(["debug_mode_failure", "--exact", "--nocapture", "--test-threads=1"])
        .env(HALT_CHILD, "1")
        .output()
        .expect("Failed to run the child process");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(output.status.code(), Some(DEBUG_EXIT_CODE), "{}", stdout);
    assert!(!stdout.contains(STILL_RUNNING));
}

#[tokio::test]
async fn save_transient_and_persisted() {
    let connection = MockConnection::default()
        .reply(vec![row(&[("id", Value::Int64(Some(1)))]), affected(1, Some(1))])
        .reply(vec![row(&[("id", Value::Int64(Some(1)))]), affected(1, Some(1))]);
    let mut db = Database::new(connection);
    let mut user = User {
        id: 0,
        name: "Ann".into(),
        age: Some(30),
    };
    assert_eq!(user.save(&mut db, None).await, Ok(1));
    assert_eq!(user.id, 1);
    user.age = None;
    assert_eq!(user.save(&mut db, None).await, Ok(1));

    let queries = &db.executor().queries;
    assert_eq!(
        queries[0].sql,
        indoc! {r#"
            INSERT INTO "user" ("name", "age") VALUES (?, ?)
            RETURNING "id";
        "#}
        .trim()
    );
    assert_eq!(
        queries[1].sql,
        indoc! {r#"
            INSERT INTO "user" ("name", "age", "id") VALUES (?, ?, ?)
            ON CONFLICT ("id") DO UPDATE SET
            "name" = EXCLUDED."name",
            "age" = EXCLUDED."age"
            RETURNING "id";
        "#}
        .trim()
    );
    assert_eq!(
        queries[1].bindings,
        vec![
            Value::Varchar(Some("Ann".into())),
            Value::Int32(None),
            Value::Int64(Some(1))
        ]
    );
}

#[tokio::test]
async fn ignored_insert_keeps_transient() {
    let connection = MockConnection::default().reply(vec![affected(0, None)]);
    let mut db = Database::new(connection);
    let created = User::create(
        &mut db,
        &[("name", "Ann".into())],
        SaveMode::InsertOrIgnore,
    )
    .await;
    assert_eq!(created, Ok(None));
    assert!(db.executor().queries[0].sql.contains("ON CONFLICT DO NOTHING"));
}

#[tokio::test]
async fn create_without_fields() {
    let mut db = Database::new(MockConnection::default());
    assert_eq!(
        User::create(&mut db, &[("nope", 1.into())], SaveMode::InsertOrFail).await,
        Ok(None)
    );
    assert!(db.executor().queries.is_empty());
}

#[tokio::test]
async fn transient_guards() {
    let mut db = Database::new(MockConnection::default());
    let user = User::default();
    assert!(matches!(
        user.update(&mut db).await,
        Err(Error::InvalidArgument(..))
    ));
    assert!(matches!(
        user.delete(&mut db).await,
        Err(Error::InvalidArgument(..))
    ));
    assert!(matches!(
        User::update_all(&mut db, " ", &[("age", 1.into())]).await,
        Err(Error::InvalidArgument(..))
    ));
    assert!(matches!(
        User::update_all(&mut db, "age > 1", &[("height", 1.into())]).await,
        Err(Error::InvalidArgument(..))
    ));
    assert!(db.executor().queries.is_empty());
}

#[tokio::test]
async fn update_skips_identity() {
    let connection = MockConnection::default().reply(vec![affected(1, None)]);
    let mut db = Database::new(connection);
    let user = User {
        id: 5,
        name: "Bob".into(),
        age: None,
    };
    let updated = user
        .update_with(&mut db, &[("id", 9.into()), ("age", 40.into())])
        .await;
    assert_eq!(updated, Ok(1));
    let query = &db.executor().queries[0];
    assert_eq!(query.sql, "UPDATE \"user\" SET \"age\" = ?\nWHERE \"id\" = ?;");
    assert_eq!(
        query.bindings,
        vec![Value::Int32(Some(40)), Value::Int64(Some(5))]
    );
}

#[tokio::test]
async fn get_shapes() {
    let ann = [
        ("id", Value::Int64(Some(1))),
        ("name", "Ann".into()),
        ("age", Value::Int64(Some(30))),
    ];
    let bob = [
        ("id", Value::Int64(Some(2))),
        ("name", "Bob".into()),
        ("age", Value::Int64(None)),
    ];
    let connection = MockConnection::default()
        .reply(vec![row(&ann), affected(0, None)])
        .reply(vec![row(&ann), affected(0, None)])
        .reply(vec![row(&ann), row(&bob), affected(0, None)])
        .reply(vec![affected(0, None)]);
    let mut db = Database::new(connection);

    let one = User::get(&mut db, "age > 20", "*", false).await;
    assert!(matches!(one, Ok(OneOrMany::One(ref u)) if u.name == "Ann" && u.age == Some(30)));
    let forced = User::get(&mut db, "age > 20", "*", true).await;
    assert!(matches!(forced, Ok(OneOrMany::Many(ref v)) if v.len() == 1));
    let many = User::get(&mut db, "", "", false).await;
    assert_eq!(
        many.map(OneOrMany::into_vec),
        Ok(vec![
            User {
                id: 1,
                name: "Ann".into(),
                age: Some(30)
            },
            User {
                id: 2,
                name: "Bob".into(),
                age: None
            },
        ])
    );
    let none = User::get(&mut db, "age > 99", "*", false).await;
    assert_eq!(none, Ok(OneOrMany::Many(vec![])));
    assert_eq!(db.executor().queries[2].sql, "SELECT *\nFROM \"user\";");
}

#[tokio::test]
async fn find_and_count() {
    let connection = MockConnection::default()
        .reply(vec![affected(0, None)])
        .reply(vec![row(&[("COUNT(*)", Value::Int64(Some(2)))]), affected(0, None)]);
    let mut db = Database::new(connection);
    assert_eq!(User::find(&mut db, 42).await, Ok(None));
    assert_eq!(User::count(&mut db, "age > 20").await, Ok(2));
    let queries = &db.executor().queries;
    assert_eq!(queries[0].sql, "SELECT *\nFROM \"user\"\nWHERE \"id\" = ?\nLIMIT 1;");
    assert_eq!(queries[1].sql, "SELECT COUNT(*)\nFROM \"user\"\nWHERE age > 20;");
}

#[tokio::test]
async fn options_keep_last_label() {
    let connection = MockConnection::default().reply(vec![
        row(&[("id", Value::Int64(Some(1))), ("name", "Ann".into())]),
        row(&[("id", Value::Int64(Some(2))), ("name", "Bob".into())]),
        row(&[("id", Value::Int64(Some(1))), ("name", "Anna".into())]),
        affected(0, None),
    ]);
    let mut db = Database::new(connection);
    let options = User::get_options_data(&mut db, "id", "name", "").await;
    assert_eq!(
        options,
        Ok(vec![
            (Value::Int64(Some(1)), Value::from("Anna")),
            (Value::Int64(Some(2)), Value::from("Bob")),
        ])
    );
    assert_eq!(
        db.executor().queries[0].sql,
        "SELECT \"id\", \"name\"\nFROM \"user\";"
    );
}

#[tokio::test]
async fn options_over_many_rows() {
    let rows = (0..2_000)
        .map(|i| row(&[("age", Value::Int32(Some(i % 50))), ("name", format!("n{}", i).into())]))
        .chain([
            row(&[("age", Value::Null), ("name", "first".into())]),
            row(&[("age", Value::Null), ("name", "last".into())]),
            affected(0, None),
        ])
        .collect();
    let connection = MockConnection::default()
        .reply(rows)
        .reply(vec![
            row(&[("name", "Ann".into()), ("name", "Ann".into())]),
            row(&[("name", "Ann".into()), ("name", "Ann".into())]),
            affected(0, None),
        ]);
    let mut db = Database::new(connection);
    let options = User::get_options_data(&mut db, "age", "name", "")
        .await
        .expect("Failed to collect the options");
    assert_eq!(options.len(), 51);
    assert_eq!(options[0], (Value::Int32(Some(0)), Value::from("n1950")));
    assert_eq!(options[49], (Value::Int32(Some(49)), Value::from("n1999")));
    assert_eq!(options[50], (Value::Null, Value::from("last")));

    let options = User::get_options_data(&mut db, "name", "name", "")
        .await
        .expect("Failed to collect the options");
    assert_eq!(options, vec![(Value::from("Ann"), Value::from("Ann"))]);
}

#[tokio::test]
async fn helpers() {
    let connection = MockConnection::default()
        .reply(vec![affected(0, None)])
        .reply(vec![
            row(&[("total", Value::Int64(Some(7)))]),
            affected(0, None),
        ]);
    let mut db = Database::new(connection);
    assert!(matches!(
        db.get_row_info("user", 3).await,
        Err(Error::NotFound(..))
    ));
    assert!(matches!(
        db.get_rows_info_ids("user", &[]).await,
        Err(Error::InvalidArgument(..))
    ));
    assert_eq!(
        db.get_single_value("user", "SUM(age) AS total", "1=1").await,
        Ok(Some(Value::Int64(Some(7))))
    );
    assert_eq!(db.quote("O'Hara"), "'O''Hara'");
    assert_eq!(db.quote(Option::<i32>::None), "NULL");
}

#[test]
fn attributes() {
    let mut user = User {
        id: 4,
        name: "Ann".into(),
        age: None,
    };
    assert_eq!(user.set_attribute("id", 9), Ok(false));
    assert_eq!(user.id, 4);
    assert_eq!(user.set_attribute("age", 31), Ok(true));
    assert_eq!(user.set_attribute("height", 31), Ok(false));
    assert_eq!(user.get_attribute("age"), Some(Value::Int32(Some(31))));
    assert_eq!(user.get_attribute("height"), None);
    assert_eq!(
        User::field_names().collect::<Vec<_>>(),
        vec!["id", "name", "age"]
    );
    assert_eq!(user.get_attributes().len(), 3);

    let filled = User::fill(
        &[("name", Value::from("Ann")), ("extra", Value::from(true))]
            .into_iter()
            .collect::<RowLabeled>(),
    );
    assert_eq!(
        filled,
        Ok(Some(User {
            id: 0,
            name: "Ann".into(),
            age: None
        }))
    );
    assert_eq!(User::fill(&RowLabeled::default()), Ok(None));
}
