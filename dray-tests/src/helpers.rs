use crate::{Fixtures, recreate, silent_logs};
use dray::{Database, Error, Executor, Payload, Query, Value, date_format};
use time::macros::date;

pub async fn helpers<E: Executor>(db: &mut Database<E>, fixtures: &Fixtures) {
    recreate(
        db,
        "ledger",
        &format!(
            "\"id\" {}, \"account\" {} NOT NULL, \"amount\" INTEGER NOT NULL",
            fixtures.identity, fixtures.text
        ),
    )
    .await;

    // Raw statements with bindings
    let mut query = Query::new(
        "INSERT INTO \"ledger\" (\"account\", \"amount\") VALUES (?, ?), (?, ?), (?, ?);",
    );
    query
        .bind("food")
        .bind(1)
        .bind("rent")
        .bind(2)
        .bind("O'Brien")
        .bind(3);
    let response = db.execute(query, false).await;
    assert!(response.success, "{}", response.message);
    assert_eq!(response.affected, 3);
    assert_eq!(response.payload, Payload::InsertId(3));

    // Rows by identity
    let row = db
        .get_row_info("ledger", 2)
        .await
        .expect("Row 2 should exist");
    assert_eq!(
        row.get_column("account"),
        Some(&Value::Varchar(Some("rent".into())))
    );
    assert!(matches!(
        db.get_row_info("ledger", 9).await,
        Err(Error::NotFound(..))
    ));
    let rows = db
        .get_rows_info_ids("ledger", &[1, 3, 99])
        .await
        .expect("Rows 1 and 3 should exist");
    assert_eq!(rows.len(), 2);
    assert!(matches!(
        db.get_rows_info_ids("ledger", &[98, 99]).await,
        Err(Error::NotFound(..))
    ));
    assert!(matches!(
        db.get_rows_info_ids("ledger", &[]).await,
        Err(Error::InvalidArgument(..))
    ));

    // Single values
    assert_eq!(
        db.get_single_value("ledger", "SUM(\"amount\") AS total", "")
            .await,
        Ok(Some(Value::Int64(Some(6))))
    );
    let quoted = db.quote("O'Brien");
    assert_eq!(quoted, "'O''Brien'");
    assert_eq!(
        db.get_single_value("ledger", "\"amount\"", &format!("\"account\" = {}", quoted))
            .await,
        Ok(Some(Value::Int64(Some(3))))
    );
    assert_eq!(
        db.get_single_value("ledger", "\"amount\"", "\"amount\" > 100")
            .await,
        Ok(None)
    );
    assert_eq!(
        db.set_single_value("ledger", "\"amount\" = \"amount\" * 10", "\"id\" = 1")
            .await,
        Ok(1)
    );
    assert_eq!(
        db.get_single_value("ledger", "\"amount\"", "\"id\" = 1")
            .await,
        Ok(Some(Value::Int64(Some(10))))
    );
    assert!(matches!(
        db.set_single_value("ledger", " ", "\"id\" = 1").await,
        Err(Error::InvalidArgument(..))
    ));

    // Lines
    let line = db
        .get_line_values("ledger", "\"account\", \"amount\"", "\"id\" = 2")
        .await
        .expect("Failed to read the line")
        .expect("Line 2 should exist");
    assert_eq!(line.names(), ["account", "amount"]);
    assert_eq!(line.values()[1], Value::Int64(Some(2)));
    assert_eq!(
        db.get_line_values("ledger", "*", "\"id\" = 99").await,
        Ok(None)
    );
    assert_eq!(
        db.set_line_values("ledger", &[("amount", 0.into())], "\"amount\" < 5")
            .await,
        Ok(2)
    );
    assert!(matches!(
        db.set_line_values("ledger", &[], "").await,
        Err(Error::InvalidArgument(..))
    ));
    let rows = db
        .get_query_result("SELECT \"amount\" FROM \"ledger\" ORDER BY \"id\";")
        .await
        .expect("Failed to read the amounts");
    let amounts: Vec<_> = rows.iter().map(|r| r.values()[0].clone()).collect();
    assert_eq!(
        amounts,
        [
            Value::Int64(Some(10)),
            Value::Int64(Some(0)),
            Value::Int64(Some(0))
        ]
    );

    // Response shapes
    let response = db
        .execute("SELECT * FROM \"ledger\" WHERE \"id\" = 1;", false)
        .await;
    assert!(matches!(response.payload, Payload::Row(..)));
    assert_eq!(response.result_rows, 1);
    assert_eq!(response.result_cols, 3);
    let response = db
        .execute("SELECT * FROM \"ledger\" WHERE \"id\" = 1;", true)
        .await;
    assert!(matches!(response.payload, Payload::Rows(ref v) if v.len() == 1));
    assert_eq!(date_format(&date!(2024 - 01 - 05)), "2024-01-05");

    let response = db.execute("DELETE FROM \"ledger\";", false).await;
    assert!(response.success, "{}", response.message);
    assert_eq!(response.payload, Payload::Done(true));
    assert_eq!(response.affected, 3);
    let response = db.execute("SELECT * FROM \"ledger\";", false).await;
    assert!(response.success, "{}", response.message);
    assert_eq!(response.payload, Payload::Rows(vec![]));
    assert_eq!(response.result_rows, 0);
    assert_eq!(response.result_cols, 3);

    let mut response = None;
    silent_logs! {
        response = Some(db.execute("SELECT * FROM \"missing_table\";", false).await);
    }
    let response = response.expect("The statement should have run");
    assert!(!response.success);
    assert!(response.message.contains("no such table"), "{}", response.message);
    assert!(response.error().is_some());
}
