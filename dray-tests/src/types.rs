use crate::{Fixtures, recreate};
use dray::{Database, Executor, Model, SaveMode, Value};
use rust_decimal::Decimal;
use time::{
    Date, PrimitiveDateTime, Time,
    macros::{date, datetime, time},
};
use uuid::Uuid;

#[derive(Model, Default, Debug, Clone, PartialEq)]
#[dray(table = "samples")]
struct Sample {
    id: i64,
    flag: bool,
    small: i16,
    big: i64,
    ratio: f64,
    price: Decimal,
    day: Option<Date>,
    at: Option<PrimitiveDateTime>,
    clock: Option<Time>,
    token: Option<Uuid>,
    payload: Vec<u8>,
    #[dray(name = "label")]
    title: String,
    #[dray(skip)]
    cache: Option<String>,
}

pub async fn types<E: Executor>(db: &mut Database<E>, fixtures: &Fixtures) {
    recreate(
        db,
        "samples",
        &format!(
            "\"id\" {id}, \"flag\" INTEGER NOT NULL, \"small\" INTEGER NOT NULL, \
            \"big\" INTEGER NOT NULL, \"ratio\" REAL NOT NULL, \"price\" {text} NOT NULL, \
            \"day\" {text}, \"at\" {text}, \"clock\" {text}, \"token\" {text}, \
            \"payload\" {blob} NOT NULL, \"label\" {text} NOT NULL",
            id = fixtures.identity,
            text = fixtures.text,
            blob = fixtures.blob,
        ),
    )
    .await;

    assert_eq!(
        Sample::field_names().collect::<Vec<_>>(),
        [
            "id", "flag", "small", "big", "ratio", "price", "day", "at", "clock", "token",
            "payload", "label"
        ]
    );
    let nullable: Vec<_> = Sample::fields()
        .iter()
        .filter(|f| f.nullable)
        .map(|f| f.name)
        .collect();
    assert_eq!(nullable, ["day", "at", "clock", "token"]);
    assert_eq!(
        Sample::field("price").map(|f| &f.value),
        Some(&Value::Decimal(None))
    );

    // Every type set
    let mut full = Sample {
        flag: true,
        small: -32768,
        big: i64::MAX,
        ratio: 0.125,
        price: Decimal::new(1250, 2),
        day: Some(date!(1999 - 12 - 31)),
        at: Some(datetime!(2024-02-29 13:45:10)),
        clock: Some(time!(08:00:05)),
        token: Some(Uuid::new_v4()),
        payload: vec![0, 1, 254, 255],
        title: "O'Hara \"quoted\"".into(),
        cache: Some("not persisted".into()),
        ..Default::default()
    };
    let id = full.save(db, None).await.expect("Failed to save the full sample");
    assert_eq!(id, 1);
    let mut found = Sample::find(db, id)
        .await
        .expect("Failed to query the full sample")
        .expect("The full sample should exist");
    assert_eq!(found.cache, None);
    found.cache = full.cache.clone();
    assert_eq!(found, full);
    assert_eq!(
        found.get_attribute("label"),
        Some(Value::Varchar(Some("O'Hara \"quoted\"".into())))
    );
    assert_eq!(found.get_attribute("title"), None);
    assert_eq!(found.get_attribute("cache"), None);

    // Nulls and empty values
    let empty = Sample::create(
        db,
        &[("label", "".into()), ("payload", Vec::<u8>::new().into())],
        SaveMode::InsertOrFail,
    )
    .await
    .expect("Failed to create the empty sample")
    .expect("The empty sample should have been created");
    let found = Sample::find(db, empty.id)
        .await
        .expect("Failed to query the empty sample")
        .expect("The empty sample should exist");
    assert_eq!(found, empty);
    assert_eq!(found.day, None);
    assert_eq!(found.token, None);
    assert!(found.payload.is_empty());

    // Typed lookups go through bindings
    let by_token = Sample::find_by(db, "token", full.token)
        .await
        .expect("Failed to query by token")
        .expect("The full sample should be found by token");
    assert_eq!(by_token.id, full.id);
    let by_day = Sample::find_by(db, "day", date!(1999 - 12 - 31))
        .await
        .expect("Failed to query by day")
        .expect("The full sample should be found by day");
    assert_eq!(by_day.id, full.id);

    // Attribute assignment converts
    assert_eq!(full.set_attribute("small", 7i64), Ok(true));
    assert_eq!(full.small, 7);
    assert!(full.set_attribute("small", "seven").is_err());
    assert_eq!(full.set_attribute("cache", "x"), Ok(false));
    assert_eq!(full.update(db).await, Ok(1));
    assert_eq!(
        Sample::find(db, full.id)
            .await
            .expect("Failed to query the full sample")
            .map(|v| v.small),
        Some(7)
    );
}
