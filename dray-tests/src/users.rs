use crate::{Fixtures, recreate};
use dray::{Database, Executor, Model, OneOrMany, SaveMode, Value};

#[derive(Model, Default, Debug, Clone, PartialEq)]
#[dray(table = "users")]
struct User {
    id: i64,
    name: String,
    age: Option<i32>,
    email: Option<String>,
}

pub async fn users<E: Executor>(db: &mut Database<E>, fixtures: &Fixtures) {
    recreate(
        db,
        "users",
        &format!(
            "\"id\" {}, \"name\" {} NOT NULL UNIQUE, \"age\" INTEGER, \"email\" {}",
            fixtures.identity, fixtures.text, fixtures.text
        ),
    )
    .await;

    // Ann
    let mut ann = User {
        name: "Ann".into(),
        age: Some(30),
        ..Default::default()
    };
    assert!(ann.is_transient());
    let id = ann.save(db, None).await.expect("Failed to save Ann");
    assert_eq!(id, 1);
    assert_eq!(ann.id, 1);
    let found = User::find(db, id)
        .await
        .expect("Failed to query Ann")
        .expect("Ann should exist");
    assert_eq!(found, ann);
    ann.age = Some(31);
    assert_eq!(ann.update(db).await, Ok(1));
    let found = User::find(db, 1)
        .await
        .expect("Failed to query Ann")
        .expect("Ann should exist");
    assert_eq!(found.age, Some(31));
    assert_eq!(found.email, None);

    // Others
    let bob = User::create(
        db,
        &[("name", "Bob".into()), ("age", 25.into())],
        SaveMode::InsertOrFail,
    )
    .await
    .expect("Failed to create Bob")
    .expect("Bob should have been created");
    assert_eq!(bob.id, 2);
    let mut carl = User {
        name: "Carl".into(),
        age: Some(18),
        email: Some("carl@example.com".into()),
        ..Default::default()
    };
    assert_eq!(carl.save(db, None).await, Ok(3));

    // Counting
    assert_eq!(User::count(db, "age > 20").await, Ok(2));
    assert_eq!(User::count(db, "").await, Ok(3));

    // Result shapes
    match User::get(db, "name = 'Ann'", "*", false)
        .await
        .expect("Failed to get Ann")
    {
        OneOrMany::One(user) => assert_eq!(user, ann),
        other => panic!("Expected a single user, got {:?}", other),
    }
    let forced = User::get(db, "name = 'Ann'", "*", true)
        .await
        .expect("Failed to get Ann");
    assert!(matches!(forced, OneOrMany::Many(ref v) if v.len() == 1));
    let mut adults: Vec<_> = User::get(db, "age > 20", "*", false)
        .await
        .expect("Failed to get the adults")
        .into_iter()
        .map(|u| u.name)
        .collect();
    adults.sort();
    assert_eq!(adults, ["Ann", "Bob"]);
    assert!(
        User::get(db, "age > 99", "*", false)
            .await
            .expect("Failed to get nobody")
            .is_empty()
    );

    // Lookups
    let found = User::find_by(db, "email", "carl@example.com")
        .await
        .expect("Failed to query Carl")
        .expect("Carl should exist");
    assert_eq!(found, carl);
    assert_eq!(User::find_by(db, "name", "Dan").await, Ok(None));
    assert_eq!(User::find(db, 77).await, Ok(None));
    let youngest = User::first_by(db, "", "age").await.expect("Failed first_by");
    assert_eq!(youngest.map(|u| u.name), Some("Carl".to_string()));
    let oldest_under_30 = User::last_by(db, "age < 30", "age")
        .await
        .expect("Failed last_by");
    assert_eq!(oldest_under_30.map(|u| u.name), Some("Bob".to_string()));
    assert_eq!(User::last_by(db, "age > 99", "age").await, Ok(None));

    // Options and raw rows
    let options = User::get_options_data(db, "id", "name", "age >= 18")
        .await
        .expect("Failed to get the options");
    assert_eq!(
        options,
        vec![
            (Value::Int64(Some(1)), Value::from("Ann")),
            (Value::Int64(Some(2)), Value::from("Bob")),
            (Value::Int64(Some(3)), Value::from("Carl")),
        ]
    );
    let rows = User::get_data(db, "age > 20", "name, age", "")
        .await
        .expect("Failed to get the data");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].names(), ["name", "age"]);

    // Bulk and partial updates
    assert_eq!(
        User::update_all(db, "age < 20", &[("age", 20.into())]).await,
        Ok(1)
    );
    carl = User::find(db, 3)
        .await
        .expect("Failed to query Carl")
        .expect("Carl should exist");
    assert_eq!(carl.age, Some(20));
    assert_eq!(
        carl.update_with(db, &[("email", Value::Varchar(None))]).await,
        Ok(1)
    );
    let found = User::find(db, 3)
        .await
        .expect("Failed to query Carl")
        .expect("Carl should exist");
    assert_eq!(found.email, None);
    assert_eq!(found.name, "Carl");

    // Nulls survive an upsert
    carl.age = None;
    carl.email = None;
    assert_eq!(carl.save(db, None).await, Ok(3));
    let found = User::find(db, 3)
        .await
        .expect("Failed to query Carl")
        .expect("Carl should exist");
    assert_eq!(found, carl);

    // Deletion
    assert_eq!(ann.delete(db).await, Ok(1));
    assert_eq!(User::find(db, 1).await, Ok(None));
    assert_eq!(ann.id, 1);
    assert_eq!(ann.name, "Ann");
    assert_eq!(ann.delete(db).await, Ok(0));

    assert_eq!(User::clear(db).await, Ok(2));
    assert_eq!(User::count(db, "").await, Ok(0));
}
