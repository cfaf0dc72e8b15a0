use crate::{Fixtures, recreate, silent_logs};
use dray::{Database, Error, Executor, Model, SaveMode};

#[derive(Model, Default, Debug, Clone, PartialEq)]
struct Member {
    id: i64,
    name: String,
    score: i32,
}

async fn score<E: Executor>(db: &mut Database<E>, id: i64) -> i32 {
    Member::find(db, id)
        .await
        .expect("Failed to query the member")
        .expect("The member should exist")
        .score
}

pub async fn conflicts<E: Executor>(db: &mut Database<E>, fixtures: &Fixtures) {
    recreate(
        db,
        "member",
        &format!(
            "\"id\" {}, \"name\" {} NOT NULL UNIQUE, \"score\" INTEGER NOT NULL",
            fixtures.identity, fixtures.text
        ),
    )
    .await;
    assert_eq!(Member::table_name(), "member");

    let mut ann = Member {
        name: "Ann".into(),
        score: 10,
        ..Default::default()
    };
    assert_eq!(ann.save(db, None).await, Ok(1));

    // Saving a persisted member repeatedly converges on one row
    ann.score = 11;
    assert_eq!(ann.save(db, None).await, Ok(1));
    assert_eq!(ann.save(db, Some(SaveMode::InsertOrUpdate)).await, Ok(1));
    assert_eq!(Member::count(db, "").await, Ok(1));
    assert_eq!(score(db, 1).await, 11);

    // Ignore mode never touches the existing row
    let mut stale = ann.clone();
    stale.score = 99;
    assert_eq!(stale.save(db, Some(SaveMode::InsertOrIgnore)).await, Ok(1));
    assert_eq!(score(db, 1).await, 11);
    let mut twin = Member {
        name: "Ann".into(),
        score: 50,
        ..Default::default()
    };
    assert_eq!(twin.save(db, Some(SaveMode::InsertOrIgnore)).await, Ok(0));
    assert!(twin.is_transient());
    assert_eq!(
        Member::create(
            db,
            &[("name", "Ann".into()), ("score", 1.into())],
            SaveMode::InsertOrIgnore
        )
        .await,
        Ok(None)
    );
    assert_eq!(Member::count(db, "").await, Ok(1));
    assert_eq!(score(db, 1).await, 11);

    // Fail mode surfaces the violation
    let mut clash = Member {
        name: "Ann".into(),
        score: 1,
        ..Default::default()
    };
    let mut result = Ok(0);
    silent_logs! {
        result = clash.save(db, None).await;
    }
    assert!(
        matches!(result, Err(Error::ConstraintViolation(..))),
        "Unexpected result {:?}",
        result
    );
    assert!(clash.is_transient());
    let mut duplicate = Member {
        id: 1,
        name: "Zed".into(),
        score: 1,
    };
    silent_logs! {
        result = duplicate.save(db, Some(SaveMode::InsertOrFail)).await;
    }
    assert!(matches!(result, Err(ref e) if e.is_constraint_violation()));
    assert_eq!(duplicate.id, 1);
    assert_eq!(Member::count(db, "").await, Ok(1));

    // The identity cannot be reassigned
    assert_eq!(ann.set_attribute("id", 42), Ok(false));
    assert_eq!(ann.id, 1);
    assert_eq!(
        ann.update_with(db, &[("id", 42.into()), ("score", 12.into())])
            .await,
        Ok(1)
    );
    assert_eq!(Member::find(db, 42).await, Ok(None));
    assert_eq!(score(db, 1).await, 12);

    // Malformed calls
    assert!(matches!(
        Member::default().delete(db).await,
        Err(Error::InvalidArgument(..))
    ));
    assert!(matches!(
        Member::update_all(db, "1 = 1", &[("rank", 1.into())]).await,
        Err(Error::InvalidArgument(..))
    ));
    assert!(matches!(
        Member::update_all(db, "", &[("score", 1.into())]).await,
        Err(Error::InvalidArgument(..))
    ));
    let mut count = Ok(0);
    silent_logs! {
        count = Member::count(db, "no_such_column = 1").await;
    }
    assert!(matches!(count, Err(Error::Query(..))), "{:?}", count);
}
