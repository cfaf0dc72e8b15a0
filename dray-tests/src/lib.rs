mod conflicts;
mod helpers;
mod types;
mod users;

use crate::{conflicts::conflicts, helpers::helpers, types::types, users::users};
use dray::{Connection, Database, Executor};
use log::LevelFilter;
use std::env;

/// Backend specific pieces of the DDL the scenarios need.
#[derive(Debug, Clone, Copy)]
pub struct Fixtures {
    /// Column definition of an auto generated integer primary key.
    pub identity: &'static str,
    pub text: &'static str,
    pub blob: &'static str,
}

impl Fixtures {
    pub const SQLITE: Fixtures = Fixtures {
        identity: "INTEGER PRIMARY KEY",
        text: "TEXT",
        blob: "BLOB",
    };
}

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

pub async fn execute_tests<C: Connection>(connection: C, fixtures: &Fixtures) {
    let mut db = Database::new(connection);
    users(&mut db, fixtures).await;
    conflicts(&mut db, fixtures).await;
    types(&mut db, fixtures).await;
    helpers(&mut db, fixtures).await;
}

/// Drop and recreate a table, so that identities start again from 1.
pub(crate) async fn recreate<E: Executor>(db: &mut Database<E>, table: &str, columns: &str) {
    let response = db
        .execute(format!("DROP TABLE IF EXISTS \"{}\";", table), false)
        .await;
    assert!(response.success, "{}", response.message);
    let response = db
        .execute(format!("CREATE TABLE \"{}\" ({});", table, columns), false)
        .await;
    assert!(response.success, "{}", response.message);
}

#[macro_export]
macro_rules! silent_logs {
    ($($code:tt)+) => {{
        let level = log::max_level();
        log::set_max_level(log::LevelFilter::Off);
        $($code)+
        log::set_max_level(level);
    }};
}
