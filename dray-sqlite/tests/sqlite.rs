#[cfg(test)]
mod tests {
    use dray_core::Connection;
    use dray_sqlite::SqliteConnection;
    use dray_tests::{Fixtures, execute_tests, init_logs};
    use std::{path::Path, sync::Mutex};
    use tokio::fs;

    static MUTEX: Mutex<()> = Mutex::new(());

    #[tokio::test]
    async fn sqlite() {
        init_logs();
        const DB_PATH: &str = "../target/debug/tests.sqlite";
        let _guard = MUTEX.lock().unwrap();
        fs::create_dir_all("../target/debug")
            .await
            .expect("Failed to create the target directory");
        if Path::new(DB_PATH).exists() {
            fs::remove_file(DB_PATH)
                .await
                .expect("Failed to remove the existing test database file");
        }
        let connection = SqliteConnection::connect(&format!("sqlite://{}?mode=rwc", DB_PATH))
            .await
            .expect("Could not open the database");
        execute_tests(connection, &Fixtures::SQLITE).await;
    }

    #[tokio::test]
    async fn sqlite_memory() {
        init_logs();
        let connection = SqliteConnection::connect("sqlite://:memory:")
            .await
            .expect("Could not open the in memory database");
        execute_tests(connection, &Fixtures::SQLITE).await;
    }
}
