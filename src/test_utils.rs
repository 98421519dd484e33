/// # Test Utilities Module
///
/// Fixtures for unit tests: isolated in-memory databases, optionally with a
/// `users` table and a few sample rows, plus log capture through the test
/// writer.

use crate::core::db::{Database, Fields};
use crate::core::Result;
use std::sync::Once;

pub const USERS_SCHEMA: &str = "
    CREATE TABLE users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        age INTEGER,
        email TEXT UNIQUE
    );
";

/// Installs a fmt subscriber that writes through libtest's capture.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    });
}

/// Isolated database test fixture
pub struct DatabaseFixture {
    pub database: Database,
}

impl DatabaseFixture {
    /// Create an empty in-memory database
    pub fn new() -> Result<Self> {
        init_tracing();
        Ok(DatabaseFixture {
            database: Database::open_in_memory()?,
        })
    }

    /// Create fixture with an empty `users` table
    pub fn with_users_table() -> Result<Self> {
        let fixture = DatabaseFixture::new()?;
        fixture.database.execute_batch(USERS_SCHEMA)?;
        Ok(fixture)
    }

    /// Create fixture with Alice (30), Bob (25) and Carol (35)
    pub fn with_sample_data() -> Result<Self> {
        let fixture = DatabaseFixture::with_users_table()?;
        for (name, age) in [("Alice", 30), ("Bob", 25), ("Carol", 35)] {
            let user = Fields::new()
                .with("name", name.to_string())
                .with("age", age)
                .with("email", format!("{}@example.com", name.to_lowercase()));
            fixture.database.insert("users", &user)?;
        }
        Ok(fixture)
    }
}
