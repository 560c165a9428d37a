//! Postgres connection pooling for the automation service.
//!
//! Both binaries (the HTTP server and the cron runner) call [`init_pool`] at
//! startup; pending migrations for the price, settings and schedule tables
//! are applied before either accepts work.

use diesel::pg::PgConnection;
use diesel::r2d2::{self, ConnectionManager};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

pub type DbPool = r2d2::Pool<ConnectionManager<PgConnection>>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub fn init_pool(database_url: &str) -> DbPool {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = r2d2::Pool::builder()
        .build(manager)
        .expect("Failed to build Postgres connection pool");

    let mut conn = pool
        .get()
        .expect("Failed to check out a database connection");
    conn.run_pending_migrations(MIGRATIONS)
        .expect("Failed to apply database migrations");

    log::info!("Database ready, schema migrations applied");

    pool
}
