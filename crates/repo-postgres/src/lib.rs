// SPDX-License-Identifier: AGPL-3.0-or-later

#![warn(rust_2018_idioms)]
#![warn(missing_debug_implementations)]
#![warn(unreachable_pub)]
// recursion_limit was required for diesel
#![recursion_limit = "256"]

use diesel::migration::{MigrationVersion, Result as MigrationResult};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness as _};

pub type DbBackend = diesel::pg::Pg;
pub type DbConnection = diesel::pg::PgConnection;

pub mod prelude {
    //! Re-exports used throughout [`crate::impls`].

    pub(crate) use std::ops::Deref;
    use std::ops::DerefMut;

    pub(crate) use catcache_repo::error::{Error as RepoError, Result as RepoResult};
    pub(crate) use diesel::prelude::*;

    pub use crate::{DbBackend, DbConnection};

    pub use diesel::Connection as _;

    #[allow(missing_debug_implementations)]
    pub struct Connection<'db>(&'db mut DbConnection);

    impl<'db> Connection<'db> {
        pub fn new(inner: &'db mut DbConnection) -> Self {
            Self(inner)
        }
    }

    impl<'db> From<&'db mut DbConnection> for Connection<'db> {
        fn from(inner: &'db mut DbConnection) -> Self {
            Self::new(inner)
        }
    }

    impl AsRef<DbConnection> for Connection<'_> {
        fn as_ref(&self) -> &DbConnection {
            self.0
        }
    }

    impl AsMut<DbConnection> for Connection<'_> {
        fn as_mut(&mut self) -> &mut DbConnection {
            self.0
        }
    }

    impl Deref for Connection<'_> {
        type Target = DbConnection;

        fn deref(&self) -> &Self::Target {
            self.as_ref()
        }
    }

    impl DerefMut for Connection<'_> {
        fn deref_mut(&mut self) -> &mut Self::Target {
            self.as_mut()
        }
    }

    pub(crate) fn repo_error(err: diesel::result::Error) -> RepoError {
        RepoError::Other(anyhow::Error::from(err))
    }

    #[cfg(test)]
    pub mod tests {
        use diesel::Connection as _;

        use super::DbConnection;

        pub type TestResult<T> = anyhow::Result<T>;

        /// Requires a reachable, empty database; set `TEST_DATABASE_URL` to run.
        pub fn establish_connection() -> TestResult<DbConnection> {
            let database_url = std::env::var("TEST_DATABASE_URL")
                .unwrap_or_else(|_| "postgresql:///catcache_test".to_string());
            let mut connection = DbConnection::establish(&database_url)?;
            crate::run_migrations(&mut connection).map_err(|err| anyhow::anyhow!(err.to_string()))?;
            Ok(connection)
        }
    }
}

mod db;
pub mod impls;
pub mod schema_sql;

use prelude::Connection;

const EMBEDDED_MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Runs every embedded migration that hasn't run against `connection` yet.
pub fn run_migrations(connection: &mut DbConnection) -> MigrationResult<Vec<MigrationVersion<'_>>> {
    connection.run_pending_migrations(EMBEDDED_MIGRATIONS)
}
