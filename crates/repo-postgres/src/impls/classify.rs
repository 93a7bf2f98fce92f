// SPDX-License-Identifier: AGPL-3.0-or-later

//! [`ClassificationSource`] backed by a join against `release_artist` that
//! keeps only the primary artist credit per release.

use catcache_core::classifier::ClassifierInput;
use catcache_repo::classify::ClassificationSource;
use catcache_repo::error::Result as RepoResult;
use diesel::prelude::*;
use diesel::sql_types::{Integer, Text};

use crate::prelude::{repo_error, Connection};

#[derive(QueryableByName)]
struct ReleaseRow {
    #[diesel(sql_type = Integer)]
    release_id: i32,
    #[diesel(sql_type = Text)]
    artist_name: String,
    #[diesel(sql_type = Text)]
    title: String,
}

impl ClassificationSource for Connection<'_> {
    fn load_releases_for_classification(&mut self) -> RepoResult<Vec<ClassifierInput>> {
        let rows = diesel::sql_query(
            "SELECT r.id AS release_id, ra.artist_name AS artist_name, r.title AS title
             FROM release r
             JOIN release_artist ra ON ra.release_id = r.id AND ra.extra = false
             WHERE ra.artist_name IS NOT NULL",
        )
        .load::<ReleaseRow>(self.as_mut())
        .map_err(repo_error)?;

        Ok(rows
            .into_iter()
            .map(|row| ClassifierInput {
                release_id: row.release_id,
                raw_artist: row.artist_name,
                raw_title: row.title,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use catcache_repo::classify::ClassificationSource as _;

    use crate::prelude::tests::establish_connection;
    use crate::prelude::Connection;

    #[test]
    #[ignore = "requires TEST_DATABASE_URL"]
    fn empty_store_yields_no_releases() {
        let mut conn = establish_connection().expect("connection");
        let mut connection = Connection::new(&mut conn);
        let releases = connection.load_releases_for_classification().expect("load");
        assert!(releases.is_empty());
    }
}
