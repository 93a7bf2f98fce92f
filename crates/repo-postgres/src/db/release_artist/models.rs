// SPDX-License-Identifier: AGPL-3.0-or-later

use catcache_core::model::ReleaseArtist;

use super::schema::release_artist;

#[derive(Debug, Clone, Queryable)]
pub struct QueryableRecord {
    pub release_id: i32,
    pub artist_name: Option<String>,
    pub extra: bool,
}

impl From<QueryableRecord> for ReleaseArtist {
    fn from(from: QueryableRecord) -> Self {
        let QueryableRecord { release_id, artist_name, extra } = from;
        Self { release_id, artist_name: artist_name.unwrap_or_default(), extra }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = release_artist)]
pub struct InsertableRecord<'a> {
    pub release_id: i32,
    pub artist_name: Option<&'a str>,
    pub extra: bool,
}
