// SPDX-License-Identifier: AGPL-3.0-or-later

use catcache_core::model::ReleaseTrackArtist;

use super::schema::release_track_artist;

#[derive(Debug, Clone, Queryable)]
pub struct QueryableRecord {
    pub release_id: i32,
    pub track_sequence: i32,
    pub artist_name: Option<String>,
}

impl From<QueryableRecord> for ReleaseTrackArtist {
    fn from(from: QueryableRecord) -> Self {
        let QueryableRecord { release_id, track_sequence, artist_name } = from;
        Self { release_id, track_sequence, artist_name: artist_name.unwrap_or_default() }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = release_track_artist)]
pub struct InsertableRecord<'a> {
    pub release_id: i32,
    pub track_sequence: i32,
    pub artist_name: Option<&'a str>,
}
