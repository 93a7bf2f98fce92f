// SPDX-License-Identifier: AGPL-3.0-or-later

use catcache_core::model::ReleaseTrack;

use super::schema::release_track;

#[derive(Debug, Clone, Queryable)]
pub struct QueryableRecord {
    pub release_id: i32,
    pub sequence: Option<i32>,
    pub position: Option<String>,
    pub title: String,
    pub duration: Option<String>,
}

impl From<QueryableRecord> for ReleaseTrack {
    fn from(from: QueryableRecord) -> Self {
        let QueryableRecord { release_id, sequence, position, title, duration } = from;
        Self { release_id, sequence: sequence.unwrap_or_default(), position, title, duration }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = release_track)]
pub struct InsertableRecord<'a> {
    pub release_id: i32,
    pub sequence: Option<i32>,
    pub position: Option<&'a str>,
    pub title: &'a str,
    pub duration: Option<&'a str>,
}
