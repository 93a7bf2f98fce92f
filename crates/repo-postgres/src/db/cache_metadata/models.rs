// SPDX-License-Identifier: AGPL-3.0-or-later

use catcache_core::model::CacheMetadata;

use super::schema::cache_metadata;

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = cache_metadata, primary_key(release_id))]
pub struct QueryableRecord {
    pub release_id: i32,
    pub cached_at: i64,
    pub source: String,
    pub last_validated: Option<i64>,
}

impl From<QueryableRecord> for CacheMetadata {
    fn from(from: QueryableRecord) -> Self {
        let QueryableRecord { release_id, cached_at, source, last_validated } = from;
        Self { release_id, cached_at, source, last_validated }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = cache_metadata)]
pub struct InsertableRecord<'a> {
    pub release_id: i32,
    pub source: &'a str,
}
