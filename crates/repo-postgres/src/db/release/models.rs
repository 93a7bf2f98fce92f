// SPDX-License-Identifier: AGPL-3.0-or-later

use catcache_core::model::Release;

use super::schema::release;

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = release, primary_key(id))]
pub struct QueryableRecord {
    pub id: i32,
    pub title: String,
    pub release_year: Option<i32>,
    pub artwork_url: Option<String>,
    pub master_id: Option<i32>,
}

impl From<QueryableRecord> for Release {
    fn from(from: QueryableRecord) -> Self {
        let QueryableRecord { id, title, release_year, artwork_url, master_id } = from;
        Self { id, title, release_year, master_id, artwork_url }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = release)]
pub struct InsertableRecord<'a> {
    pub id: i32,
    pub title: &'a str,
    pub release_year: Option<i32>,
    pub master_id: Option<i32>,
}
