// SPDX-License-Identifier: AGPL-3.0-or-later

pub(crate) mod cache_metadata;
pub(crate) mod release;
pub(crate) mod release_artist;
pub(crate) mod release_track;
pub(crate) mod release_track_artist;

mod join {
    use crate::db::{
        cache_metadata::schema::*, release::schema::*, release_artist::schema::*,
        release_track::schema::*, release_track_artist::schema::*,
    };

    diesel::allow_tables_to_appear_in_same_query!(
        release,
        release_artist,
        release_track,
        release_track_artist,
        cache_metadata,
    );
}
