// SPDX-License-Identifier: AGPL-3.0-or-later

diesel::table! {
    release_artist (release_id, artist_name) {
        release_id -> Integer,
        artist_name -> Nullable<Text>,
        extra -> Bool,
    }
}
