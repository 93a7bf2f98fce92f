// SPDX-License-Identifier: AGPL-3.0-or-later

diesel::table! {
    release_track_artist (release_id, track_sequence, artist_name) {
        release_id -> Integer,
        track_sequence -> Integer,
        artist_name -> Nullable<Text>,
    }
}
