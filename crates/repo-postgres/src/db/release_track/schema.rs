// SPDX-License-Identifier: AGPL-3.0-or-later

diesel::table! {
    release_track (release_id, sequence) {
        release_id -> Integer,
        sequence -> Nullable<Integer>,
        position -> Nullable<Text>,
        title -> Text,
        duration -> Nullable<Text>,
    }
}
