// SPDX-License-Identifier: AGPL-3.0-or-later

diesel::table! {
    release (id) {
        id -> Integer,
        title -> Text,
        release_year -> Nullable<Integer>,
        artwork_url -> Nullable<Text>,
        master_id -> Nullable<Integer>,
    }
}
