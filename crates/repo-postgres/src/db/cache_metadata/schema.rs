// SPDX-License-Identifier: AGPL-3.0-or-later

diesel::table! {
    cache_metadata (release_id) {
        release_id -> Integer,
        cached_at -> BigInt,
        source -> Text,
        last_validated -> Nullable<BigInt>,
    }
}
