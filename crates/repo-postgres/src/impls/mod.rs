// SPDX-License-Identifier: AGPL-3.0-or-later

//! Trait implementations of `catcache-repo`'s storage-agnostic interfaces
//! for [`crate::prelude::Connection`].

mod classify;
mod dedup;
mod import;
mod introspect;
mod prune;
