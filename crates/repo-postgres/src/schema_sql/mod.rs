// SPDX-License-Identifier: AGPL-3.0-or-later

//! Raw SQL fragments that diesel's query builder cannot express: trigram
//! index definitions, the dedup copy-swap DDL, and the `ROW_NUMBER` ranking
//! query. Kept as plain `&str` constants so every statement here can be
//! compared, one-to-one, against the statement list it is grounded on.

pub mod constraints;
pub mod indexes;
