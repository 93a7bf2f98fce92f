// SPDX-License-Identifier: AGPL-3.0-or-later

use std::num::NonZeroU32;

use diesel::{r2d2, Connection as _};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Result;

use super::Storage;

pub type ConnectionManager = r2d2::ConnectionManager<diesel::PgConnection>;

pub type ConnectionPool = r2d2::Pool<ConnectionManager>;

pub type PooledConnection = r2d2::PooledConnection<ConnectionManager>;

pub fn create_connection_pool(storage: &Storage, max_size: NonZeroU32) -> Result<ConnectionPool> {
    let url = storage.as_ref();
    // Establish a test connection before creating the pool to fail fast on a
    // bad URL or unreachable server instead of r2d2 retrying silently.
    std::mem::drop(diesel::PgConnection::establish(url)?);
    let manager = ConnectionManager::new(url);
    let pool = ConnectionPool::builder().max_size(max_size.get()).build(manager)?;
    Ok(pool)
}

pub fn get_pooled_connection(pool: &ConnectionPool) -> Result<PooledConnection> {
    pool.get().map_err(Into::into)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    pub max_size: NonZeroU32,
}
