//! Volatile backend used when no durable store is configured or reachable.
use async_trait::async_trait;

use super::{Collection, Persistence, TableStorage, Tables};
use crate::error::AppError;

/// Persistence that keeps nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct Volatile;

#[async_trait]
impl Persistence for Volatile {
    const DURABLE: bool = false;
    const NAME: &'static str = "memory";

    async fn persist(&self, _dirty: Vec<(Collection, String)>) -> Result<(), AppError> {
        Ok(())
    }

    async fn check_writable(&self) -> Result<(), AppError> {
        Ok(())
    }
}

pub type MemoryStorage = TableStorage<Volatile>;

impl MemoryStorage {
    pub fn new() -> Self {
        Self::with_tables(Tables::default(), Volatile)
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}
