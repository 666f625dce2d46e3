use std::sync::RwLock;

use innkeep_auth::RoleAuditEntry;

use super::{AuditFilter, AuditLog};
use crate::store::StoreError;

/// In-memory audit log (tests/dev).
#[derive(Debug, Default)]
pub struct InMemoryAuditLog {
    entries: RwLock<Vec<RoleAuditEntry>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl AuditLog for InMemoryAuditLog {
    async fn append(&self, entry: RoleAuditEntry) -> Result<(), StoreError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;
        entries.push(entry);
        Ok(())
    }

    async fn query(&self, filter: AuditFilter) -> Result<Vec<RoleAuditEntry>, StoreError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;

        let mut out: Vec<RoleAuditEntry> = entries.iter().filter(|e| filter.matches(e)).cloned().collect();
        out.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| b.id.cmp(&a.id)));
        Ok(out)
    }
}
