use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::tokens::{validate_new_token, NewToken, StoreError, TokenRecord, TokenStore};

#[derive(Debug, Default, Serialize, Deserialize)]
struct RegistrySnapshot {
    next_id: u64,
    tokens: Vec<TokenRecord>,
}

/// JSON-file-backed token registry. The whole registry is small enough to
/// snapshot on every mutation; reads are served from memory. An ephemeral
/// variant keeps everything in memory for tests and one-shot CLI runs.
pub struct FileTokenStore {
    path: Option<PathBuf>,
    inner: RwLock<RegistrySnapshot>,
}

impl FileTokenStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let snapshot = if path.exists() {
            let data = fs::read_to_string(path)
                .map_err(|e| StoreError::Persistence(format!("{}: {e}", path.display())))?;
            serde_json::from_str(&data)
                .map_err(|e| StoreError::Persistence(format!("{}: {e}", path.display())))?
        } else {
            RegistrySnapshot {
                next_id: 1,
                tokens: Vec::new(),
            }
        };
        info!(path = %path.display(), tokens = snapshot.tokens.len(), "opened token registry");
        Ok(Self {
            path: Some(path.to_path_buf()),
            inner: RwLock::new(snapshot),
        })
    }

    pub fn ephemeral() -> Self {
        Self {
            path: None,
            inner: RwLock::new(RegistrySnapshot {
                next_id: 1,
                tokens: Vec::new(),
            }),
        }
    }

    fn persist(&self, snapshot: &RegistrySnapshot) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| StoreError::Persistence(format!("{}: {e}", parent.display())))?;
        }
        let data = serde_json::to_string_pretty(snapshot)
            .map_err(|e| StoreError::Persistence(e.to_string()))?;
        fs::write(path, data)
            .map_err(|e| StoreError::Persistence(format!("{}: {e}", path.display())))
    }
}

impl TokenStore for FileTokenStore {
    fn insert(&self, token: NewToken) -> Result<TokenRecord, StoreError> {
        let token = validate_new_token(token)?;
        let mut snapshot = self
            .inner
            .write()
            .map_err(|_| StoreError::Persistence("registry lock poisoned".to_string()))?;

        if snapshot.tokens.iter().any(|t| t.name == token.name) {
            return Err(StoreError::DuplicateName(token.name));
        }
        if snapshot.tokens.iter().any(|t| t.address == token.address) {
            return Err(StoreError::DuplicateAddress(token.address));
        }

        let record = TokenRecord {
            id: snapshot.next_id,
            name: token.name,
            address: token.address,
            abi: token.abi,
        };
        snapshot.next_id += 1;
        snapshot.tokens.push(record.clone());
        self.persist(&snapshot)?;
        Ok(record)
    }

    fn get(&self, id: u64) -> Result<Option<TokenRecord>, StoreError> {
        let snapshot = self
            .inner
            .read()
            .map_err(|_| StoreError::Persistence("registry lock poisoned".to_string()))?;
        Ok(snapshot.tokens.iter().find(|t| t.id == id).cloned())
    }

    fn find_by_name(&self, name: &str) -> Result<Option<TokenRecord>, StoreError> {
        let snapshot = self
            .inner
            .read()
            .map_err(|_| StoreError::Persistence("registry lock poisoned".to_string()))?;
        Ok(snapshot.tokens.iter().find(|t| t.name == name).cloned())
    }

    fn list(&self) -> Result<Vec<TokenRecord>, StoreError> {
        let snapshot = self
            .inner
            .read()
            .map_err(|_| StoreError::Persistence("registry lock poisoned".to_string()))?;
        Ok(snapshot.tokens.clone())
    }

    fn delete(&self, id: u64) -> Result<bool, StoreError> {
        let mut snapshot = self
            .inner
            .write()
            .map_err(|_| StoreError::Persistence("registry lock poisoned".to_string()))?;
        let before = snapshot.tokens.len();
        snapshot.tokens.retain(|t| t.id != id);
        let removed = snapshot.tokens.len() != before;
        if removed {
            self.persist(&snapshot)?;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::FileTokenStore;
    use crate::tokens::{NewToken, StoreError, TokenStore};

    const MINIMAL_ABI: &str = r#"[{"type": "function", "name": "totalSupply",
        "stateMutability": "view", "inputs": [], "outputs": [{"type": "uint256"}]}]"#;

    fn quest_token() -> NewToken {
        NewToken {
            name: "Quest".to_string(),
            address: "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48".to_string(),
            abi: MINIMAL_ABI.to_string(),
        }
    }

    #[test]
    fn insert_assigns_sequential_ids() {
        let store = FileTokenStore::ephemeral();
        let first = store.insert(quest_token()).expect("insert failed");
        assert_eq!(first.id, 1);

        let second = store
            .insert(NewToken {
                name: "Other".to_string(),
                address: "0xdAC17F958D2ee523a2206206994597C13D831ec7".to_string(),
                abi: MINIMAL_ABI.to_string(),
            })
            .expect("insert failed");
        assert_eq!(second.id, 2);
        assert_eq!(store.list().unwrap().len(), 2);
    }

    #[test]
    fn enforces_unique_name_and_address() {
        let store = FileTokenStore::ephemeral();
        store.insert(quest_token()).expect("insert failed");

        let mut same_name = quest_token();
        same_name.address = "0xdAC17F958D2ee523a2206206994597C13D831ec7".to_string();
        assert!(matches!(
            store.insert(same_name),
            Err(StoreError::DuplicateName(_))
        ));

        let mut same_address = quest_token();
        same_address.name = "Different".to_string();
        assert!(matches!(
            store.insert(same_address),
            Err(StoreError::DuplicateAddress(_))
        ));
    }

    #[test]
    fn lookup_by_id_and_name() {
        let store = FileTokenStore::ephemeral();
        let record = store.insert(quest_token()).expect("insert failed");
        assert_eq!(store.get(record.id).unwrap().as_ref(), Some(&record));
        assert_eq!(store.find_by_name("Quest").unwrap().as_ref(), Some(&record));
        assert!(store.get(99).unwrap().is_none());
    }

    #[test]
    fn delete_removes_exactly_one_record() {
        let store = FileTokenStore::ephemeral();
        let record = store.insert(quest_token()).expect("insert failed");
        assert!(store.delete(record.id).expect("delete failed"));
        assert!(!store.delete(record.id).expect("delete failed"));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn registry_round_trips_through_disk() {
        let dir = tempfile::tempdir().expect("tempdir failed");
        let path = dir.path().join("tokens.json");
        {
            let store = FileTokenStore::open(&path).expect("open failed");
            store.insert(quest_token()).expect("insert failed");
        }
        let reopened = FileTokenStore::open(&path).expect("reopen failed");
        let tokens = reopened.list().expect("list failed");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].name, "Quest");
        // Id sequence continues after reload.
        let next = reopened
            .insert(NewToken {
                name: "Other".to_string(),
                address: "0xdAC17F958D2ee523a2206206994597C13D831ec7".to_string(),
                abi: MINIMAL_ABI.to_string(),
            })
            .expect("insert failed");
        assert_eq!(next.id, 2);
    }
}
