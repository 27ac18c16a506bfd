// src/infrastructure/preview_registry.rs
//
// Preview Handle Registry
//
// RULES:
// - One handle per acquired image
// - A handle resolves to its bytes only while it is live
// - Revocation is idempotent and happens at the latest on drop
// - Live handle count is observable so leaks show up in tests

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use uuid::Uuid;

const URI_PREFIX: &str = "blob:mirror-pk/";

#[derive(Default)]
struct RegistryInner {
    live: HashMap<Uuid, Arc<[u8]>>,
}

/// Issues display-ready preview handles for in-memory images.
///
/// Cloning the registry shares the same handle table.
#[derive(Clone, Default)]
pub struct PreviewRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a handle for `bytes`.
    pub fn allocate(&self, bytes: Arc<[u8]>) -> PreviewHandle {
        let id = Uuid::new_v4();
        self.inner.lock().unwrap().live.insert(id, bytes);
        log::debug!("Preview handle {} allocated", id);

        PreviewHandle {
            id,
            registry: self.clone(),
            revoked: false,
        }
    }

    /// Resolve a preview URI back to its bytes, if the handle is still live.
    pub fn resolve(&self, uri: &str) -> Option<Arc<[u8]>> {
        let id = uri
            .strip_prefix(URI_PREFIX)
            .and_then(|raw| Uuid::parse_str(raw).ok())?;
        self.inner.lock().unwrap().live.get(&id).cloned()
    }

    /// Number of handles that have not been revoked yet.
    pub fn live_count(&self) -> usize {
        self.inner.lock().unwrap().live.len()
    }

    fn revoke(&self, id: Uuid) {
        if self.inner.lock().unwrap().live.remove(&id).is_some() {
            log::debug!("Preview handle {} revoked", id);
        }
    }
}

impl std::fmt::Debug for PreviewRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewRegistry")
            .field("live", &self.live_count())
            .finish()
    }
}

/// A live preview of an acquired image.
///
/// Not cloneable: exactly one owner releases it.
pub struct PreviewHandle {
    id: Uuid,
    registry: PreviewRegistry,
    revoked: bool,
}

impl PreviewHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// URI a presentation layer can hand back to [`PreviewRegistry::resolve`].
    pub fn uri(&self) -> String {
        format!("{}{}", URI_PREFIX, self.id)
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked
    }

    /// Release the handle. Safe to call more than once.
    pub fn revoke(&mut self) {
        if self.revoked {
            return;
        }
        self.registry.revoke(self.id);
        self.revoked = true;
    }
}

impl std::fmt::Debug for PreviewHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewHandle")
            .field("id", &self.id)
            .field("revoked", &self.revoked)
            .finish()
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.revoke();
    }
}
