//! Device key management.

use super::HistoryStore;
use crate::crypto::ChatKey;

/// Load the identity's device key, creating one if needed
///
/// A missing or malformed stored key is replaced by a freshly generated one.
/// If the new key cannot be persisted the failure is logged and the key is
/// still returned, so the current session keeps working.
pub fn ensure_key(history: &HistoryStore) -> ChatKey {
    match history.load_device_key() {
        Ok(Some(exported)) => match ChatKey::import(&exported) {
            Ok(key) => return key,
            Err(e) => {
                tracing::warn!(
                    storage_id = %history.storage_id(),
                    error = %e,
                    "Stored device key is malformed, replacing it"
                );
            }
        },
        Ok(None) => {}
        Err(e) => {
            tracing::warn!(
                storage_id = %history.storage_id(),
                error = %e,
                "Could not read device key"
            );
        }
    }

    let key = ChatKey::generate();
    match history.store_device_key(&key.export()) {
        Ok(()) => tracing::info!(storage_id = %history.storage_id(), "Created device key"),
        Err(e) => tracing::warn!(
            storage_id = %history.storage_id(),
            error = %e,
            "Could not persist device key, using it for this session only"
        ),
    }
    key
}
