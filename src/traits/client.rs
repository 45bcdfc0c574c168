use crate::types::{DataBaseInfo, KeyString, NDbKValue, NKey, NKeys, Ttl};

/// Receiver of post-operation notifications.
///
/// A connection holds at most one client and calls it synchronously, only
/// after the operation it reports has succeeded. Every method defaults to a
/// no-op so observers implement just what they care about.
pub trait ConnectionClient: Send {
    fn on_created_db(&mut self, _db: &DataBaseInfo) {}

    fn on_removed_db(&mut self, _db: &DataBaseInfo) {}

    fn on_changed_current_db(&mut self, _db: &DataBaseInfo) {}

    fn on_flushed_current_db(&mut self) {}

    /// Receives only the keys that were actually removed.
    fn on_removed_keys(&mut self, _keys: &NKeys) {}

    fn on_added_key(&mut self, _key: &NDbKValue) {}

    fn on_loaded_key(&mut self, _key: &NDbKValue) {}

    fn on_renamed_key(&mut self, _key: &NKey, _new_key: &KeyString) {}

    fn on_changed_key_ttl(&mut self, _key: &NKey, _ttl: Ttl) {}

    fn on_loaded_key_ttl(&mut self, _key: &NKey, _ttl: Ttl) {}

    fn on_quited(&mut self) {}
}
