//! Local key/value storage: the arc of the ring this peer actually holds.

use crate::identifier::Identifier;
use parking_lot::Mutex;
use std::collections::HashMap;

/// A mapping from identifier to opaque byte value. Insertion order is
/// irrelevant and keys are unique, per the data model; writes simply
/// overwrite whatever was there.
pub struct Storage {
    values: Mutex<HashMap<Identifier, Vec<u8>>>,
}

impl Storage {
    pub fn new() -> Storage {
        Storage {
            values: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: Identifier) -> Option<Vec<u8>> {
        self.values.lock().get(&key).cloned()
    }

    pub fn put(&self, key: Identifier, value: Vec<u8>) {
        self.values.lock().insert(key, value);
    }

    pub fn len(&self) -> usize {
        self.values.lock().len()
    }
}

impl Default for Storage {
    fn default() -> Storage {
        Storage::new()
    }
}
