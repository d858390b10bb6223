//! Fault log and panic capture.
//!
//! Stores up to 4 fault entries in a storage ring buffer under the "fault"
//! namespace.  Tick faults (a control tick returned an error) and panics
//! are recorded with the uptime and a truncated reason, so the cause of
//! an unattended shutdown can be read back after a restart.

use serde::{Deserialize, Serialize};

use crate::app::ports::StoragePort;

const FAULT_RING_SLOTS: usize = 4;
const FAULT_NAMESPACE: &str = "fault";
const FAULT_INDEX_KEY: &str = "fault_idx";
const REASON_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FaultKind {
    /// A control tick failed.
    Tick,
    /// The firmware panicked.
    Panic,
    /// The relay was forced off after repeated tick faults.
    ForcedOff,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultEntry {
    pub uptime_secs: u64,
    pub kind: FaultKind,
    pub reason: heapless::String<REASON_CAPACITY>,
}

impl FaultEntry {
    /// Build an entry, truncating `reason` on a character boundary.
    pub fn new(uptime_secs: u64, kind: FaultKind, reason: &str) -> Self {
        let mut r = heapless::String::new();
        for c in reason.chars() {
            if r.push(c).is_err() {
                break;
            }
        }
        Self {
            uptime_secs,
            kind,
            reason: r,
        }
    }
}

/// Storage-backed ring buffer of fault entries.
#[derive(Debug, Default)]
pub struct FaultLog {
    write_index: usize,
}

impl FaultLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the write index from storage, or default to 0.
    pub fn init(&mut self, storage: &dyn StoragePort) {
        let mut buf = [0u8; 4];
        if let Ok(4) = storage.read(FAULT_NAMESPACE, FAULT_INDEX_KEY, &mut buf) {
            self.write_index = u32::from_le_bytes(buf) as usize % FAULT_RING_SLOTS;
        }
    }

    /// Write an entry to the next ring slot and advance the index.
    pub fn record(&mut self, storage: &mut dyn StoragePort, entry: &FaultEntry) {
        let slot_key = Self::slot_key(self.write_index);
        match postcard::to_allocvec(entry) {
            Ok(bytes) => {
                if let Err(e) = storage.write(FAULT_NAMESPACE, &slot_key, &bytes) {
                    log::warn!("Fault log write failed: {}", e);
                }
            }
            Err(_) => log::warn!("Fault log: entry encoding failed"),
        }

        self.write_index = (self.write_index + 1) % FAULT_RING_SLOTS;
        let idx_bytes = (self.write_index as u32).to_le_bytes();
        let _ = storage.write(FAULT_NAMESPACE, FAULT_INDEX_KEY, &idx_bytes);
    }

    /// Read all stored entries (up to 4), in slot order.
    pub fn read_all(&self, storage: &dyn StoragePort) -> heapless::Vec<FaultEntry, FAULT_RING_SLOTS> {
        let mut entries = heapless::Vec::new();
        for i in 0..FAULT_RING_SLOTS {
            let slot_key = Self::slot_key(i);
            let mut buf = [0u8; 128];
            if let Ok(len) = storage.read(FAULT_NAMESPACE, &slot_key, &mut buf) {
                if let Ok(entry) = postcard::from_bytes::<FaultEntry>(&buf[..len]) {
                    let _ = entries.push(entry);
                }
            }
        }
        entries
    }

    /// Erase all entries and reset the index.
    pub fn clear(&mut self, storage: &mut dyn StoragePort) {
        for i in 0..FAULT_RING_SLOTS {
            let _ = storage.delete(FAULT_NAMESPACE, &Self::slot_key(i));
        }
        let _ = storage.delete(FAULT_NAMESPACE, FAULT_INDEX_KEY);
        self.write_index = 0;
    }

    pub fn count(&self, storage: &dyn StoragePort) -> usize {
        (0..FAULT_RING_SLOTS)
            .filter(|i| storage.exists(FAULT_NAMESPACE, &Self::slot_key(*i)))
            .count()
    }

    fn slot_key(index: usize) -> heapless::String<16> {
        let mut s = heapless::String::new();
        let _ = core::fmt::Write::write_fmt(&mut s, format_args!("f{}", index));
        s
    }
}

// ───────────────────────────────────────────────────────────────
// Panic hook: records a FaultEntry before reset
// ───────────────────────────────────────────────────────────────

/// Install a panic hook that persists the panic reason to the fault log.
///
/// Call once during init, after NVS is ready.
pub fn install_panic_handler() {
    std::panic::set_hook(Box::new(|info| {
        let reason = if let Some(msg) = info.payload().downcast_ref::<&str>() {
            *msg
        } else if let Some(msg) = info.payload().downcast_ref::<String>() {
            msg.as_str()
        } else {
            "unknown panic"
        };

        log::error!("PANIC: {}", reason);

        #[cfg(target_os = "espidf")]
        {
            // SAFETY: esp_timer_get_time is a plain counter read, safe from
            // panic context.
            let uptime = (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64 / 1_000_000;
            let entry = FaultEntry::new(uptime, FaultKind::Panic, reason);

            // NVS was initialised in main(); if it was not, the write fails
            // and the entry is lost.
            match crate::adapters::nvs::NvsAdapter::new() {
                Ok(mut nvs) => {
                    let mut log = FaultLog::new();
                    log.init(&nvs);
                    log.record(&mut nvs, &entry);
                }
                Err(_) => {
                    log::error!("Panic handler: NVS unavailable, fault entry not persisted");
                }
            }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            log::error!("Fault entry (simulation): {}", reason);
        }
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ports::StorageError;
    use std::cell::RefCell;
    use std::collections::HashMap;

    struct MockStorage {
        data: RefCell<HashMap<String, Vec<u8>>>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                data: RefCell::new(HashMap::new()),
            }
        }
    }

    impl StoragePort for MockStorage {
        fn read(&self, ns: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
            let k = format!("{ns}::{key}");
            match self.data.borrow().get(&k) {
                Some(v) => {
                    let len = v.len().min(buf.len());
                    buf[..len].copy_from_slice(&v[..len]);
                    Ok(len)
                }
                None => Err(StorageError::NotFound),
            }
        }

        fn write(&mut self, ns: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
            self.data.borrow_mut().insert(format!("{ns}::{key}"), data.to_vec());
            Ok(())
        }

        fn delete(&mut self, ns: &str, key: &str) -> Result<(), StorageError> {
            self.data.borrow_mut().remove(&format!("{ns}::{key}"));
            Ok(())
        }

        fn exists(&self, ns: &str, key: &str) -> bool {
            self.data.borrow().contains_key(&format!("{ns}::{key}"))
        }
    }

    #[test]
    fn write_and_read_single_entry() {
        let mut nvs = MockStorage::new();
        let mut log = FaultLog::new();
        log.record(&mut nvs, &FaultEntry::new(42, FaultKind::Tick, "clock went backwards"));
        let entries = log.read_all(&nvs);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].uptime_secs, 42);
        assert_eq!(entries[0].kind, FaultKind::Tick);
        assert_eq!(entries[0].reason.as_str(), "clock went backwards");
    }

    #[test]
    fn ring_wraps_and_index_survives_restart() {
        let mut nvs = MockStorage::new();
        let mut log = FaultLog::new();
        for i in 0..6u64 {
            log.record(&mut nvs, &FaultEntry::new(i, FaultKind::Tick, "x"));
        }
        assert_eq!(log.read_all(&nvs).len(), FAULT_RING_SLOTS);

        let mut reopened = FaultLog::new();
        reopened.init(&nvs);
        assert_eq!(reopened.write_index, 2);
    }

    #[test]
    fn clear_erases_all() {
        let mut nvs = MockStorage::new();
        let mut log = FaultLog::new();
        log.record(&mut nvs, &FaultEntry::new(1, FaultKind::Panic, "a"));
        log.record(&mut nvs, &FaultEntry::new(2, FaultKind::ForcedOff, "b"));
        assert_eq!(log.count(&nvs), 2);
        log.clear(&mut nvs);
        assert_eq!(log.count(&nvs), 0);
        assert_eq!(log.write_index, 0);
    }

    #[test]
    fn long_reason_is_truncated_on_char_boundary() {
        let long = "é".repeat(100);
        let entry = FaultEntry::new(0, FaultKind::Tick, &long);
        assert!(entry.reason.len() <= REASON_CAPACITY);
        assert!(entry.reason.chars().all(|c| c == 'é'));
    }
}
