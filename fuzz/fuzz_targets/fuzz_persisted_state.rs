//! Fuzz target: persisted controller snapshot and boot reconciliation
//!
//! Feeds arbitrary bytes as the five persisted parts and verifies:
//! - Decoding never panics, whatever is in flash
//! - Boot reconciliation always completes and follows the live relay
//! - Any part that decoded survives a save / load cycle
//!
//! cargo fuzz run fuzz_persisted_state

#![no_main]

use std::collections::HashMap;

use libfuzzer_sys::fuzz_target;

use coldguard::app::ports::{StorageError, StoragePort};
use coldguard::boot::{self, MAX_OFFLINE_CREDIT_SECS};
use coldguard::config::ControllerConfig;
use coldguard::persist::PersistedState;
use coldguard::state::ControllerState;

// ── In-memory StoragePort for fuzz testing ────────────────────

#[derive(Default)]
struct MemStore {
    data: HashMap<String, Vec<u8>>,
}

impl StoragePort for MemStore {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let v = self
            .data
            .get(&format!("{namespace}::{key}"))
            .ok_or(StorageError::NotFound)?;
        let n = v.len().min(buf.len());
        buf[..n].copy_from_slice(&v[..n]);
        Ok(n)
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.data.insert(format!("{namespace}::{key}"), data.to_vec());
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.data.remove(&format!("{namespace}::{key}"));
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.data.contains_key(&format!("{namespace}::{key}"))
    }
}

// ── Target ────────────────────────────────────────────────────

fuzz_target!(|data: &[u8]| {
    if data.len() < 6 {
        return;
    }
    let live_on = data[0] & 1 != 0;
    let wall = (data[0] & 2 != 0).then(|| 1_700_000_000 + u64::from(data[1]) * 977);

    // Five length-prefixed parts, the last one takes the rest.
    let mut rest = &data[2..];
    let mut parts: [&[u8]; 5] = [&[]; 5];
    for (i, part) in parts.iter_mut().enumerate() {
        if i == 4 {
            *part = rest;
            break;
        }
        let Some((&len, tail)) = rest.split_first() else {
            break;
        };
        let len = usize::from(len % 65).min(tail.len());
        *part = &tail[..len];
        rest = &tail[len..];
    }

    let persisted = PersistedState::from_parts(&parts);

    let cfg = ControllerConfig::default();
    let mut state = ControllerState::new(30);
    let report = boot::reconcile(&mut state, &persisted, live_on, 30, wall, &cfg);
    assert!(state.booted);
    assert_eq!(state.timing.intended(), live_on);
    assert!(report.elapsed_secs <= MAX_OFFLINE_CREDIT_SECS);

    let mut store = MemStore::default();
    if persisted.save(&mut store).is_ok() {
        let reloaded = PersistedState::load(&store);
        assert_eq!(reloaded.relay.is_some(), persisted.relay.is_some());
        assert_eq!(reloaded.stats.is_some(), persisted.stats.is_some());
        assert_eq!(reloaded.tuning.is_some(), persisted.tuning.is_some());
        assert_eq!(reloaded.alarms.is_some(), persisted.alarms.is_some());
        assert_eq!(reloaded.user.is_some(), persisted.user.is_some());
    }
});
