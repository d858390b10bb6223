//! Persisted controller snapshot.
//!
//! The snapshot is split into independent postcard blobs under the `ctl`
//! namespace.  Each part loads on its own: a missing or corrupt part
//! falls back to its default and the rest is still restored.
//!
//! | key      | content                                            |
//! |----------|----------------------------------------------------|
//! | `relay`  | believed relay state, last on / off, save time     |
//! | `stats`  | lifetime on / total seconds, cycle count           |
//! | `tuning` | adaptive shift, ghost-run count                    |
//! | `alarms` | fatal latch, escalated latch, freeze lock count    |
//! | `user`   | setpoint, turbo flag                               |
//!
//! Timestamps are wall-clock unix seconds so that they survive a reboot.

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::app::ports::{StorageError, StoragePort};
use crate::control::stats::StatsSnapshot;
use crate::error::Result;

pub const NAMESPACE: &str = "ctl";

pub mod keys {
    pub const RELAY: &str = "relay";
    pub const STATS: &str = "stats";
    pub const TUNING: &str = "tuning";
    pub const ALARMS: &str = "alarms";
    pub const USER: &str = "user";
}

const MAX_PART_SIZE: usize = 64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayRecord {
    pub believed_on: bool,
    pub on_at: Option<u64>,
    pub off_at: Option<u64>,
    pub saved_at: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TuningRecord {
    pub shift_c: f32,
    pub ghost_count: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmRecord {
    pub fatal: u8,
    pub escalated: u8,
    pub freeze_lock_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub setpoint_c: f32,
    pub turbo: bool,
}

/// The whole snapshot.  `None` parts were absent or unreadable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersistedState {
    pub relay: Option<RelayRecord>,
    pub stats: Option<StatsSnapshot>,
    pub tuning: Option<TuningRecord>,
    pub alarms: Option<AlarmRecord>,
    pub user: Option<UserRecord>,
}

impl PersistedState {
    /// Load every part that can be read.  Never fails.
    pub fn load(storage: &dyn StoragePort) -> Self {
        Self {
            relay: load_part(storage, keys::RELAY),
            stats: load_part(storage, keys::STATS),
            tuning: load_part(storage, keys::TUNING),
            alarms: load_part(storage, keys::ALARMS),
            user: load_part(storage, keys::USER),
        }
    }

    /// Write every present part.  Keeps going after a failed part and
    /// reports the first error.
    pub fn save(&self, storage: &mut dyn StoragePort) -> Result<()> {
        let results = [
            save_part(storage, keys::RELAY, self.relay.as_ref()),
            save_part(storage, keys::STATS, self.stats.as_ref()),
            save_part(storage, keys::TUNING, self.tuning.as_ref()),
            save_part(storage, keys::ALARMS, self.alarms.as_ref()),
            save_part(storage, keys::USER, self.user.as_ref()),
        ];
        let mut first_err = None;
        for r in results {
            if let Err(e) = r {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Decode raw part blobs in key order (relay, stats, tuning, alarms,
    /// user).
    pub fn from_parts(parts: &[&[u8]; 5]) -> Self {
        Self {
            relay: decode(parts[0], keys::RELAY),
            stats: decode(parts[1], keys::STATS),
            tuning: decode(parts[2], keys::TUNING),
            alarms: decode(parts[3], keys::ALARMS),
            user: decode(parts[4], keys::USER),
        }
    }
}

fn load_part<T: DeserializeOwned>(storage: &dyn StoragePort, key: &str) -> Option<T> {
    let mut buf = [0u8; MAX_PART_SIZE];
    match storage.read(NAMESPACE, key, &mut buf) {
        Ok(len) => decode(&buf[..len], key),
        Err(StorageError::NotFound) => {
            debug!("Persist: no '{}' part stored", key);
            None
        }
        Err(e) => {
            warn!("Persist: reading '{}' failed ({}), using defaults", key, e);
            None
        }
    }
}

fn decode<T: DeserializeOwned>(bytes: &[u8], key: &str) -> Option<T> {
    match postcard::from_bytes(bytes) {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("Persist: '{}' part corrupt ({} bytes), using defaults", key, bytes.len());
            None
        }
    }
}

fn save_part<T: Serialize>(storage: &mut dyn StoragePort, key: &str, value: Option<&T>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    let bytes = postcard::to_allocvec(value)?;
    storage.write(NAMESPACE, key, &bytes)?;
    Ok(())
}
