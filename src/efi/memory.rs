// src/efi/memory.rs

//! In-memory boot store
//!
//! Behaves like firmware NVRAM without touching it: assigns the lowest free
//! boot number on add, records every call, and can be told to fail or to
//! rewrite entries behind the caller's back the way some UEFI
//! implementations do after a new entry is written.

use super::entry::{BootEntry, BootNumber, BootSnapshot, DevicePath};
use super::BootStore;
use crate::error::{Error, Result};
use std::cell::Cell;
use std::collections::BTreeMap;
use tracing::debug;

/// Locator prefix used for entries created by the memory store
const MEMORY_DISK_PREFIX: &str = "HD(1,GPT,00000000-0000-0000-0000-000000000000,0x800,0x100000)";

/// Out-of-band change firmware applies after an entry is added
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FirmwareEffect {
    /// Drop an entry
    Remove(BootNumber),
    /// Change an entry's label
    Relabel(BootNumber, String),
    /// Overwrite an entry wholesale
    Replace(BootEntry),
}

/// Boot store backed by a map
#[derive(Debug, Default)]
pub struct MemoryBootStore {
    entries: BTreeMap<BootNumber, BootEntry>,
    current: Option<BootNumber>,
    effects_after_add: Vec<FirmwareEffect>,
    fail_enumerate_after: Option<usize>,
    fail_add: bool,
    fail_remove: bool,
    enumerations: Cell<usize>,
    added: Vec<(String, DevicePath)>,
    removed: Vec<BootNumber>,
}

impl MemoryBootStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a locator the way firmware would report it for `path`
    pub fn locator_for(path: &DevicePath) -> String {
        format!("{}/File({})", MEMORY_DISK_PREFIX, path)
    }

    /// Seed an existing entry
    pub fn with_entry(mut self, entry: BootEntry) -> Self {
        self.entries.insert(entry.boot_number, entry);
        self
    }

    /// Mark which entry the running session booted from
    pub fn with_current(mut self, number: BootNumber) -> Self {
        self.current = Some(number);
        self
    }

    /// Apply `effect` after every successful add
    pub fn with_effect_after_add(mut self, effect: FirmwareEffect) -> Self {
        self.effects_after_add.push(effect);
        self
    }

    /// Let `count` enumerations succeed, then fail all further ones
    pub fn fail_enumerate_after(mut self, count: usize) -> Self {
        self.fail_enumerate_after = Some(count);
        self
    }

    pub fn fail_add(mut self) -> Self {
        self.fail_add = true;
        self
    }

    pub fn fail_remove(mut self) -> Self {
        self.fail_remove = true;
        self
    }

    /// Every successful `add` call, in order
    pub fn added(&self) -> &[(String, DevicePath)] {
        &self.added
    }

    /// Every successful `remove` call, in order
    pub fn removed(&self) -> &[BootNumber] {
        &self.removed
    }

    /// Number of mutations performed
    pub fn mutation_count(&self) -> usize {
        self.added.len() + self.removed.len()
    }

    pub fn enumeration_count(&self) -> usize {
        self.enumerations.get()
    }

    pub fn entry(&self, number: BootNumber) -> Option<&BootEntry> {
        self.entries.get(&number)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn next_free_number(&self) -> Result<BootNumber> {
        (0..=u16::MAX)
            .map(BootNumber)
            .find(|n| !self.entries.contains_key(n))
            .ok_or_else(|| Error::FirmwareWriteError("No free boot number".to_string()))
    }

    fn apply_effects(&mut self) {
        for effect in self.effects_after_add.clone() {
            debug!("Simulating firmware side effect: {:?}", effect);
            match effect {
                FirmwareEffect::Remove(number) => {
                    self.entries.remove(&number);
                }
                FirmwareEffect::Relabel(number, label) => {
                    if let Some(entry) = self.entries.get_mut(&number) {
                        entry.label = label;
                    }
                }
                FirmwareEffect::Replace(entry) => {
                    self.entries.insert(entry.boot_number, entry);
                }
            }
        }
    }
}

impl BootStore for MemoryBootStore {
    fn enumerate(&self) -> Result<BootSnapshot> {
        let seen = self.enumerations.get();
        self.enumerations.set(seen + 1);

        if let Some(limit) = self.fail_enumerate_after
            && seen >= limit
        {
            return Err(Error::FirmwareQueryError(
                "boot variables are not readable".to_string(),
            ));
        }

        Ok(BootSnapshot::new(self.entries.values().cloned(), self.current))
    }

    fn add(&mut self, label: &str, device_path: &DevicePath) -> Result<BootEntry> {
        if self.fail_add {
            return Err(Error::FirmwareWriteError(format!(
                "could not write boot variable for '{}'",
                label
            )));
        }

        let number = self.next_free_number()?;
        let entry = BootEntry::new(number, label, Self::locator_for(device_path)).with_active(true);
        self.entries.insert(number, entry.clone());
        self.added.push((label.to_string(), device_path.clone()));
        debug!("Added {}", entry);

        self.apply_effects();
        Ok(entry)
    }

    fn remove(&mut self, boot_number: BootNumber) -> Result<()> {
        if self.fail_remove {
            return Err(Error::FirmwareWriteError(format!(
                "could not delete {}",
                boot_number.variable_name()
            )));
        }

        if self.entries.remove(&boot_number).is_none() {
            return Err(Error::FirmwareWriteError(format!(
                "{} does not exist",
                boot_number.variable_name()
            )));
        }
        self.removed.push(boot_number);
        Ok(())
    }
}
