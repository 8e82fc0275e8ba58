//! Parameter store
//!
//! Named, typed parameters held in a fixed-capacity map. Every write through
//! [`ParameterStore::set`] raises a parameter-update notification (a counter
//! consumers compare against the value they last saw). Modules persisting
//! their own state use [`ParameterStore::commit_no_notification`] so the
//! write does not trigger a reload of that same module.

use super::error::ParameterError;
use bitflags::bitflags;
use heapless::index_map::FnvIndexMap;
use heapless::String;

/// Maximum parameter name length
pub const PARAM_NAME_LEN: usize = 16;

/// Maximum number of parameters (power of two)
pub const MAX_PARAMS: usize = 32;

bitflags! {
    /// Parameter flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ParamFlags: u8 {
        /// Parameter cannot be changed after registration
        const READ_ONLY = 0b00000001;
    }
}

/// Parameter value types
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParamValue {
    /// Boolean parameter
    Bool(bool),
    /// 32-bit signed integer
    Int(i32),
    /// 32-bit floating point
    Float(f32),
}

impl ParamValue {
    /// Type discriminant; writes must keep it
    pub fn type_id(&self) -> u8 {
        match self {
            ParamValue::Bool(_) => 1,
            ParamValue::Int(_) => 2,
            ParamValue::Float(_) => 3,
        }
    }
}

/// Whether a write raises a parameter-update notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Notification {
    /// Consumers reload on their next tick
    Notify,
    /// Silent write; used by a module persisting its own state
    Suppress,
}

struct Entry {
    value: ParamValue,
    flags: ParamFlags,
}

/// Parameter store for configuration management
pub struct ParameterStore {
    entries: FnvIndexMap<String<PARAM_NAME_LEN>, Entry, MAX_PARAMS>,
    /// Incremented on every notifying change
    update_count: u32,
}

impl ParameterStore {
    /// Create a new empty parameter store
    pub fn new() -> Self {
        Self {
            entries: FnvIndexMap::new(),
            update_count: 0,
        }
    }

    /// Register a parameter with its default value and flags
    ///
    /// If the parameter already exists, this is a no-op (idempotent).
    pub fn register(
        &mut self,
        name: &str,
        default_value: ParamValue,
        flags: ParamFlags,
    ) -> Result<(), ParameterError> {
        let key = key(name)?;
        if self.entries.contains_key(&key) {
            return Ok(());
        }

        self.entries
            .insert(
                key,
                Entry {
                    value: default_value,
                    flags,
                },
            )
            .map_err(|_| ParameterError::StoreFull)?;
        Ok(())
    }

    /// Get parameter value
    pub fn get(&self, name: &str) -> Option<ParamValue> {
        let key = key(name).ok()?;
        self.entries.get(&key).map(|entry| entry.value)
    }

    /// Set a parameter and notify consumers
    pub fn set(&mut self, name: &str, value: ParamValue) -> Result<(), ParameterError> {
        self.write(name, value, Notification::Notify)
    }

    /// Set a parameter without notifying consumers
    pub fn commit_no_notification(
        &mut self,
        name: &str,
        value: ParamValue,
    ) -> Result<(), ParameterError> {
        self.write(name, value, Notification::Suppress)
    }

    /// Write a parameter value
    ///
    /// Writing the value already stored is accepted and has no effect.
    pub fn write(
        &mut self,
        name: &str,
        value: ParamValue,
        notification: Notification,
    ) -> Result<(), ParameterError> {
        let key = key(name)?;
        let entry = self
            .entries
            .get_mut(&key)
            .ok_or(ParameterError::UnknownParameter)?;

        if entry.flags.contains(ParamFlags::READ_ONLY) {
            return Err(ParameterError::ReadOnly);
        }
        if entry.value.type_id() != value.type_id() {
            return Err(ParameterError::TypeMismatch);
        }
        if entry.value == value {
            return Ok(());
        }

        entry.value = value;
        if notification == Notification::Notify {
            self.update_count = self.update_count.wrapping_add(1);
        }
        Ok(())
    }

    /// Parameter-update notification counter
    ///
    /// Consumers remember the last value they processed; any difference means
    /// at least one notifying write happened since.
    pub fn update_count(&self) -> u32 {
        self.update_count
    }

    /// Get total parameter count
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new()
    }
}

fn key(name: &str) -> Result<String<PARAM_NAME_LEN>, ParameterError> {
    let mut key = String::new();
    key.push_str(name)
        .map_err(|_| ParameterError::UnknownParameter)?;
    Ok(key)
}
