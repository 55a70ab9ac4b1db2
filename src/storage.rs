//! Durable key-value slot.
//!
//! The storefront persists a handful of small JSON documents (the cart, and
//! the in-flight payment snapshot) under fixed keys. The slot must survive
//! page navigation and reload, but it is a whole-document store: every write
//! replaces the previous value, last writer wins.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use mockall::automock;
use thiserror::Error;

/// Slot key holding the cart's line array.
pub const CART_KEY: &str = "cart";

/// Slot key holding an in-flight payment's item snapshot.
pub const PAYMENT_ITEMS_KEY: &str = "paypal_checkout_items";

/// Slot key holding an in-flight payment's customer fields.
pub const PAYMENT_CUSTOMER_KEY: &str = "paypal_checkout_customer";

/// Errors raised by slot access.
#[derive(Debug, Error)]
pub enum SlotError {
    /// The underlying store could not be read or written.
    #[error("slot io error: {0}")]
    Io(#[from] io::Error),
}

/// A durable string-valued slot keyed by short fixed names.
#[automock]
pub trait KeyValueSlot: Send + Sync {
    /// Read the value stored under `key`, or `None` if the key is absent.
    ///
    /// # Errors
    ///
    /// Returns a [`SlotError`] if the underlying store cannot be read.
    fn read(&self, key: &str) -> Result<Option<String>, SlotError>;

    /// Replace the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns a [`SlotError`] if the underlying store cannot be written.
    fn write(&self, key: &str, value: &str) -> Result<(), SlotError>;

    /// Remove `key` entirely. Removing an absent key is a no-op.
    ///
    /// # Errors
    ///
    /// Returns a [`SlotError`] if the underlying store cannot be written.
    fn delete(&self, key: &str) -> Result<(), SlotError>;
}

/// File-backed slot storing each key as one JSON document in a directory.
#[derive(Debug, Clone)]
pub struct JsonFileSlot {
    dir: PathBuf,
}

impl JsonFileSlot {
    /// Create a slot rooted at `dir`. The directory is created lazily on the
    /// first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueSlot for JsonFileSlot {
    fn read(&self, key: &str) -> Result<Option<String>, SlotError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(SlotError::Io(error)),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), SlotError> {
        ensure_dir(&self.dir)?;
        fs::write(self.path_for(key), value)?;

        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), SlotError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(SlotError::Io(error)),
        }
    }
}

fn ensure_dir(dir: &Path) -> Result<(), SlotError> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn read_missing_key_returns_none() -> TestResult {
        let dir = tempfile::tempdir()?;
        let slot = JsonFileSlot::new(dir.path());

        assert_eq!(slot.read(CART_KEY)?, None);

        Ok(())
    }

    #[test]
    fn write_then_read_round_trips() -> TestResult {
        let dir = tempfile::tempdir()?;
        let slot = JsonFileSlot::new(dir.path());

        slot.write(CART_KEY, "[]")?;

        assert_eq!(slot.read(CART_KEY)?.as_deref(), Some("[]"));

        Ok(())
    }

    #[test]
    fn write_replaces_previous_value() -> TestResult {
        let dir = tempfile::tempdir()?;
        let slot = JsonFileSlot::new(dir.path());

        slot.write(CART_KEY, "first")?;
        slot.write(CART_KEY, "second")?;

        assert_eq!(slot.read(CART_KEY)?.as_deref(), Some("second"));

        Ok(())
    }

    #[test]
    fn delete_removes_key_and_tolerates_absence() -> TestResult {
        let dir = tempfile::tempdir()?;
        let slot = JsonFileSlot::new(dir.path());

        slot.write(PAYMENT_ITEMS_KEY, "{}")?;
        slot.delete(PAYMENT_ITEMS_KEY)?;

        assert_eq!(slot.read(PAYMENT_ITEMS_KEY)?, None);

        slot.delete(PAYMENT_ITEMS_KEY)?;

        Ok(())
    }

    #[test]
    fn keys_are_stored_independently() -> TestResult {
        let dir = tempfile::tempdir()?;
        let slot = JsonFileSlot::new(dir.path());

        slot.write(PAYMENT_ITEMS_KEY, "items")?;
        slot.write(PAYMENT_CUSTOMER_KEY, "customer")?;
        slot.delete(PAYMENT_ITEMS_KEY)?;

        assert_eq!(slot.read(PAYMENT_CUSTOMER_KEY)?.as_deref(), Some("customer"));

        Ok(())
    }
}
