use komorebi_core::error::{KomorebiError, Result};
use komorebi_core::storage::KeyValueStore;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Handle;

#[derive(Debug, Clone, PartialEq, Eq)]
enum PendingWrite {
    Set(String),
    Remove,
}

type PendingMap = Arc<Mutex<HashMap<String, PendingWrite>>>;

/// Coalesces writes per key before handing them to the inner store.
///
/// The first write to a key schedules a flush `delay` later; writes that
/// arrive before the flush replace the pending value. Reads see pending
/// values. A pending entry stays visible until its write to the inner store
/// has finished, and inner writes are serialized so an older value never
/// lands after a newer one. Without a tokio runtime (or with a zero delay)
/// writes go straight through.
pub struct DebouncedStore {
    inner: Arc<dyn KeyValueStore>,
    pending: PendingMap,
    write_lock: Arc<Mutex<()>>,
    delay: Duration,
    runtime: Option<Handle>,
}

impl DebouncedStore {
    pub fn new(inner: Arc<dyn KeyValueStore>, delay: Duration) -> Self {
        let runtime = Handle::try_current().ok();
        if runtime.is_none() {
            tracing::debug!("No tokio runtime, debounced store writes through");
        }
        Self {
            inner,
            pending: Arc::new(Mutex::new(HashMap::new())),
            write_lock: Arc::new(Mutex::new(())),
            delay,
            runtime,
        }
    }

    /// Number of keys waiting to be flushed.
    pub fn pending_len(&self) -> usize {
        self.pending.lock().map(|pending| pending.len()).unwrap_or(0)
    }

    /// Writes every pending key now.
    pub fn flush(&self) -> Result<()> {
        let _writing = self
            .write_lock
            .lock()
            .map_err(|_| KomorebiError::storage("Debounced store lock poisoned"))?;
        let snapshot: Vec<(String, PendingWrite)> = self
            .lock_pending()?
            .iter()
            .map(|(key, write)| (key.clone(), write.clone()))
            .collect();

        let mut first_error = None;
        for (key, write) in snapshot {
            if let Err(e) = apply(self.inner.as_ref(), &key, write.clone()) {
                tracing::warn!(key = %key, error = %e, "Failed to flush pending write");
                first_error.get_or_insert(e);
            }
            settle(&self.pending, &key, &write);
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn lock_pending(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, PendingWrite>>> {
        self.pending
            .lock()
            .map_err(|_| KomorebiError::storage("Debounced store lock poisoned"))
    }

    fn schedule(&self, key: &str, write: PendingWrite) -> Result<()> {
        let runtime = match &self.runtime {
            Some(runtime) if !self.delay.is_zero() => runtime,
            _ => return apply(self.inner.as_ref(), key, write),
        };

        let first = self.lock_pending()?.insert(key.to_string(), write).is_none();
        if first {
            let key = key.to_string();
            let pending = Arc::clone(&self.pending);
            let inner = Arc::clone(&self.inner);
            let write_lock = Arc::clone(&self.write_lock);
            let delay = self.delay;
            runtime.spawn(async move {
                loop {
                    tokio::time::sleep(delay).await;
                    if write_pending(&write_lock, &pending, inner.as_ref(), &key) {
                        return;
                    }
                }
            });
        }
        Ok(())
    }
}

/// Writes the pending value for `key`. Returns false when the key was
/// written again during the write and needs another round.
fn write_pending(
    write_lock: &Mutex<()>,
    pending: &PendingMap,
    inner: &dyn KeyValueStore,
    key: &str,
) -> bool {
    let Ok(_writing) = write_lock.lock() else {
        return true;
    };
    let write = match pending.lock() {
        Ok(pending) => pending.get(key).cloned(),
        Err(_) => None,
    };
    let Some(write) = write else {
        return true;
    };
    if let Err(e) = apply(inner, key, write.clone()) {
        tracing::warn!(key = %key, error = %e, "Debounced write failed");
    }
    settle(pending, key, &write)
}

/// Drops `key` from the pending map if it still holds `written`. Returns
/// false when a newer value arrived in the meantime.
fn settle(pending: &PendingMap, key: &str, written: &PendingWrite) -> bool {
    let Ok(mut pending) = pending.lock() else {
        return true;
    };
    match pending.get(key) {
        Some(current) if current != written => false,
        _ => {
            pending.remove(key);
            true
        }
    }
}

fn apply(inner: &dyn KeyValueStore, key: &str, write: PendingWrite) -> Result<()> {
    match write {
        PendingWrite::Set(value) => inner.set(key, value),
        PendingWrite::Remove => inner.remove(key),
    }
}

impl KeyValueStore for DebouncedStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        if let Some(write) = self.lock_pending()?.get(key) {
            return Ok(match write {
                PendingWrite::Set(value) => Some(value.clone()),
                PendingWrite::Remove => None,
            });
        }
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: String) -> Result<()> {
        self.schedule(key, PendingWrite::Set(value))
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.schedule(key, PendingWrite::Remove)
    }
}

impl Drop for DebouncedStore {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            tracing::warn!(error = %e, "Pending writes lost on shutdown");
        }
    }
}
