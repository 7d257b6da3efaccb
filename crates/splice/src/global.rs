//! Process-wide installation of the sealed callback table.
//!
//! Mods register while the process starts up, then install the sealed table
//! once. The engine functions never read this slot themselves; the host glue
//! fetches the table with [`installed`] and passes it in.

use std::sync::{Arc, OnceLock};

use crate::{PackCallbacks, SpliceError};

static CALLBACKS: OnceLock<Arc<PackCallbacks>> = OnceLock::new();

/// Install `callbacks` for the rest of the process.
pub fn install(callbacks: PackCallbacks) -> Result<Arc<PackCallbacks>, SpliceError> {
    let callbacks = Arc::new(callbacks);
    CALLBACKS
        .set(Arc::clone(&callbacks))
        .map_err(|_| SpliceError::AlreadyInstalled)?;
    Ok(callbacks)
}

/// The installed table, if [`install`] has run.
pub fn installed() -> Option<Arc<PackCallbacks>> {
    CALLBACKS.get().cloned()
}
