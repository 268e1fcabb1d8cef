//! Registry of valid commune (INSEE) codes.
//!
//! The registry is read from a [`ReferenceRows`] provider at most once per
//! cache instance, on the first lookup or an explicit [`CommuneCodeCache::preload`].
//! It is never refreshed afterwards; new reference data needs a new cache.

use crate::domain::ports::ReferenceRows;
use crate::utils::error::{PortageError, Result};
use once_cell::sync::OnceCell;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug)]
struct CommuneRegistry {
    source_id: String,
    /// Normalized entries, in source order.
    codes: Vec<String>,
    /// Every entry plus its part before the first `.`.
    keys: HashSet<String>,
}

impl CommuneRegistry {
    fn build(source: &(impl ReferenceRows + ?Sized)) -> Result<Self> {
        let rows = source.read_rows().map_err(|e| match e {
            PortageError::ReferenceDataUnavailable { .. } => e,
            other => PortageError::ReferenceDataUnavailable {
                source_id: source.source_id().to_string(),
                reason: other.to_string(),
            },
        })?;

        // First row is the header.
        let codes: Vec<String> = rows.iter().skip(1).filter_map(|cell| cell.normalized()).collect();

        let mut keys = HashSet::with_capacity(codes.len() * 2);
        for code in &codes {
            keys.insert(code.clone());
            if let Some((integral, _)) = code.split_once('.') {
                keys.insert(integral.to_string());
            }
        }

        Ok(Self {
            source_id: source.source_id().to_string(),
            codes,
            keys,
        })
    }

    fn contains(&self, normalized_query: &str) -> bool {
        !normalized_query.is_empty() && self.keys.contains(normalized_query)
    }
}

/// Canonical form of a user-supplied code: trimmed, leading zeros removed.
pub fn normalize_query(code: &str) -> &str {
    code.trim().trim_start_matches('0')
}

#[derive(Debug, Default)]
pub struct CommuneCodeCache {
    registry: OnceCell<CommuneRegistry>,
    load_passes: AtomicUsize,
}

impl CommuneCodeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Populates the registry if it is still empty and returns the number of
    /// codes it holds.
    pub fn preload(&self, source: &(impl ReferenceRows + ?Sized)) -> Result<usize> {
        Ok(self.registry(source)?.codes.len())
    }

    /// Looks the code up, surfacing an unreadable reference dataset as
    /// [`PortageError::ReferenceDataUnavailable`].
    pub fn lookup(&self, code: &str, source: &(impl ReferenceRows + ?Sized)) -> Result<bool> {
        let registry = self.registry(source)?;
        if registry.source_id != source.source_id() {
            tracing::warn!(
                "Commune registry was built from '{}', ignoring source '{}'",
                registry.source_id,
                source.source_id()
            );
        }

        let normalized = normalize_query(code);
        let found = registry.contains(normalized);
        if found {
            tracing::debug!("Commune code '{}' found", normalized);
        } else {
            tracing::warn!("Commune code '{}' not found in '{}'", normalized, registry.source_id);
        }
        Ok(found)
    }

    /// Like [`lookup`](Self::lookup), but an unavailable dataset reads as
    /// "not found".
    pub fn is_valid_code(&self, code: &str, source: &(impl ReferenceRows + ?Sized)) -> bool {
        match self.lookup(code, source) {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!("Commune code check failed: {}", e);
                false
            }
        }
    }

    pub fn is_populated(&self) -> bool {
        self.registry.get().is_some()
    }

    pub fn len(&self) -> usize {
        self.registry.get().map(|r| r.codes.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn source_id(&self) -> Option<&str> {
        self.registry.get().map(|r| r.source_id.as_str())
    }

    /// Cached codes in source order; empty until populated.
    pub fn codes(&self) -> &[String] {
        self.registry.get().map(|r| r.codes.as_slice()).unwrap_or(&[])
    }

    /// Number of population attempts made so far, failed ones included.
    pub fn load_passes(&self) -> usize {
        self.load_passes.load(Ordering::SeqCst)
    }

    fn registry(&self, source: &(impl ReferenceRows + ?Sized)) -> Result<&CommuneRegistry> {
        // Concurrent callers block here while a single initializer runs; a
        // failed attempt leaves the cell empty.
        self.registry.get_or_try_init(|| {
            self.load_passes.fetch_add(1, Ordering::SeqCst);
            tracing::info!("Loading commune codes from '{}'", source.source_id());
            let registry = CommuneRegistry::build(source)?;
            tracing::info!(
                "Loaded {} commune codes from '{}'",
                registry.codes.len(),
                registry.source_id
            );
            Ok(registry)
        })
    }
}
