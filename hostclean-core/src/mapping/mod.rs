//! Run-scoped registries of original -> obfuscated values.
//!
//! The [`MappingStore`] holds one registry per [`Category`]. Each registry
//! sits behind its own mutex, so a lookup-or-allocate is atomic and the
//! store can be shared between worker threads without two workers handing
//! out different stand-ins for the same original.
//!
//! License: MIT OR APACHE 2.0

pub mod allocators;

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use crate::category::Category;
use crate::errors::CleanerError;
use crate::redaction_match::log_new_mapping_debug;
use allocators::{
    Allocator, HostnameAllocator, Ipv4Allocator, Ipv6Allocator, KeywordAllocator, MacAllocator,
};

type HmacSha256 = Hmac<Sha256>;

// Fixed salt so run seeds are derived from data, never used as raw keys.
const SEED_GENERATION_SALT: &[u8] = b"hostclean-run-seed-generation-v1-salt";

/// Upper bound on rejected candidates before an allocation gives up.
pub const MAX_ALLOCATION_ATTEMPTS: u32 = 256;

/// One remembered substitution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEntry {
    pub original: String,
    pub obfuscated: String,
    pub first_seen_order: usize,
}

/// Derives the IPv6 allocator key for a run from its run id.
pub fn compute_run_seed(run_id: &str) -> Result<Vec<u8>, CleanerError> {
    let mut mac = HmacSha256::new_from_slice(SEED_GENERATION_SALT)
        .map_err(|e| CleanerError::Fatal(format!("Failed to create HMAC: {}", e)))?;
    mac.update(run_id.trim().as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

#[derive(Debug)]
struct Registry {
    category: Category,
    allocator: Box<dyn Allocator>,
    index: HashMap<String, usize>,
    issued: HashSet<String>,
    entries: Vec<MappingEntry>,
}

impl Registry {
    fn new(category: Category, allocator: Box<dyn Allocator>) -> Self {
        Self {
            category,
            allocator,
            index: HashMap::new(),
            issued: HashSet::new(),
            entries: Vec::new(),
        }
    }

    fn get_or_create(&mut self, original: &str) -> Result<String, CleanerError> {
        if let Some(&idx) = self.index.get(original) {
            return Ok(self.entries[idx].obfuscated.clone());
        }

        for attempt in 0..MAX_ALLOCATION_ATTEMPTS {
            let candidate = self.allocator.allocate(original, attempt)?;
            if candidate == original || self.issued.contains(&candidate) {
                continue;
            }
            let order = self.entries.len();
            self.entries.push(MappingEntry {
                original: original.to_string(),
                obfuscated: candidate.clone(),
                first_seen_order: order,
            });
            self.index.insert(original.to_string(), order);
            self.issued.insert(candidate.clone());
            log_new_mapping_debug(self.category, original, &candidate);
            return Ok(candidate);
        }

        Err(CleanerError::AllocationExhausted(self.category, original.to_string()))
    }
}

/// All mapping state of one cleaning run.
#[derive(Debug)]
pub struct MappingStore {
    registries: BTreeMap<Category, Mutex<Registry>>,
}

impl MappingStore {
    /// Creates empty registries for every category.
    ///
    /// `canonical_hostname` lets the hostname allocator map the short host
    /// name onto the label of the FQDN.
    pub fn new(run_seed: &[u8], canonical_hostname: Option<&str>) -> Self {
        let mut registries = BTreeMap::new();
        for category in Category::PRIORITY {
            let allocator: Box<dyn Allocator> = match category {
                Category::Hostname => Box::new(HostnameAllocator::new(canonical_hostname)),
                Category::Ipv4 => Box::new(Ipv4Allocator::default()),
                Category::Ipv6 => Box::new(Ipv6Allocator::new(run_seed)),
                Category::Mac => Box::new(MacAllocator::default()),
                Category::Keyword => Box::new(KeywordAllocator::default()),
            };
            registries.insert(category, Mutex::new(Registry::new(category, allocator)));
        }
        Self { registries }
    }

    fn registry(&self, category: Category) -> Result<std::sync::MutexGuard<'_, Registry>, CleanerError> {
        self.registries
            .get(&category)
            .ok_or_else(|| CleanerError::Fatal(format!("no registry for category {}", category)))?
            .lock()
            .map_err(|_| CleanerError::LockPoisoned(category))
    }

    /// Returns the stand-in for `original`, allocating one on first sight.
    pub fn get_or_create(&self, category: Category, original: &str) -> Result<String, CleanerError> {
        self.registry(category)?.get_or_create(original)
    }

    /// All mappings of a category in first-seen order.
    pub fn export(&self, category: Category) -> Result<Vec<MappingEntry>, CleanerError> {
        Ok(self.registry(category)?.entries.clone())
    }

    /// Number of distinct originals mapped in `category`.
    pub fn len(&self, category: Category) -> Result<usize, CleanerError> {
        Ok(self.registry(category)?.entries.len())
    }

    pub fn is_empty(&self, category: Category) -> Result<bool, CleanerError> {
        Ok(self.len(category)? == 0)
    }
}
