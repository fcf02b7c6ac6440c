//! Table-specific attribute path canonicalization.

use ahash::AHashMap;
use std::sync::Arc;

/// Maps a user-facing path to the canonical form used as cache key.
pub trait PathNormalizer: Send + Sync {
    fn normalize(&self, raw: &str) -> String;

    /// Whether attribute names in stored records match regardless of case.
    fn ignores_case(&self) -> bool {
        false
    }
}

/// Leaves paths untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityNormalizer;

impl PathNormalizer for IdentityNormalizer {
    fn normalize(&self, raw: &str) -> String {
        raw.trim().to_string()
    }
}

/// Lower-cases every attribute name. Accessors resolved through it look up
/// stored attributes without regard to case, so `firstName` in a record is
/// reached by the path `firstname`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CaseInsensitiveNormalizer;

impl PathNormalizer for CaseInsensitiveNormalizer {
    fn normalize(&self, raw: &str) -> String {
        raw.trim().to_lowercase()
    }

    fn ignores_case(&self) -> bool {
        true
    }
}

/// Rewrites the leading attribute of a path through an alias table, then
/// hands the result to an inner normalizer.
///
/// With alias `id → __key.id`, `id` becomes `__key.id` and `id.part[0]`
/// becomes `__key.id.part[0]`.
pub struct AliasNormalizer {
    aliases: AHashMap<String, String>,
    inner: Arc<dyn PathNormalizer>,
}

impl AliasNormalizer {
    pub fn new(inner: Arc<dyn PathNormalizer>) -> Self {
        Self {
            aliases: AHashMap::new(),
            inner,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>, target: impl Into<String>) -> Self {
        self.aliases.insert(alias.into(), target.into());
        self
    }
}

impl PathNormalizer for AliasNormalizer {
    fn normalize(&self, raw: &str) -> String {
        let raw = raw.trim();
        let split = raw.find(['.', '[']).unwrap_or(raw.len());
        let (head, tail) = raw.split_at(split);
        match self.aliases.get(head) {
            Some(target) => self.inner.normalize(&format!("{target}{tail}")),
            None => self.inner.normalize(raw),
        }
    }

    fn ignores_case(&self) -> bool {
        self.inner.ignores_case()
    }
}
