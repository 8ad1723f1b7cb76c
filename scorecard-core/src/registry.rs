//! Ordered collection of checks handed to a run.
//!
//! A registry is a plain value: it is not validated when built, so a run can
//! reject an invalid one before launching anything. Call
//! [`CheckRegistry::validate`] to surface problems early.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::check::Check;
use crate::error::InvalidInput;

#[derive(Clone, Default)]
pub struct CheckRegistry {
    checks: Vec<Arc<dyn Check>>,
}

impl CheckRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`CheckRegistry::push`].
    pub fn with(mut self, check: impl Check + 'static) -> Self {
        self.push(check);
        self
    }

    pub fn push(&mut self, check: impl Check + 'static) {
        self.checks.push(Arc::new(check));
    }

    pub fn push_arc(&mut self, check: Arc<dyn Check>) {
        self.checks.push(check);
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Check>> {
        self.checks.iter()
    }

    /// Names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.checks.iter().map(|c| c.name()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Check>> {
        self.checks.iter().find(|c| c.name() == name)
    }

    /// Non-empty, every name non-empty, names unique.
    pub fn validate(&self) -> Result<(), InvalidInput> {
        if self.checks.is_empty() {
            return Err(InvalidInput::EmptyRegistry);
        }
        let mut seen = HashSet::with_capacity(self.checks.len());
        for check in &self.checks {
            let name = check.name();
            if name.trim().is_empty() {
                return Err(InvalidInput::EmptyCheckName);
            }
            if !seen.insert(name) {
                return Err(InvalidInput::DuplicateCheck {
                    name: name.to_owned(),
                });
            }
        }
        Ok(())
    }

    /// Subset containing `names`, kept in registry order.
    ///
    /// An empty `names` slice returns the full registry.
    pub fn filter<S: AsRef<str>>(&self, names: &[S]) -> Result<Self, InvalidInput> {
        if names.is_empty() {
            return Ok(self.clone());
        }
        for wanted in names {
            let wanted = wanted.as_ref();
            if self.get(wanted).is_none() {
                return Err(InvalidInput::UnknownCheck {
                    name: wanted.to_owned(),
                });
            }
        }
        let checks = self
            .checks
            .iter()
            .filter(|c| names.iter().any(|n| n.as_ref() == c.name()))
            .cloned()
            .collect();
        Ok(Self { checks })
    }
}

impl fmt::Debug for CheckRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl FromIterator<Arc<dyn Check>> for CheckRegistry {
    fn from_iter<I: IntoIterator<Item = Arc<dyn Check>>>(iter: I) -> Self {
        Self {
            checks: iter.into_iter().collect(),
        }
    }
}

impl Extend<Arc<dyn Check>> for CheckRegistry {
    fn extend<I: IntoIterator<Item = Arc<dyn Check>>>(&mut self, iter: I) {
        self.checks.extend(iter);
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
