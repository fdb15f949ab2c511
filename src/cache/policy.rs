//! Per-operation cache policies.
//!
//! Every cached operation is registered once at startup with its TTL, its
//! scope and any tags that every entry it writes must carry. The registry is
//! immutable after `build`.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use tracing::{debug, warn};

use super::keys::{KeyError, validate_segment};
use super::tags::Tag;

/// A cached method, addressed as `<service>.<method>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Operation {
    pub service: &'static str,
    pub method: &'static str,
}

impl Operation {
    pub const fn new(service: &'static str, method: &'static str) -> Self {
        Self { service, method }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.service, self.method)
    }
}

/// How an operation's results are keyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyScope {
    /// Keyed by the id argument; implicitly tagged `entity:<type>:<id>`.
    Entity { entity_type: &'static str },
    /// Keyed by method and canonical arguments; tagged by the caller.
    Query,
}

impl PolicyScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Entity { .. } => "entity",
            Self::Query => "query",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePolicy {
    pub ttl: Duration,
    pub scope: PolicyScope,
    /// Attached to every entry written under this policy.
    pub default_tags: Vec<Tag>,
}

impl CachePolicy {
    pub fn entity(entity_type: &'static str, ttl: Duration) -> Self {
        Self {
            ttl,
            scope: PolicyScope::Entity { entity_type },
            default_tags: Vec::new(),
        }
    }

    pub fn query(ttl: Duration) -> Self {
        Self {
            ttl,
            scope: PolicyScope::Query,
            default_tags: Vec::new(),
        }
    }

    pub fn with_default_tag(mut self, tag: Tag) -> Self {
        self.default_tags.push(tag);
        self
    }
}

/// Operation → policy lookup with a conservative fallback.
#[derive(Debug, Clone)]
pub struct PolicyRegistry {
    policies: HashMap<Operation, CachePolicy>,
    fallback: CachePolicy,
}

impl PolicyRegistry {
    pub fn builder() -> PolicyRegistryBuilder {
        PolicyRegistryBuilder::default()
    }

    /// Policy for `operation`. Unregistered operations get a query-scoped
    /// policy with the default TTL.
    pub fn policy_for(&self, operation: &Operation) -> &CachePolicy {
        self.policies.get(operation).unwrap_or(&self.fallback)
    }

    pub fn is_registered(&self, operation: &Operation) -> bool {
        self.policies.contains_key(operation)
    }

    pub fn fallback(&self) -> &CachePolicy {
        &self.fallback
    }

    /// Registered policies ordered by operation.
    pub fn policies(&self) -> Vec<(Operation, &CachePolicy)> {
        let mut entries: Vec<_> = self
            .policies
            .iter()
            .map(|(operation, policy)| (*operation, policy))
            .collect();
        entries.sort_by_key(|(operation, _)| *operation);
        entries
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

pub struct PolicyRegistryBuilder {
    default_ttl: Duration,
    policies: HashMap<Operation, CachePolicy>,
    ttl_overrides: HashMap<String, Duration>,
}

impl Default for PolicyRegistryBuilder {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(60),
            policies: HashMap::new(),
            ttl_overrides: HashMap::new(),
        }
    }
}

impl PolicyRegistryBuilder {
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Register `policy` for `operation`. A later registration replaces an
    /// earlier one.
    pub fn register(mut self, operation: Operation, policy: CachePolicy) -> Self {
        if self.policies.insert(operation, policy).is_some() {
            warn!(operation = %operation, "Cache policy registered twice; keeping the last one");
        }
        self
    }

    /// TTL overrides keyed by `<service>.<method>`.
    pub fn ttl_overrides(mut self, overrides: &HashMap<String, Duration>) -> Self {
        self.ttl_overrides
            .extend(overrides.iter().map(|(name, ttl)| (name.clone(), *ttl)));
        self
    }

    /// Validate every name segment and apply TTL overrides.
    pub fn build(self) -> Result<PolicyRegistry, KeyError> {
        let Self {
            default_ttl,
            mut policies,
            ttl_overrides,
        } = self;

        for (operation, policy) in &policies {
            validate_segment(operation.service)?;
            validate_segment(operation.method)?;
            if let PolicyScope::Entity { entity_type } = policy.scope {
                validate_segment(entity_type)?;
            }
        }

        for (name, ttl) in ttl_overrides {
            match policies
                .iter_mut()
                .find(|(operation, _)| operation.to_string() == name)
            {
                Some((operation, policy)) => {
                    debug!(operation = %operation, ttl_secs = ttl.as_secs(), "Applied cache TTL override");
                    policy.ttl = ttl;
                }
                None => {
                    warn!(operation = %name, "Ignoring cache TTL override for unregistered operation");
                }
            }
        }

        Ok(PolicyRegistry {
            policies,
            fallback: CachePolicy::query(default_ttl),
        })
    }
}
