//! Registration table for every cached service operation.
//!
//! Entity lookups are keyed by id. List queries carry the tags that select
//! them: whole-collection reads use `<type>:list`, attribute-selected reads
//! use `<type>:<attr>:<value>` (added per call by the adapter) so that a
//! write only sweeps the lists its old and new attribute values belong to.

use std::time::Duration;

use crate::cache::{
    CacheConfig, CachePolicy, KeyError, Operation, PolicyRegistry, PolicyRegistryBuilder, Tag,
};
use crate::domain::entities::{CUSTOMER, INSPECTION, SUPPLIER};

const ENTITY_TTL: Duration = Duration::from_secs(300);
const LIST_TTL: Duration = Duration::from_secs(60);
const SELECTED_TTL: Duration = Duration::from_secs(120);
const SEARCH_TTL: Duration = Duration::from_secs(30);

pub const SUPPLIER_FIND_BY_ID: Operation = Operation::new(SUPPLIER, "find_by_id");
pub const SUPPLIER_FIND_ALL: Operation = Operation::new(SUPPLIER, "find_all");
pub const SUPPLIER_SEARCH: Operation = Operation::new(SUPPLIER, "search");
pub const SUPPLIER_GET_BY_STATUS: Operation = Operation::new(SUPPLIER, "get_by_status");
pub const SUPPLIER_FIND_BY_QUALIFICATION: Operation =
    Operation::new(SUPPLIER, "find_by_qualification");

pub const CUSTOMER_FIND_BY_ID: Operation = Operation::new(CUSTOMER, "find_by_id");
pub const CUSTOMER_FIND_ALL: Operation = Operation::new(CUSTOMER, "find_all");
pub const CUSTOMER_GET_BY_STATUS: Operation = Operation::new(CUSTOMER, "get_by_status");

pub const INSPECTION_FIND_BY_ID: Operation = Operation::new(INSPECTION, "find_by_id");
pub const INSPECTION_FIND_ALL: Operation = Operation::new(INSPECTION, "find_all");
pub const INSPECTION_FIND_BY_SUPPLIER: Operation = Operation::new(INSPECTION, "find_by_supplier");
pub const INSPECTION_GET_BY_STATUS: Operation = Operation::new(INSPECTION, "get_by_status");

pub fn register(builder: PolicyRegistryBuilder) -> PolicyRegistryBuilder {
    builder
        .register(SUPPLIER_FIND_BY_ID, CachePolicy::entity(SUPPLIER, ENTITY_TTL))
        .register(
            SUPPLIER_FIND_ALL,
            CachePolicy::query(LIST_TTL).with_default_tag(Tag::list(SUPPLIER)),
        )
        .register(
            SUPPLIER_SEARCH,
            CachePolicy::query(SEARCH_TTL).with_default_tag(Tag::list(SUPPLIER)),
        )
        .register(SUPPLIER_GET_BY_STATUS, CachePolicy::query(SELECTED_TTL))
        .register(SUPPLIER_FIND_BY_QUALIFICATION, CachePolicy::query(SELECTED_TTL))
        .register(CUSTOMER_FIND_BY_ID, CachePolicy::entity(CUSTOMER, ENTITY_TTL))
        .register(
            CUSTOMER_FIND_ALL,
            CachePolicy::query(LIST_TTL).with_default_tag(Tag::list(CUSTOMER)),
        )
        .register(CUSTOMER_GET_BY_STATUS, CachePolicy::query(SELECTED_TTL))
        .register(INSPECTION_FIND_BY_ID, CachePolicy::entity(INSPECTION, ENTITY_TTL))
        .register(
            INSPECTION_FIND_ALL,
            CachePolicy::query(LIST_TTL).with_default_tag(Tag::list(INSPECTION)),
        )
        .register(INSPECTION_FIND_BY_SUPPLIER, CachePolicy::query(SELECTED_TTL))
        .register(INSPECTION_GET_BY_STATUS, CachePolicy::query(SELECTED_TTL))
}

/// Registry for the configured default TTL and overrides.
pub fn registry(config: &CacheConfig) -> Result<PolicyRegistry, KeyError> {
    register(PolicyRegistry::builder().default_ttl(config.default_ttl))
        .ttl_overrides(&config.policy_ttls)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::PolicyScope;

    #[test]
    fn every_operation_is_registered() {
        let registry = registry(&CacheConfig::default()).expect("registry");
        for operation in [
            SUPPLIER_FIND_BY_ID,
            SUPPLIER_FIND_ALL,
            SUPPLIER_SEARCH,
            SUPPLIER_GET_BY_STATUS,
            SUPPLIER_FIND_BY_QUALIFICATION,
            CUSTOMER_FIND_BY_ID,
            CUSTOMER_FIND_ALL,
            CUSTOMER_GET_BY_STATUS,
            INSPECTION_FIND_BY_ID,
            INSPECTION_FIND_ALL,
            INSPECTION_FIND_BY_SUPPLIER,
            INSPECTION_GET_BY_STATUS,
        ] {
            assert!(registry.is_registered(&operation), "{operation} missing");
        }
        assert_eq!(registry.len(), 12);
    }

    #[test]
    fn attribute_selected_lists_do_not_carry_the_list_tag() {
        let registry = registry(&CacheConfig::default()).expect("registry");
        let by_status = registry.policy_for(&SUPPLIER_GET_BY_STATUS);
        assert_eq!(by_status.scope, PolicyScope::Query);
        assert!(by_status.default_tags.is_empty());

        let all = registry.policy_for(&SUPPLIER_FIND_ALL);
        assert_eq!(all.default_tags, vec![Tag::list(SUPPLIER)]);
    }

    #[test]
    fn configured_overrides_replace_table_ttls() {
        let config = CacheConfig::default()
            .with_policy_ttl("supplier.find_by_id", Duration::from_secs(9));
        let registry = registry(&config).expect("registry");
        assert_eq!(
            registry.policy_for(&SUPPLIER_FIND_BY_ID).ttl,
            Duration::from_secs(9)
        );
        assert_eq!(registry.policy_for(&CUSTOMER_FIND_BY_ID).ttl, ENTITY_TTL);
    }
}
