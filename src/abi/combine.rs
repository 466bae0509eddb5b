use std::collections::HashSet;

use alloy::{
    json_abi::{Function, JsonAbi},
    primitives::Selector,
};
use itertools::Itertools;

use super::{fallback::fallback_entries, AbiEntry, ContractName};
use crate::loaders::types::Registry;

/// The Diamond's own interface merged with every facet and token it
/// exposes, as one ordered list with duplicate functions removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CombinedAbi {
    entries: Vec<AbiEntry>,
}

impl CombinedAbi {
    /// Builds the combined ABI from whatever the registry has loaded.
    ///
    /// The Diamond comes first. If it yields no entries and its load has
    /// finished, the built-in fallback ABI takes its place. External tokens
    /// and facets follow in their fixed priority order. Duplicate functions
    /// keep their first occurrence.
    pub fn from_registry(registry: &Registry) -> Self {
        let mut entries = registry
            .primary()
            .map(|d| d.abi.entries().to_vec())
            .unwrap_or_default();

        if entries.is_empty() && !registry.is_pending(ContractName::Diamond) {
            tracing::warn!(
                chain_id = registry.chain_id(),
                "Diamond ABI unavailable, using built-in fallback ABI"
            );
            entries = fallback_entries();
        }

        for descriptor in registry.descriptors().filter(|d| !d.name.is_primary()) {
            entries.extend(descriptor.abi.entries().iter().cloned());
        }

        Self::from_entries(entries)
    }

    pub fn from_entries(entries: Vec<AbiEntry>) -> Self {
        CombinedAbi {
            entries: dedup(entries),
        }
    }

    pub fn entries(&self) -> &[AbiEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.entries.iter().filter_map(AbiEntry::as_function)
    }

    pub fn to_json_abi(&self) -> JsonAbi {
        let mut abi = JsonAbi::default();
        for entry in self.entries.iter().cloned() {
            match entry {
                AbiEntry::Function(f) => abi.functions.entry(f.name.clone()).or_default().push(f),
                AbiEntry::Event(e) => abi.events.entry(e.name.clone()).or_default().push(e),
                AbiEntry::Error(e) => abi.errors.entry(e.name.clone()).or_default().push(e),
                AbiEntry::Constructor(c) => {
                    abi.constructor.get_or_insert(c);
                }
                AbiEntry::Fallback(f) => {
                    abi.fallback.get_or_insert(f);
                }
                AbiEntry::Receive(r) => {
                    abi.receive.get_or_insert(r);
                }
            }
        }
        abi
    }

    /// Selectors claimed by more than one distinct signature. A Diamond
    /// routes each selector to a single facet, so these indicate facets
    /// that cannot both be cut in as-is.
    pub fn selector_collisions(&self) -> Vec<(Selector, Vec<String>)> {
        self.functions()
            .map(|f| (f.selector(), f.signature()))
            .unique()
            .into_group_map()
            .into_iter()
            .filter(|(_, signatures)| signatures.len() > 1)
            .sorted_by_key(|(selector, _)| *selector)
            .collect()
    }
}

/// Drops every function whose `(name, inputs)` key was already seen.
/// Events, errors and the other non-function entries pass through as-is.
pub fn dedup(entries: Vec<AbiEntry>) -> Vec<AbiEntry> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|entry| match entry.dedup_key() {
            Some(key) => seen.insert(key),
            None => true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use alloy::{json_abi::Event, primitives::Address};

    use super::*;
    use crate::abi::ContractAbi;
    use crate::loaders::types::{ContractDescriptor, ContractSlot, DeployedContract};

    fn function(sig: &str) -> AbiEntry {
        AbiEntry::Function(Function::parse(sig).unwrap())
    }

    fn ready(name: ContractName, signatures: &[&str]) -> ContractSlot {
        let abi = ContractAbi::parse(signatures.iter().copied()).unwrap();
        ContractSlot::Ready(ContractDescriptor::new(
            name,
            DeployedContract {
                address: Address::with_last_byte(1),
                abi,
            },
        ))
    }

    fn names(abi: &CombinedAbi) -> Vec<String> {
        abi.functions().map(|f| f.name.clone()).collect()
    }

    #[test]
    fn test_first_occurrence_wins() {
        let first = function("function foo(uint256 a) view returns (uint256)");
        let second = function("function foo(uint256 a) returns (bool)");
        let combined = CombinedAbi::from_entries(vec![first.clone(), second]);
        assert_eq!(combined.entries(), &[first]);
    }

    #[test]
    fn test_overloads_are_kept() {
        let combined = CombinedAbi::from_entries(vec![
            function("function foo(uint256 a)"),
            function("function foo(address a)"),
        ]);
        assert_eq!(combined.len(), 2);
    }

    #[test]
    fn test_events_are_not_deduplicated() {
        let event = AbiEntry::Event(Event::parse("event Funded(uint256 indexed id)").unwrap());
        let combined = CombinedAbi::from_entries(vec![event.clone(), event]);
        assert_eq!(combined.len(), 2);
    }

    #[test]
    fn test_dedup_is_idempotent() {
        let entries = vec![
            function("function a()"),
            function("function b()"),
            function("function a()"),
        ];
        let once = CombinedAbi::from_entries(entries.clone());
        let twice = CombinedAbi::from_entries(once.entries().to_vec());
        assert_eq!(once, twice);
        assert_eq!(once, CombinedAbi::from_entries(entries));
    }

    #[test]
    fn test_registry_merge_order() {
        let registry = Registry::pending(31337)
            .with(
                ContractName::Diamond,
                ready(ContractName::Diamond, &["function owner() view returns (address)"]),
            )
            .with(ContractName::MockUsdc, ready(ContractName::MockUsdc, &["function decimals() view returns (uint8)"]))
            .with(
                ContractName::TaskMarketFacet,
                ready(ContractName::TaskMarketFacet, &["function createTask(uint256 projectId)"]),
            )
            .with(
                ContractName::ProjectFacet,
                ready(ContractName::ProjectFacet, &["function getProject(uint256 id) view returns (uint256)"]),
            );
        let combined = CombinedAbi::from_registry(&registry);
        assert_eq!(
            names(&combined),
            vec!["owner", "decimals", "getProject", "createTask"]
        );
    }

    #[test]
    fn test_fallback_when_diamond_abi_empty() {
        let registry = Registry::pending(31337)
            .with(ContractName::Diamond, ready(ContractName::Diamond, &[]))
            .with(
                ContractName::ProjectFacet,
                ready(ContractName::ProjectFacet, &["function owner() view returns (address)"]),
            );
        let combined = CombinedAbi::from_registry(&registry);
        let names = names(&combined);
        assert_eq!(names.iter().filter(|n| *n == "owner").count(), 1);
        assert!(names.contains(&"facets".to_string()));
        assert!(names.contains(&"getRoleAdmin".to_string()));
    }

    #[test]
    fn test_fallback_when_diamond_unavailable() {
        let registry = Registry::pending(31337).with(ContractName::Diamond, ContractSlot::Unavailable);
        let combined = CombinedAbi::from_registry(&registry);
        assert_eq!(combined.functions().count(), 8);
    }

    #[test]
    fn test_no_fallback_while_pending() {
        let registry = Registry::pending(31337);
        assert!(CombinedAbi::from_registry(&registry).is_empty());
    }

    #[test]
    fn test_get_project_defined_twice() {
        let signature = "function getProject(uint256 id) view returns (uint256)";
        let registry = Registry::pending(31337)
            .with(ContractName::Diamond, ready(ContractName::Diamond, &[signature]))
            .with(ContractName::ProjectFacet, ready(ContractName::ProjectFacet, &[signature]));
        let combined = CombinedAbi::from_registry(&registry);
        assert_eq!(names(&combined), vec!["getProject"]);
    }

    #[test]
    fn test_to_json_abi() {
        let combined = CombinedAbi::from_entries(vec![
            function("function foo(uint256 a)"),
            function("function foo(address a)"),
            AbiEntry::Event(Event::parse("event Funded(uint256 indexed id)").unwrap()),
        ]);
        let abi = combined.to_json_abi();
        assert_eq!(abi.function("foo").map(Vec::len), Some(2));
        assert!(abi.event("Funded").is_some());
    }

    #[test]
    fn test_selector_collisions() {
        // Both hash to 0x42966c68.
        let combined = CombinedAbi::from_entries(vec![
            function("function burn(uint256 amount)"),
            function("function burn(uint256 tokenId)"),
            function("function collate_propagate_storage(bytes16 data)"),
            function("function mint(uint256 amount)"),
        ]);
        let collisions = combined.selector_collisions();
        assert_eq!(collisions.len(), 1);
        let (selector, signatures) = &collisions[0];
        assert_eq!(selector.to_string(), "0x42966c68");
        assert_eq!(signatures.len(), 2);
    }
}
