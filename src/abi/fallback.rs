use alloy::json_abi::Function;

use super::AbiEntry;

// Minimal ABI used when the Diamond artifact carries no ABI at all: enough
// for ownership and loupe introspection. `owner()` appears twice on purpose,
// the second copy is dropped by deduplication.
const FALLBACK_SIGNATURES: [&str; 9] = [
    "function owner() view returns (address)",
    "function facetAddresses() view returns (address[])",
    "function facets() view returns ((address,bytes4[])[])",
    "function facetFunctionSelectors(address _facet) view returns (bytes4[])",
    "function facetAddress(bytes4 _functionSelector) view returns (address)",
    "function owner() view returns (address)",
    "function transferOwnership(address _newOwner)",
    "function hasRole(bytes32 role, address account) view returns (bool)",
    "function getRoleAdmin(bytes32 role) view returns (bytes32)",
];

pub fn fallback_entries() -> Vec<AbiEntry> {
    FALLBACK_SIGNATURES
        .iter()
        .filter_map(|signature| match Function::parse(signature) {
            Ok(function) => Some(AbiEntry::Function(function)),
            Err(e) => {
                tracing::error!(signature, error = %e, "invalid fallback signature");
                None
            }
        })
        .collect()
}
