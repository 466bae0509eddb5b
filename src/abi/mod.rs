mod classify;
mod combine;
mod entry;
mod fallback;
mod names;

pub use classify::{MethodCategory, MethodIndex, MethodKind};
pub use combine::{dedup, CombinedAbi};
pub use entry::{is_read_only, AbiEntry, ContractAbi};
pub use fallback::fallback_entries;
pub use names::{ContractName, ContractRole};
