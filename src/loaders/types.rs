use alloy::primitives::Address;
use indexmap::IndexMap;

use crate::abi::{ContractAbi, ContractName};

/// What a deployment registry knows about one contract on one network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployedContract {
    pub address: Address,
    pub abi: ContractAbi,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractDescriptor {
    pub name: ContractName,
    pub address: Address,
    pub abi: ContractAbi,
}

impl ContractDescriptor {
    pub fn new(name: ContractName, deployed: DeployedContract) -> Self {
        ContractDescriptor {
            name,
            address: deployed.address,
            abi: deployed.abi,
        }
    }
}

/// Load state of a configured contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractSlot {
    Pending,
    Unavailable,
    Ready(ContractDescriptor),
}

impl ContractSlot {
    pub fn descriptor(&self) -> Option<&ContractDescriptor> {
        match self {
            ContractSlot::Ready(descriptor) => Some(descriptor),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, ContractSlot::Pending)
    }
}

/// Per-network view of every configured contract. Rebuilt whenever the
/// network changes, never mutated in place by consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registry {
    chain_id: u64,
    slots: IndexMap<ContractName, ContractSlot>,
}

impl Registry {
    /// A registry where nothing has finished loading yet.
    pub fn pending(chain_id: u64) -> Self {
        let slots = ContractName::ALL
            .iter()
            .map(|name| (*name, ContractSlot::Pending))
            .collect();
        Registry { chain_id, slots }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn set(&mut self, name: ContractName, slot: ContractSlot) {
        self.slots.insert(name, slot);
    }

    pub fn with(mut self, name: ContractName, slot: ContractSlot) -> Self {
        self.set(name, slot);
        self
    }

    pub fn slot(&self, name: ContractName) -> Option<&ContractSlot> {
        self.slots.get(&name)
    }

    pub fn descriptor(&self, name: ContractName) -> Option<&ContractDescriptor> {
        self.slot(name).and_then(ContractSlot::descriptor)
    }

    pub fn is_pending(&self, name: ContractName) -> bool {
        self.slot(name).map_or(true, ContractSlot::is_pending)
    }

    pub fn primary(&self) -> Option<&ContractDescriptor> {
        self.descriptor(ContractName::Diamond)
    }

    /// Descriptors that finished loading, in merge priority order.
    pub fn descriptors(&self) -> impl Iterator<Item = &ContractDescriptor> {
        ContractName::ALL
            .iter()
            .filter_map(|name| self.descriptor(*name))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ContractName, &ContractSlot)> {
        self.slots.iter()
    }
}
