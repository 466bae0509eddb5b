use std::fmt::Display;

use anyhow::{bail, Result};

/// Where a configured contract sits in the merge order of the combined ABI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractRole {
    Primary,
    ExternalToken,
    Facet,
}

impl Display for ContractRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContractRole::Primary => write!(f, "diamond"),
            ContractRole::ExternalToken => write!(f, "token"),
            ContractRole::Facet => write!(f, "facet"),
        }
    }
}

/// The fixed set of contracts the explorer knows how to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContractName {
    Diamond,
    MockUsdc,
    AccessControlFacet,
    ProjectFacet,
    CrowdfundingFacet,
    TaskMarketFacet,
    ProjectTokenFacet,
    DiamondCutFacet,
}

impl ContractName {
    /// Every configured contract, in merge priority order: the Diamond
    /// itself, then external tokens, then facets.
    pub const ALL: [ContractName; 8] = [
        ContractName::Diamond,
        ContractName::MockUsdc,
        ContractName::AccessControlFacet,
        ContractName::ProjectFacet,
        ContractName::CrowdfundingFacet,
        ContractName::TaskMarketFacet,
        ContractName::ProjectTokenFacet,
        ContractName::DiamondCutFacet,
    ];

    /// Name of the deployment artifact for this contract.
    pub fn artifact_name(&self) -> &'static str {
        match self {
            ContractName::Diamond => "Diamond",
            ContractName::MockUsdc => "MockUSDC",
            ContractName::AccessControlFacet => "AccessControlFacet",
            ContractName::ProjectFacet => "ProjectFacet",
            ContractName::CrowdfundingFacet => "CrowdfundingFacet",
            ContractName::TaskMarketFacet => "TaskMarketFacet",
            ContractName::ProjectTokenFacet => "ProjectTokenFacet",
            ContractName::DiamondCutFacet => "DiamondCutFacet",
        }
    }

    pub fn role(&self) -> ContractRole {
        match self {
            ContractName::Diamond => ContractRole::Primary,
            ContractName::MockUsdc => ContractRole::ExternalToken,
            _ => ContractRole::Facet,
        }
    }

    pub fn is_primary(&self) -> bool {
        self.role() == ContractRole::Primary
    }
}

impl Display for ContractName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.artifact_name())
    }
}

impl TryFrom<&str> for ContractName {
    type Error = anyhow::Error;

    fn try_from(s: &str) -> Result<Self> {
        match ContractName::ALL
            .iter()
            .find(|name| name.artifact_name().eq_ignore_ascii_case(s))
        {
            Some(name) => Ok(*name),
            None => bail!("unknown contract {}", s),
        }
    }
}
