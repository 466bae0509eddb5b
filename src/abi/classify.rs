use std::{
    collections::{HashMap, HashSet},
    fmt::Display,
};

use alloy::json_abi::Function;
use anyhow::bail;
use itertools::Itertools;
use lazy_static::lazy_static;

use super::{entry::is_read_only, CombinedAbi};

/// Which panel a method list is requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodKind {
    Read,
    Write,
}

impl MethodKind {
    pub fn of(function: &Function) -> Self {
        if is_read_only(function) {
            MethodKind::Read
        } else {
            MethodKind::Write
        }
    }
}

impl Display for MethodKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MethodKind::Read => write!(f, "read"),
            MethodKind::Write => write!(f, "write"),
        }
    }
}

impl TryFrom<&str> for MethodKind {
    type Error = anyhow::Error;

    fn try_from(s: &str) -> anyhow::Result<Self> {
        match s {
            "read" | "view" => Ok(MethodKind::Read),
            "write" | "send" => Ok(MethodKind::Write),
            _ => bail!("unknown method kind {}", s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodCategory {
    All,
    AccessControl,
    Project,
    Crowdfunding,
    TaskMarket,
    ProjectToken,
}

impl MethodCategory {
    pub const ALL: [MethodCategory; 6] = [
        MethodCategory::All,
        MethodCategory::AccessControl,
        MethodCategory::Project,
        MethodCategory::Crowdfunding,
        MethodCategory::TaskMarket,
        MethodCategory::ProjectToken,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            MethodCategory::All => "all",
            MethodCategory::AccessControl => "accessControl",
            MethodCategory::Project => "project",
            MethodCategory::Crowdfunding => "crowdfunding",
            MethodCategory::TaskMarket => "taskMarket",
            MethodCategory::ProjectToken => "projectToken",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MethodCategory::All => "All methods",
            MethodCategory::AccessControl => "Access control",
            MethodCategory::Project => "Projects",
            MethodCategory::Crowdfunding => "Crowdfunding",
            MethodCategory::TaskMarket => "Task market",
            MethodCategory::ProjectToken => "Project token",
        }
    }

    /// Static allow-list for the category, `None` for `all`.
    pub fn allow_list(&self) -> Option<&'static HashSet<&'static str>> {
        CATEGORY_METHODS.get(self)
    }
}

impl Display for MethodCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl TryFrom<&str> for MethodCategory {
    type Error = anyhow::Error;

    fn try_from(s: &str) -> anyhow::Result<Self> {
        let normalized = s.replace(['-', '_'], "").to_ascii_lowercase();
        match MethodCategory::ALL
            .iter()
            .find(|c| c.key().to_ascii_lowercase() == normalized)
        {
            Some(category) => Ok(*category),
            None => bail!("unknown method category {}", s),
        }
    }
}

const ACCESS_CONTROL_METHODS: &[&str] = &[
    "owner",
    "transferOwnership",
    "hasRole",
    "getRoleAdmin",
    "grantRole",
    "revokeRole",
    "renounceRole",
    "DEFAULT_ADMIN_ROLE",
    "ADMIN_ROLE",
    "PROJECT_CREATOR_ROLE",
    "TASK_MANAGER_ROLE",
];

const PROJECT_METHODS: &[&str] = &[
    "createProject",
    "updateProject",
    "cancelProject",
    "getProject",
    "getProjectCount",
    "getProjectsByCreator",
    "getProjectStatus",
    "getProjectToken",
    "projectExists",
];

const CROWDFUNDING_METHODS: &[&str] = &[
    "contribute",
    "refund",
    "claimFunds",
    "finalizeFunding",
    "getContribution",
    "getContributors",
    "getTotalRaised",
    "getFundingGoal",
    "getFundingDeadline",
    "isFundingSuccessful",
];

const TASK_MARKET_METHODS: &[&str] = &[
    "createTask",
    "applyForTask",
    "assignTask",
    "submitTask",
    "approveTask",
    "cancelTask",
    "getTask",
    "getTaskCount",
    "getProjectTasks",
    "getTaskApplicants",
];

const PROJECT_TOKEN_METHODS: &[&str] = &[
    "name",
    "symbol",
    "decimals",
    "totalSupply",
    "balanceOf",
    "allowance",
    "transfer",
    "approve",
    "transferFrom",
    "mint",
    "claimTokens",
    "getVestingSchedule",
    "releasableAmount",
];

lazy_static! {
    static ref CATEGORY_METHODS: HashMap<MethodCategory, HashSet<&'static str>> = {
        let mut m = HashMap::new();
        let tables = [
            (MethodCategory::AccessControl, ACCESS_CONTROL_METHODS),
            (MethodCategory::Project, PROJECT_METHODS),
            (MethodCategory::Crowdfunding, CROWDFUNDING_METHODS),
            (MethodCategory::TaskMarket, TASK_MARKET_METHODS),
            (MethodCategory::ProjectToken, PROJECT_TOKEN_METHODS),
        ];
        for (category, methods) in tables {
            m.insert(category, methods.iter().copied().collect());
        }
        m
    };
}

/// Read and write method names of a combined ABI, unique and in ABI order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodIndex {
    read: Vec<String>,
    write: Vec<String>,
}

impl MethodIndex {
    pub fn new(abi: &CombinedAbi) -> Self {
        let (read, write) = abi
            .functions()
            .partition::<Vec<_>, _>(|f| MethodKind::of(f) == MethodKind::Read);
        // An overloaded name can land in both panels.
        let names = |functions: Vec<&Function>| {
            functions
                .into_iter()
                .map(|f| f.name.clone())
                .unique()
                .collect::<Vec<_>>()
        };
        MethodIndex {
            read: names(read),
            write: names(write),
        }
    }

    pub fn read_methods(&self) -> &[String] {
        &self.read
    }

    pub fn write_methods(&self) -> &[String] {
        &self.write
    }

    pub fn methods(&self, kind: MethodKind) -> &[String] {
        match kind {
            MethodKind::Read => &self.read,
            MethodKind::Write => &self.write,
        }
    }

    /// Methods of `kind` that belong to `category`. Allow-lists can lag
    /// behind the deployed facets, so an empty intersection yields the full
    /// list instead of an empty panel.
    pub fn for_category(&self, kind: MethodKind, category: MethodCategory) -> Vec<String> {
        let all = self.methods(kind);
        let Some(allowed) = category.allow_list() else {
            return all.to_vec();
        };
        let filtered = all
            .iter()
            .filter(|name| allowed.contains(name.as_str()))
            .cloned()
            .collect::<Vec<_>>();
        if filtered.is_empty() {
            all.to_vec()
        } else {
            filtered
        }
    }
}
