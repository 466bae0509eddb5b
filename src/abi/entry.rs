use alloy::json_abi::{
    AbiItem, Constructor, Error, Event, Fallback, Function, Receive, StateMutability,
};
use anyhow::Result;
use serde_json::Value;

/// One item of a JSON ABI, owned and kept in its original position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AbiEntry {
    Function(Function),
    Event(Event),
    Error(Error),
    Constructor(Constructor),
    Fallback(Fallback),
    Receive(Receive),
}

impl AbiEntry {
    pub fn as_function(&self) -> Option<&Function> {
        match self {
            AbiEntry::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AbiEntry::Function(_) => "function",
            AbiEntry::Event(_) => "event",
            AbiEntry::Error(_) => "error",
            AbiEntry::Constructor(_) => "constructor",
            AbiEntry::Fallback(_) => "fallback",
            AbiEntry::Receive(_) => "receive",
        }
    }

    /// Key used to drop duplicate functions: the name together with the
    /// JSON serialization of the inputs. Only functions have one.
    pub fn dedup_key(&self) -> Option<(String, String)> {
        let function = self.as_function()?;
        let inputs = serde_json::to_string(&function.inputs).unwrap_or_default();
        Some((function.name.clone(), inputs))
    }
}

impl From<AbiItem<'_>> for AbiEntry {
    fn from(item: AbiItem<'_>) -> Self {
        match item {
            AbiItem::Function(f) => AbiEntry::Function(f.into_owned()),
            AbiItem::Event(e) => AbiEntry::Event(e.into_owned()),
            AbiItem::Error(e) => AbiEntry::Error(e.into_owned()),
            AbiItem::Constructor(c) => AbiEntry::Constructor(c.into_owned()),
            AbiItem::Fallback(f) => AbiEntry::Fallback(f.into_owned()),
            AbiItem::Receive(r) => AbiEntry::Receive(r.into_owned()),
        }
    }
}

/// The ABI of one deployed contract, in the order its artifact lists the
/// items. `JsonAbi` groups items by kind and sorts functions by name, so it
/// is only built once the combined list is final.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContractAbi {
    entries: Vec<AbiEntry>,
}

impl ContractAbi {
    pub fn new(entries: Vec<AbiEntry>) -> Self {
        ContractAbi { entries }
    }

    /// Parses a JSON ABI array.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let items: Vec<AbiItem<'static>> = serde_json::from_str(json)?;
        Ok(Self::from_items(items))
    }

    pub fn from_json_value(json: &Value) -> Result<Self> {
        let items: Vec<AbiItem<'static>> = serde_json::from_value(json.clone())?;
        Ok(Self::from_items(items))
    }

    /// Parses human-readable signatures, one item each.
    pub fn parse<'a>(signatures: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        let items = signatures
            .into_iter()
            .map(AbiItem::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_items(items))
    }

    fn from_items(items: Vec<AbiItem<'_>>) -> Self {
        ContractAbi::new(items.into_iter().map(AbiEntry::from).collect())
    }

    pub fn entries(&self) -> &[AbiEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<AbiEntry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.entries.iter().filter_map(AbiEntry::as_function)
    }

    /// First function called `name`.
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions().find(|f| f.name == name)
    }
}

pub fn is_read_only(function: &Function) -> bool {
    matches!(
        function.state_mutability,
        StateMutability::View | StateMutability::Pure
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_key_includes_param_names() {
        let a = AbiEntry::Function(Function::parse("function foo(uint256 id)").unwrap());
        let b = AbiEntry::Function(Function::parse("function foo(uint256 other)").unwrap());
        let c = AbiEntry::Function(Function::parse("function foo(uint256 id) view").unwrap());
        assert_ne!(a.dedup_key(), b.dedup_key());
        assert_eq!(a.dedup_key(), c.dedup_key());
    }

    #[test]
    fn test_only_functions_have_keys() {
        let event = AbiEntry::Event(Event::parse("event Funded(uint256 indexed id)").unwrap());
        assert_eq!(event.dedup_key(), None);
        assert_eq!(event.kind(), "event");
    }

    #[test]
    fn test_contract_abi_keeps_artifact_order() {
        let abi = ContractAbi::from_json_str(
            r#"[
                {"type":"function","name":"owner","inputs":[],"outputs":[{"name":"","type":"address"}],"stateMutability":"view"},
                {"type":"event","name":"Funded","inputs":[{"name":"id","type":"uint256","indexed":true}],"anonymous":false},
                {"type":"function","name":"getProject","inputs":[{"name":"id","type":"uint256"}],"outputs":[],"stateMutability":"view"},
                {"type":"function","name":"contribute","inputs":[{"name":"id","type":"uint256"}],"outputs":[],"stateMutability":"payable"}
            ]"#,
        )
        .unwrap();
        let kinds = abi.entries().iter().map(AbiEntry::kind).collect::<Vec<_>>();
        assert_eq!(kinds, vec!["function", "event", "function", "function"]);
        let names = abi.functions().map(|f| f.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["owner", "getProject", "contribute"]);
        assert!(abi.function("contribute").is_some());
    }

    #[test]
    fn test_contract_abi_parse_signatures() {
        let abi = ContractAbi::parse([
            "function transfer(address to, uint256 amount) returns (bool)",
            "function approve(address spender, uint256 amount) returns (bool)",
        ])
        .unwrap();
        assert_eq!(abi.len(), 2);
        assert_eq!(abi.functions().next().unwrap().name, "transfer");
        assert!(ContractAbi::parse(["function ("]).is_err());
    }

    #[test]
    fn test_read_only() {
        assert!(is_read_only(&Function::parse("function a() view").unwrap()));
        assert!(is_read_only(&Function::parse("function b() pure").unwrap()));
        assert!(!is_read_only(&Function::parse("function c()").unwrap()));
        assert!(!is_read_only(&Function::parse("function d() payable").unwrap()));
    }
}
