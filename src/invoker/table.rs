use alloy::{
    dyn_abi::{DynSolValue, JsonAbiExt},
    json_abi::Function,
    primitives::Bytes,
};
use indexmap::IndexMap;

use super::{value::coerce_args, InvokeError};
use crate::abi::CombinedAbi;

/// A method name with its already-typed arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractCall {
    pub name: String,
    pub inputs: Vec<DynSolValue>,
}

impl ContractCall {
    pub fn new(name: impl Into<String>, inputs: Vec<DynSolValue>) -> Self {
        ContractCall {
            name: name.into(),
            inputs,
        }
    }
}

/// A call bound to one concrete ABI function, with its calldata.
#[derive(Debug, Clone)]
pub struct ResolvedCall {
    pub function: Function,
    pub calldata: Bytes,
    pub inputs: Vec<DynSolValue>,
}

/// Functions of the combined ABI grouped by name, overloads in ABI order.
#[derive(Debug, Clone, Default)]
pub struct FunctionTable {
    functions: IndexMap<String, Vec<Function>>,
}

impl FunctionTable {
    pub fn new(abi: &CombinedAbi) -> Self {
        let mut functions: IndexMap<String, Vec<Function>> = IndexMap::new();
        for function in abi.functions() {
            functions
                .entry(function.name.clone())
                .or_default()
                .push(function.clone());
        }
        FunctionTable { functions }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn overloads(&self, name: &str) -> &[Function] {
        self.functions.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn lookup(&self, name: &str) -> Result<&[Function], InvokeError> {
        match self.functions.get(name) {
            Some(overloads) if !overloads.is_empty() => Ok(overloads),
            _ => Err(InvokeError::MethodNotFound(name.to_string())),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Binds `call` to the first overload with a matching arity whose
    /// parameter types accept the given values.
    pub fn resolve(&self, call: &ContractCall) -> Result<ResolvedCall, InvokeError> {
        let overloads = self.lookup(&call.name)?;
        let mut last_error = None;
        for function in overloads
            .iter()
            .filter(|f| f.inputs.len() == call.inputs.len())
        {
            match function.abi_encode_input(&call.inputs) {
                Ok(calldata) => {
                    return Ok(ResolvedCall {
                        function: function.clone(),
                        calldata: calldata.into(),
                        inputs: call.inputs.clone(),
                    })
                }
                Err(e) => last_error = Some(e.to_string()),
            }
        }
        Err(InvokeError::invalid_arguments(
            &call.name,
            last_error.unwrap_or(format!(
                "no overload takes {} arguments",
                call.inputs.len()
            )),
        ))
    }

    /// Like [`FunctionTable::resolve`], but coerces textual arguments first.
    pub fn resolve_str(&self, name: &str, raw: &[String]) -> Result<ResolvedCall, InvokeError> {
        let overloads = self.lookup(name)?;
        let mut last_error = None;
        for function in overloads.iter().filter(|f| f.inputs.len() == raw.len()) {
            let resolved = coerce_args(function, raw).and_then(|inputs| {
                function
                    .abi_encode_input(&inputs)
                    .map(|calldata| ResolvedCall {
                        function: function.clone(),
                        calldata: calldata.into(),
                        inputs,
                    })
                    .map_err(|e| InvokeError::invalid_arguments(name, e))
            });
            match resolved {
                Ok(resolved) => return Ok(resolved),
                Err(e) => last_error = Some(e),
            }
        }
        Err(last_error.unwrap_or(InvokeError::invalid_arguments(
            name,
            format!("no overload takes {} arguments", raw.len()),
        )))
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{Address, U256};

    use super::*;
    use crate::abi::ContractAbi;

    fn table() -> FunctionTable {
        let abi = ContractAbi::parse([
            "function getProject(uint256 id) view returns (string)",
            "function mint(address to, uint256 amount)",
            "function mint(uint256 amount)",
            "function owner() view returns (address)",
        ])
        .unwrap();
        FunctionTable::new(&CombinedAbi::from_entries(abi.into_entries()))
    }

    #[test]
    fn test_lookup_unknown_method() {
        let err = table().lookup("withdraw").unwrap_err();
        assert_eq!(err, InvokeError::MethodNotFound("withdraw".to_string()));
    }

    #[test]
    fn test_resolve_by_arity() {
        let table = table();
        assert_eq!(table.overloads("mint").len(), 2);

        let one = table
            .resolve(&ContractCall::new("mint", vec![DynSolValue::Uint(U256::from(5), 256)]))
            .unwrap();
        assert_eq!(one.function.signature(), "mint(uint256)");
        assert_eq!(&one.calldata[..4], one.function.selector().as_slice());

        let two = table
            .resolve(&ContractCall::new(
                "mint",
                vec![
                    DynSolValue::Address(Address::ZERO),
                    DynSolValue::Uint(U256::from(5), 256),
                ],
            ))
            .unwrap();
        assert_eq!(two.function.signature(), "mint(address,uint256)");
        assert_eq!(two.calldata.len(), 4 + 64);
    }

    #[test]
    fn test_resolve_wrong_types() {
        let err = table()
            .resolve(&ContractCall::new(
                "getProject",
                vec![DynSolValue::String("x".to_string())],
            ))
            .unwrap_err();
        assert!(matches!(err, InvokeError::InvalidArguments { .. }));
    }

    #[test]
    fn test_resolve_str() {
        let table = table();
        let resolved = table.resolve_str("getProject", &["4".to_string()]).unwrap();
        assert_eq!(resolved.inputs, vec![DynSolValue::Uint(U256::from(4), 256)]);

        let err = table.resolve_str("owner", &["1".to_string()]).unwrap_err();
        assert!(err.to_string().contains("no overload takes 1 arguments"));
    }

    #[test]
    fn test_names_keep_abi_order() {
        let names = table().names().map(str::to_string).collect::<Vec<_>>();
        assert_eq!(names, vec!["getProject", "mint", "owner"]);
    }
}
