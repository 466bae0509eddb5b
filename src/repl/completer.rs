use rustyline::{
    completion::{FilenameCompleter, Pair},
    Context,
};

use crate::abi::{MethodCategory, MethodIndex};

const COMMANDS: &[&str] = &[
    "methods",
    "categories",
    "facets",
    "call",
    "send",
    "encode",
    "clear",
    "wallet",
    "help",
    "exit",
];

const WALLET_COMMANDS: &[&str] = &["key", "keystore", "disconnect"];

pub(crate) struct MyCompleter {
    filename_completer: FilenameCompleter,
    read_methods: Vec<String>,
    write_methods: Vec<String>,
}

impl MyCompleter {
    pub fn new(index: &MethodIndex) -> Self {
        MyCompleter {
            filename_completer: FilenameCompleter::new(),
            read_methods: index.read_methods().to_vec(),
            write_methods: index.write_methods().to_vec(),
        }
    }

    fn candidates(&self, previous: &[&str]) -> Vec<String> {
        match previous {
            [] => owned(COMMANDS),
            ["call"] => self.read_methods.clone(),
            ["send"] => self.write_methods.clone(),
            ["encode"] => self
                .read_methods
                .iter()
                .chain(self.write_methods.iter())
                .cloned()
                .collect(),
            ["methods", ..] => ["read", "write"]
                .into_iter()
                .map(str::to_string)
                .chain(MethodCategory::ALL.iter().map(|c| c.key().to_string()))
                .collect(),
            ["wallet"] => owned(WALLET_COMMANDS),
            ["call", _, ..] => owned(&["--skip-cache"]),
            ["send", _, ..] => owned(&["--gas-limit", "--value", "--wait"]),
            _ => vec![],
        }
    }
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn is_completing_path(line: &str, pos: usize) -> bool {
    for c in line[..pos].chars().rev() {
        if c == ' ' {
            return false;
        }
        if c == '/' {
            return true;
        }
    }
    false
}

fn get_current_word(line: &str, pos: usize) -> &str {
    let start = line[..pos].rfind(' ').map_or(0, |i| i + 1);
    &line[start..pos]
}

impl rustyline::completion::Completer for MyCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        if is_completing_path(line, pos) {
            return self.filename_completer.complete(line, pos, ctx);
        }

        let current_word = get_current_word(line, pos);
        let previous = line[..pos - current_word.len()]
            .split_whitespace()
            .collect::<Vec<_>>();

        let matches = self
            .candidates(&previous)
            .into_iter()
            .filter(|item| item.starts_with(current_word))
            .map(|item| Pair {
                display: item.clone(),
                replacement: item,
            })
            .collect();
        Ok((pos - current_word.len(), matches))
    }
}

#[cfg(test)]
mod tests {
    use rustyline::{completion::Completer, history::DefaultHistory};

    use super::*;
    use crate::abi::{CombinedAbi, ContractAbi};

    fn completer() -> MyCompleter {
        let abi = ContractAbi::parse([
            "function getProject(uint256 id) view returns (string)",
            "function getTask(uint256 id) view returns (string)",
            "function createProject(string name)",
        ])
        .unwrap();
        let combined = CombinedAbi::from_entries(abi.into_entries());
        MyCompleter::new(&MethodIndex::new(&combined))
    }

    fn complete(line: &str) -> (usize, Vec<String>) {
        let history = DefaultHistory::new();
        let ctx = Context::new(&history);
        let (start, pairs) = completer().complete(line, line.len(), &ctx).unwrap();
        (start, pairs.into_iter().map(|p| p.replacement).collect())
    }

    #[test]
    fn test_complete_command() {
        assert_eq!(complete("ca"), (0, vec!["categories".to_string(), "call".to_string()]));
    }

    #[test]
    fn test_complete_read_method() {
        assert_eq!(
            complete("call get"),
            (5, vec!["getProject".to_string(), "getTask".to_string()])
        );
        assert_eq!(complete("send cr").1, vec!["createProject".to_string()]);
    }

    #[test]
    fn test_complete_flags() {
        assert_eq!(complete("call getProject 4 --s").1, vec!["--skip-cache".to_string()]);
    }
}
