use std::{path::PathBuf, time::Duration};

use alloy::primitives::U256;
use anyhow::{anyhow, bail, Result};

use super::cli::Command;
use crate::{
    abi::{MethodCategory, MethodKind},
    session::SendOptions,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletAction {
    Show,
    /// Prompts for the key when none is given.
    Key(Option<String>),
    Keystore(PathBuf),
    Disconnect,
}

/// A shell command or one-shot subcommand, parsed and ready to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Help,
    Methods {
        kind: Option<MethodKind>,
        category: Option<MethodCategory>,
    },
    Categories,
    Facets,
    Call {
        method: String,
        args: Vec<String>,
        skip_cache: bool,
    },
    Send {
        method: String,
        args: Vec<String>,
        options: SendOptions,
    },
    Encode {
        method: String,
        args: Vec<String>,
    },
    Clear {
        key: Option<String>,
    },
    Wallet(WalletAction),
    Exit,
}

/// Splits on whitespace outside of quotes and brackets. Quotes are only
/// stripped at the top level so array arguments keep their string items.
pub fn split_line(line: &str) -> Result<Vec<String>> {
    let mut tokens = vec![];
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut depth = 0usize;
    let mut in_token = false;

    for c in line.chars() {
        match quote {
            Some(q) if c == q => {
                quote = None;
                if depth > 0 {
                    current.push(c);
                }
            }
            Some(_) => current.push(c),
            None => match c {
                '"' | '\'' => {
                    quote = Some(c);
                    in_token = true;
                    if depth > 0 {
                        current.push(c);
                    }
                }
                '[' | '(' => {
                    depth += 1;
                    in_token = true;
                    current.push(c);
                }
                ']' | ')' => {
                    depth = depth
                        .checked_sub(1)
                        .ok_or(anyhow!("unbalanced {} in {}", c, line))?;
                    current.push(c);
                }
                c if c.is_whitespace() && depth == 0 => {
                    if in_token {
                        tokens.push(std::mem::take(&mut current));
                        in_token = false;
                    }
                }
                c => {
                    in_token = true;
                    current.push(c);
                }
            },
        }
    }

    if let Some(q) = quote {
        bail!("unterminated {} in {}", q, line);
    }
    if depth > 0 {
        bail!("unclosed bracket in {}", line);
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

fn take_method(command: &str, tokens: &mut Vec<String>) -> Result<String> {
    if tokens.is_empty() {
        bail!("usage: {} <method> [args...]", command);
    }
    Ok(tokens.remove(0))
}

/// Removes `--flag` from `tokens`, returning whether it was present.
fn take_switch(tokens: &mut Vec<String>, flag: &str) -> bool {
    let before = tokens.len();
    tokens.retain(|t| t != flag);
    tokens.len() != before
}

/// Removes `--flag VALUE` from `tokens`, returning the value.
fn take_option(tokens: &mut Vec<String>, flag: &str) -> Result<Option<String>> {
    let Some(index) = tokens.iter().position(|t| t == flag) else {
        return Ok(None);
    };
    if index + 1 >= tokens.len() {
        bail!("{} expects a value", flag);
    }
    let value = tokens.remove(index + 1);
    tokens.remove(index);
    Ok(Some(value))
}

fn parse_send_options(
    gas_limit: Option<u64>,
    value: Option<&str>,
    wait: Option<u64>,
) -> Result<SendOptions> {
    let value = value
        .map(|v| {
            v.parse::<U256>()
                .map_err(|e| anyhow!("invalid value {}: {}", v, e))
        })
        .transpose()?;
    Ok(SendOptions {
        gas_limit,
        value,
        wait: wait.map(Duration::from_secs),
    })
}

fn parse_methods_filters(tokens: &[String]) -> Result<Action> {
    let mut kind = None;
    let mut category = None;
    for token in tokens {
        if let Ok(k) = MethodKind::try_from(token.as_str()) {
            kind = Some(k);
        } else {
            category = Some(MethodCategory::try_from(token.as_str())?);
        }
    }
    Ok(Action::Methods { kind, category })
}

/// Parses one shell line, `None` for a blank line.
pub fn parse_line(line: &str) -> Result<Option<Action>> {
    let mut tokens = split_line(line)?;
    if tokens.is_empty() {
        return Ok(None);
    }
    let command = tokens.remove(0);
    let action = match command.as_str() {
        "help" | "?" => Action::Help,
        "exit" | "quit" => Action::Exit,
        "methods" => parse_methods_filters(&tokens)?,
        "categories" => Action::Categories,
        "facets" => Action::Facets,
        "clear" => Action::Clear {
            key: tokens.into_iter().next(),
        },
        "call" => {
            let skip_cache = take_switch(&mut tokens, "--skip-cache");
            Action::Call {
                method: take_method("call", &mut tokens)?,
                args: tokens,
                skip_cache,
            }
        }
        "send" => {
            let gas_limit = take_option(&mut tokens, "--gas-limit")?
                .map(|g| g.parse::<u64>())
                .transpose()?;
            let value = take_option(&mut tokens, "--value")?;
            let wait = take_option(&mut tokens, "--wait")?
                .map(|w| w.parse::<u64>())
                .transpose()?;
            Action::Send {
                method: take_method("send", &mut tokens)?,
                args: tokens,
                options: parse_send_options(gas_limit, value.as_deref(), wait)?,
            }
        }
        "encode" => Action::Encode {
            method: take_method("encode", &mut tokens)?,
            args: tokens,
        },
        "wallet" => {
            let mut rest = tokens.into_iter();
            match rest.next().as_deref() {
                None => Action::Wallet(WalletAction::Show),
                Some("key") => Action::Wallet(WalletAction::Key(rest.next())),
                Some("keystore") => {
                    let path = rest.next().ok_or(anyhow!("usage: wallet keystore <path>"))?;
                    Action::Wallet(WalletAction::Keystore(PathBuf::from(path)))
                }
                Some("disconnect") => Action::Wallet(WalletAction::Disconnect),
                Some(other) => bail!("unknown wallet command {}", other),
            }
        }
        other => bail!("unknown command {}, type help for the list", other),
    };
    Ok(Some(action))
}

impl TryFrom<Command> for Action {
    type Error = anyhow::Error;

    fn try_from(command: Command) -> Result<Self> {
        let action = match command {
            Command::Methods { kind, category } => Action::Methods {
                kind: kind.as_deref().map(MethodKind::try_from).transpose()?,
                category: category
                    .as_deref()
                    .map(MethodCategory::try_from)
                    .transpose()?,
            },
            Command::Call {
                method,
                args,
                skip_cache,
            } => Action::Call {
                method,
                args,
                skip_cache,
            },
            Command::Send {
                method,
                args,
                gas_limit,
                value,
                wait,
            } => Action::Send {
                method,
                args,
                options: parse_send_options(gas_limit, value.as_deref(), wait)?,
            },
            Command::Encode { method, args } => Action::Encode { method, args },
            Command::Repl => bail!("repl is not a one-shot command"),
        };
        Ok(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_line() {
        assert_eq!(
            split_line(r#"call createProject "My project" 100"#).unwrap(),
            vec!["call", "createProject", "My project", "100"]
        );
        assert_eq!(
            split_line(r#"send setTags [1, 2] ["a b", "c"]"#).unwrap(),
            vec!["send", "setTags", "[1, 2]", r#"["a b", "c"]"#]
        );
        assert_eq!(split_line("   ").unwrap(), Vec::<String>::new());
        assert_eq!(split_line("call m ''").unwrap(), vec!["call", "m", ""]);
    }

    #[test]
    fn test_split_line_errors() {
        assert!(split_line("call m \"open").is_err());
        assert!(split_line("call m [1, 2").is_err());
        assert!(split_line("call m 1]").is_err());
    }

    #[test]
    fn test_parse_call() {
        assert_eq!(
            parse_line("call getProject 4 --skip-cache").unwrap(),
            Some(Action::Call {
                method: "getProject".to_string(),
                args: vec!["4".to_string()],
                skip_cache: true,
            })
        );
        assert!(parse_line("call").is_err());
    }

    #[test]
    fn test_parse_send() {
        let action = parse_line("send contribute 1 --value 1000 --gas-limit 90000 --wait 30")
            .unwrap()
            .unwrap();
        assert_eq!(
            action,
            Action::Send {
                method: "contribute".to_string(),
                args: vec!["1".to_string()],
                options: SendOptions {
                    gas_limit: Some(90000),
                    value: Some(U256::from(1000)),
                    wait: Some(Duration::from_secs(30)),
                },
            }
        );
        assert!(parse_line("send contribute 1 --gas-limit").is_err());
    }

    #[test]
    fn test_parse_methods() {
        assert_eq!(
            parse_line("methods write task-market").unwrap(),
            Some(Action::Methods {
                kind: Some(MethodKind::Write),
                category: Some(MethodCategory::TaskMarket),
            })
        );
        assert!(parse_line("methods nonsense").is_err());
    }

    #[test]
    fn test_parse_wallet() {
        assert_eq!(
            parse_line("wallet").unwrap(),
            Some(Action::Wallet(WalletAction::Show))
        );
        assert_eq!(
            parse_line("wallet keystore ~/keys/dev.json").unwrap(),
            Some(Action::Wallet(WalletAction::Keystore(PathBuf::from(
                "~/keys/dev.json"
            ))))
        );
        assert!(parse_line("wallet keystore").is_err());
    }

    #[test]
    fn test_unknown_command() {
        assert!(parse_line("deploy Diamond").is_err());
        assert_eq!(parse_line("").unwrap(), None);
    }

    #[test]
    fn test_from_subcommand() {
        let action = Action::try_from(Command::Methods {
            kind: Some("read".to_string()),
            category: None,
        })
        .unwrap();
        assert_eq!(
            action,
            Action::Methods {
                kind: Some(MethodKind::Read),
                category: None
            }
        );
        assert!(Action::try_from(Command::Repl).is_err());
    }
}
