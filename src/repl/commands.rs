use anyhow::{anyhow, Result};
use itertools::Itertools;
use serde_json::Value;

use super::parsing::{Action, WalletAction};
use crate::{
    abi::{MethodCategory, MethodKind},
    session::Session,
};

pub const HELP: &str = "Commands:
  methods [read|write] [category]   list methods, optionally filtered
  categories                        list method categories
  facets                            show loaded contracts and selector clashes
  call <method> [args...] [--skip-cache]
  send <method> [args...] [--gas-limit N] [--value WEI] [--wait SECS]
  encode <method> [args...]         print calldata without sending
  clear [key]                       drop cached reads
  wallet                            show the connected account
  wallet key [hex]                  connect with a private key
  wallet keystore <path>            connect with an encrypted keystore
  wallet disconnect
  help
  exit";

fn wrapped_list(title: &str, names: &[String]) -> String {
    if names.is_empty() {
        return format!("{}: none", title);
    }
    let options = textwrap::Options::with_termwidth()
        .initial_indent("  ")
        .subsequent_indent("  ");
    format!(
        "{} ({}):\n{}",
        title,
        names.len(),
        textwrap::fill(&names.join(", "), options)
    )
}

fn format_value(value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        other => Ok(serde_json::to_string_pretty(other)?),
    }
}

fn list_methods(
    session: &Session,
    kind: Option<MethodKind>,
    category: Option<MethodCategory>,
) -> String {
    let kinds = match kind {
        Some(kind) => vec![kind],
        None => vec![MethodKind::Read, MethodKind::Write],
    };
    kinds
        .into_iter()
        .map(|kind| {
            let title = match kind {
                MethodKind::Read => "Read methods",
                MethodKind::Write => "Write methods",
            };
            wrapped_list(title, &session.methods(kind, category))
        })
        .join("\n")
}

fn list_categories(session: &Session) -> String {
    MethodCategory::ALL
        .iter()
        .map(|category| {
            format!(
                "  {:<14} {:<16} {} read, {} write",
                category.key(),
                category.label(),
                session.methods(MethodKind::Read, Some(*category)).len(),
                session.methods(MethodKind::Write, Some(*category)).len(),
            )
        })
        .join("\n")
}

fn list_facets(session: &Session) -> String {
    let mut lines = session
        .facets()
        .into_iter()
        .map(|facet| {
            let address = facet
                .address
                .map(|a| a.to_string())
                .unwrap_or("-".to_string());
            format!(
                "  {:<20} {:<8} {:<12} {:<42} {} functions",
                facet.name.to_string(),
                facet.role.to_string(),
                facet.state,
                address,
                facet.functions
            )
        })
        .collect::<Vec<_>>();

    let collisions = session.invoker().abi().selector_collisions();
    if !collisions.is_empty() {
        lines.push("Selector clashes:".to_string());
        for (selector, signatures) in collisions {
            lines.push(format!("  {}: {}", selector, signatures.join(", ")));
        }
    }
    lines.join("\n")
}

fn show_wallet(session: &Session) -> String {
    let network = session.network();
    match session.account() {
        Some(account) => format!("{} on {}", account, network),
        None => format!("No wallet connected, target network is {}", network),
    }
}

/// Runs `action`, returning what should be printed.
pub async fn execute(session: &mut Session, action: Action) -> Result<Option<String>> {
    let output = match action {
        Action::Help => HELP.to_string(),
        Action::Exit => return Ok(None),
        Action::Methods { kind, category } => list_methods(session, kind, category),
        Action::Categories => list_categories(session),
        Action::Facets => list_facets(session),
        Action::Call {
            method,
            args,
            skip_cache,
        } => format_value(&session.call(&method, &args, skip_cache).await?)?,
        Action::Send {
            method,
            args,
            options,
        } => {
            let outcome = session.send(&method, &args, options).await?;
            match outcome.receipt {
                Some(receipt) => receipt.to_string(),
                None => outcome.tx_hash.to_string(),
            }
        }
        Action::Encode { method, args } => session.encode(&method, &args)?.to_string(),
        Action::Clear { key } => {
            session.clear_cache(key.as_deref());
            match key {
                Some(key) => format!("Cleared {}", key),
                None => "Cleared all cached reads".to_string(),
            }
        }
        Action::Wallet(WalletAction::Show) => show_wallet(session),
        Action::Wallet(WalletAction::Key(key)) => {
            let key = match key {
                Some(key) => key,
                None => rpassword::prompt_password("Enter private key: ")?,
            };
            let address = session.connect_private_key(&key)?;
            format!("Connected {}", address)
        }
        Action::Wallet(WalletAction::Keystore(path)) => {
            let password = rpassword::prompt_password("Enter keystore password: ")?;
            let address = session
                .connect_keystore(&path, &password)
                .map_err(|e| anyhow!("could not unlock {}: {:#}", path.display(), e))?;
            format!("Connected {}", address)
        }
        Action::Wallet(WalletAction::Disconnect) => {
            session.disconnect_wallet();
            "Wallet disconnected".to_string()
        }
    };
    Ok(Some(output))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_wrapped_list() {
        let names = vec!["owner".to_string(), "getProject".to_string()];
        assert_eq!(
            wrapped_list("Read methods", &names),
            "Read methods (2):\n  owner, getProject"
        );
        assert_eq!(wrapped_list("Write methods", &[]), "Write methods: none");
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(&json!("Pulse")).unwrap(), "Pulse");
        assert_eq!(format_value(&json!(["1", true])).unwrap(), "[\n  \"1\",\n  true\n]");
    }
}
