//! Per-request credential resolution. Every request resolves its own
//! account context from query parameters layered over the settings
//! snapshot; nothing is cached between requests.

use ec2gate_common::settings::Settings;
use ec2gate_common::{AccountContext, GateError, Result};

/// Resolves region/key/secret for one request.
///
/// Explicit query parameters always win. When `account` names a
/// configured section, key and secret come from that section only;
/// the default pair never leaks into a named account. The region still
/// falls back to the default, a section usually only overrides
/// credentials.
pub fn resolve(
    settings: &Settings,
    region: Option<&str>,
    account: Option<&str>,
    key: Option<&str>,
    secret: Option<&str>,
) -> Result<AccountContext> {
    let (section, section_prefix) = match account {
        Some(name) => {
            let section = settings
                .accounts
                .get(&name.to_lowercase())
                .ok_or_else(|| GateError::missing(&format!("account '{name}'")))?;
            (Some(section), Some(name.to_uppercase().replace('-', "_")))
        }
        None => (None, None),
    };

    let key = key
        .map(str::to_string)
        .or_else(|| match section {
            Some(s) => s.key.clone(),
            None => settings.aws.key.clone(),
        })
        .ok_or_else(|| match &section_prefix {
            Some(p) => GateError::missing(&format!("{p}_AWS_KEY")),
            None => GateError::missing("AWS_KEY"),
        })?;

    let secret = secret
        .map(str::to_string)
        .or_else(|| match section {
            Some(s) => s.secret.clone(),
            None => settings.aws.secret.clone(),
        })
        .ok_or_else(|| match &section_prefix {
            Some(p) => GateError::missing(&format!("{p}_AWS_SECRET")),
            None => GateError::missing("AWS_SECRET"),
        })?;

    let region = region
        .map(str::to_string)
        .or_else(|| section.and_then(|s| s.region.clone()))
        .or_else(|| settings.aws.region.clone())
        .ok_or_else(|| GateError::missing("AWS_REGION"))?;

    Ok(AccountContext {
        account: account.map(str::to_string),
        region,
        key,
        secret,
    })
}
