//! Instance URL with optional password authentication

use super::{AuthMaterial, DerivationError, Endpoint, require, validate_url};
use crate::config::{ConfigSnapshot, CredentialStore, vars};

pub(super) fn derive(
    snapshot: &ConfigSnapshot,
    with_auth: bool,
) -> Result<Endpoint, DerivationError> {
    let instance_url = require(snapshot.instance_url.as_deref(), vars::INSTANCE_URL)?;

    if !with_auth {
        validate_url(instance_url)?;
        return Ok(Endpoint {
            url: instance_url.to_string(),
            tls: None,
            auth: None,
        });
    }

    let password = require(snapshot.auth_password.as_deref(), vars::BASIC_AUTH_PASS)?;
    let password = CredentialStore::resolve_value(password)?;

    let url = match snapshot.auth_user.as_deref() {
        Some(user) => splice_username(instance_url, user),
        None => instance_url.to_string(),
    };
    validate_url(&url)?;

    Ok(Endpoint {
        url,
        tls: None,
        auth: Some(AuthMaterial {
            username: snapshot.auth_user.clone(),
            password,
        }),
    })
}

/// Insert `user@` right after the first `//`
fn splice_username(url: &str, user: &str) -> String {
    match url.split_once("//") {
        Some((scheme, rest)) => format!("{scheme}//{}@{rest}", urlencoding::encode(user)),
        None => url.to_string(),
    }
}
