//! Git authentication configuration
//!
//! Authentication is delegated entirely to git's native credential system:
//! - SSH agent and keys from ~/.ssh/
//! - Git credential helpers
//! - Environment variables (`GIT_SSH_COMMAND`, etc.)

use git2::{Cred, CredentialType, RemoteCallbacks};

fn try_ssh_key(username: &str) -> Option<Cred> {
    if let Ok(cred) = Cred::ssh_key_from_agent(username) {
        return Some(cred);
    }

    let ssh_dir = dirs::home_dir().unwrap_or_default().join(".ssh");
    for key_name in &["id_ed25519", "id_rsa", "id_ecdsa"] {
        let private_key = ssh_dir.join(key_name);
        if !private_key.exists() {
            continue;
        }
        let public_key = ssh_dir.join(format!("{key_name}.pub"));
        let public_key = public_key.exists().then_some(public_key.as_path());
        if let Ok(cred) = Cred::ssh_key(username, public_key, &private_key, None) {
            return Some(cred);
        }
    }
    None
}

fn try_userpass(url: &str, username_from_url: Option<&str>) -> Option<Cred> {
    if let Ok(config) = git2::Config::open_default() {
        if let Ok(cred) = Cred::credential_helper(&config, url, username_from_url) {
            return Some(cred);
        }
    }

    // Public HTTPS repositories: let the server answer with the real error
    Cred::userpass_plaintext(username_from_url.unwrap_or(""), "").ok()
}

/// Install credential callbacks on a set of remote callbacks
pub fn setup_auth_callbacks(callbacks: &mut RemoteCallbacks<'_>) {
    callbacks.credentials(|url, username_from_url, allowed_types| {
        if allowed_types.contains(CredentialType::DEFAULT) {
            return Cred::default();
        }

        if allowed_types.contains(CredentialType::SSH_KEY) {
            if let Some(cred) = username_from_url.and_then(try_ssh_key) {
                return Ok(cred);
            }
        }

        if allowed_types.contains(CredentialType::USER_PASS_PLAINTEXT) {
            if let Some(cred) = try_userpass(url, username_from_url) {
                return Ok(cred);
            }
        }

        Err(git2::Error::new(
            git2::ErrorCode::Auth,
            git2::ErrorClass::Http,
            "authentication failed",
        ))
    });
}
