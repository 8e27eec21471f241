use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chain_analos::Address;
use launchpad_client::{KdfParams, KeypairWallet};
use serde::Serialize;

use super::{keystore_password, ENV_KEYSTORE_PASSWORD};
use crate::output;

#[derive(Debug, Serialize)]
pub struct KeygenOut {
    pub public_key: Address,
    pub path: PathBuf,
    pub encrypted: bool,
}

impl fmt::Display for KeygenOut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.encrypted { "encrypted keystore" } else { "keypair" };
        write!(f, "wrote {kind} {}\npubkey: {}", self.path.display(), self.public_key)
    }
}

pub fn run(out: &Path, encrypt: bool, force: bool) -> Result<()> {
    let wallet = KeypairWallet::generate();
    write_keypair(&wallet, out, encrypt, force)?;
    output::print(&KeygenOut {
        public_key: wallet.address(),
        path: out.to_path_buf(),
        encrypted: encrypt,
    })
}

fn write_keypair(wallet: &KeypairWallet, out: &Path, encrypt: bool, force: bool) -> Result<()> {
    if out.exists() && !force {
        bail!("{} exists; pass --force to overwrite", out.display());
    }

    let written = if encrypt {
        let Some(password) = keystore_password() else {
            bail!("--encrypt needs a password in {ENV_KEYSTORE_PASSWORD}");
        };
        let sealed = wallet.encrypt(&password, KdfParams::default())?;
        std::fs::write(out, serde_json::to_string_pretty(&sealed)?)
    } else {
        std::fs::write(out, wallet.to_json().as_bytes())
    };
    written.with_context(|| format!("writing {}", out.display()))?;
    restrict_permissions(out)?;
    Ok(())
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .with_context(|| format!("chmod {}", path.display()))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
