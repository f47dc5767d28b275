//! Install stamp
//!
//! After a successful install the manifest digest is written to
//! `<env dir>/.pylaunch-manifest`. A matching stamp lets the install step be
//! skipped when `skip_unchanged_install` is enabled.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

/// File inside the environment directory holding the last installed manifest digest.
pub const INSTALL_STAMP_FILE: &str = ".pylaunch-manifest";

/// Short manifest digest: leading 4 bytes of SHA-256 as lowercase hex.
pub fn manifest_digest(manifest: &[u8]) -> String {
    hex::encode(&Sha256::digest(manifest)[..4])
}

/// Location of the install stamp for an environment directory.
pub fn stamp_path(env_dir: &Path) -> PathBuf {
    env_dir.join(INSTALL_STAMP_FILE)
}

/// Whether a stamp file's content records `digest`. Surrounding whitespace is ignored.
pub fn stamp_matches(stamp_content: &str, digest: &str) -> bool {
    let stamp = stamp_content.trim();
    !stamp.is_empty() && stamp.eq_ignore_ascii_case(digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_same_manifest_when_digesting_then_stable_eight_hex_chars() {
        let first = manifest_digest(b"requests==2.31.0\n");
        let again = manifest_digest(b"requests==2.31.0\n");

        assert_eq!(first, again);
        assert_eq!(first.len(), 8);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn given_edited_manifest_when_digesting_then_digest_changes() {
        assert_ne!(manifest_digest(b"requests\n"), manifest_digest(b"requests\nnumpy\n"));
    }

    #[test]
    fn given_stamp_content_when_matching_then_ignores_trailing_newline_only() {
        let digest = manifest_digest(b"numpy\n");

        assert!(stamp_matches(&format!("{digest}\n"), &digest));
        assert!(stamp_matches(&digest.to_uppercase(), &digest));
        assert!(!stamp_matches("", &digest));
        assert!(!stamp_matches("deadbeef", &manifest_digest(b"other")));
    }

    #[test]
    fn given_env_dir_when_locating_stamp_then_inside_it() {
        let path = stamp_path(Path::new("/srv/app/venv"));
        assert_eq!(path, Path::new("/srv/app/venv/.pylaunch-manifest"));
    }
}
