use std::path::Path;

use sha2::Digest;
use sha2::Sha256;

/// AdapterA's lossy directory encoding: `/` and `_` both become `-`. Kept
/// bit-for-bit compatible with existing on-disk layouts; not safe to
/// round-trip arbitrary paths back out of this encoding.
pub fn encode_project_dir(path: &Path) -> String {
    path.to_string_lossy().replace(['/', '_'], "-")
}

/// AdapterC's project-directory hash used as a directory name under its
/// history root.
pub fn hash_project_dir(path: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.to_string_lossy().as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|byte| format!("{byte:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn encode_replaces_slash_and_underscore() {
        let path = PathBuf::from("/home/user/my_project");
        assert_eq!(encode_project_dir(&path), "-home-user-my-project");
    }

    #[test]
    fn hash_is_stable_and_lowercase_hex() {
        let path = PathBuf::from("/home/user/project");
        let hash = hash_project_dir(&path);
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(hash, hash_project_dir(&path));
    }
}
