//! Lock detection: a cheap scan for encrypted / rights-protected documents.
//!
//! Password-protected Office files are not ZIP packages at all but OLE
//! compound files wrapping an `EncryptedPackage` stream, and the name of that
//! stream sits near the start of the directory. Rights-managed packages carry
//! a `drs:encryption` marker inside. Neither is definitive: a miss is caught
//! later as a generic converter failure, the scan only buys a clearer message
//! and skips a pointless subprocess.

use once_cell::sync::Lazy;
use regex::bytes::Regex;

/// Bytes scanned for the `EncryptedPackage` stream name.
pub const PREFIX_SCAN_BYTES: usize = 4096;

// ASCII form, plus the UTF-16LE form used by OLE directory entries.
static ENCRYPTED_PACKAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"EncryptedPackage",
        r"|E\x00n\x00c\x00r\x00y\x00p\x00t\x00e\x00d\x00",
        r"P\x00a\x00c\x00k\x00a\x00g\x00e\x00",
    ))
    .expect("valid regex")
});

static RIGHTS_MANAGED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"drs:encryption").expect("valid regex"));

/// `true` when the bytes look like a locked document.
pub fn is_locked(raw: &[u8]) -> bool {
    let prefix = &raw[..raw.len().min(PREFIX_SCAN_BYTES)];
    ENCRYPTED_PACKAGE.is_match(prefix) || RIGHTS_MANAGED.is_match(raw)
}
