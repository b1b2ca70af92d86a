//! FiveM/CFX script distribution: resource names, versions, licence keys,
//! download-token payloads and game-server licence verification.

use std::cmp::Ordering;
use std::fmt;
use std::net::IpAddr;
use std::sync::LazyLock;

use rand::Rng;
use regex::Regex;
use serde::Serialize;

use crate::error::CoreError;
use crate::types::DbId;

/// Seconds a download link stays valid.
pub const DOWNLOAD_TOKEN_TTL_SECS: i64 = 600;

/// Licence keys look like `SF-ABCD-EFGH-JKLM-NPQR`.
pub const LICENSE_KEY_PREFIX: &str = "SF";
const LICENSE_KEY_GROUPS: usize = 4;
const LICENSE_KEY_GROUP_LEN: usize = 4;

/// Characters used in licence keys (no 0/O/1/I to avoid misreads).
const LICENSE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

static RESOURCE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9_-]{3,64}$").expect("valid regex"));

static LICENSE_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^SF(-[A-HJ-NP-Z2-9]{4}){4}$").expect("valid regex")
});

// ---------------------------------------------------------------------------
// Resource names
// ---------------------------------------------------------------------------

/// Validate a CFX resource folder name.
pub fn validate_resource_name(name: &str) -> Result<(), CoreError> {
    if RESOURCE_NAME_RE.is_match(name) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Ungültiger Ressourcenname '{name}'. Erlaubt sind 3–64 Zeichen: a-z, 0-9, '_' und '-'"
        )))
    }
}

// ---------------------------------------------------------------------------
// Versions
// ---------------------------------------------------------------------------

/// A `MAJOR.MINOR.PATCH` script version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScriptVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl ScriptVersion {
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let invalid = || {
            CoreError::Validation(format!(
                "Ungültige Version '{s}'. Erwartet wird MAJOR.MINOR.PATCH, z.B. 1.2.0"
            ))
        };
        let trimmed = s.trim().trim_start_matches('v');
        let mut parts = trimmed.split('.');
        let mut next = || -> Result<u32, CoreError> {
            parts
                .next()
                .filter(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
                .and_then(|p| p.parse().ok())
                .ok_or_else(invalid)
        };
        let version = Self {
            major: next()?,
            minor: next()?,
            patch: next()?,
        };
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(version)
    }
}

impl fmt::Display for ScriptVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// A new version must be strictly greater than the latest published one.
pub fn validate_next_version(
    latest: Option<ScriptVersion>,
    candidate: ScriptVersion,
) -> Result<(), CoreError> {
    match latest.map(|l| candidate.cmp(&l)) {
        None | Some(Ordering::Greater) => Ok(()),
        Some(_) => Err(CoreError::Conflict(format!(
            "Version {candidate} muss größer als die aktuelle Version {} sein",
            latest.map(|l| l.to_string()).unwrap_or_default()
        ))),
    }
}

// ---------------------------------------------------------------------------
// Licence keys
// ---------------------------------------------------------------------------

pub fn generate_license_key() -> String {
    let mut rng = rand::rng();
    let mut key = String::from(LICENSE_KEY_PREFIX);
    for _ in 0..LICENSE_KEY_GROUPS {
        key.push('-');
        for _ in 0..LICENSE_KEY_GROUP_LEN {
            let idx = rng.random_range(0..LICENSE_ALPHABET.len());
            key.push(char::from(LICENSE_ALPHABET[idx]));
        }
    }
    key
}

/// Uppercase and trim a key typed into a server config.
pub fn normalize_license_key(key: &str) -> String {
    key.trim().to_ascii_uppercase()
}

pub fn is_valid_license_key_format(key: &str) -> bool {
    LICENSE_KEY_RE.is_match(key)
}

// ---------------------------------------------------------------------------
// Download tokens
// ---------------------------------------------------------------------------

/// Payload signed into a download link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadGrant {
    pub license_id: DbId,
    pub version_id: DbId,
}

impl DownloadGrant {
    pub fn to_payload(self) -> String {
        format!("download:{}:{}", self.license_id, self.version_id)
    }

    pub fn from_payload(payload: &str) -> Result<Self, CoreError> {
        let invalid = || CoreError::Unauthorized("Ungültiger Download-Link".to_string());
        let rest = payload.strip_prefix("download:").ok_or_else(invalid)?;
        let (license, version) = rest.split_once(':').ok_or_else(invalid)?;
        Ok(Self {
            license_id: license.parse().map_err(|_| invalid())?,
            version_id: version.parse().map_err(|_| invalid())?,
        })
    }
}

// ---------------------------------------------------------------------------
// Game-server verification
// ---------------------------------------------------------------------------

/// Outcome of a game server asking whether it may run a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyReason {
    Ok,
    MalformedKey,
    UnknownKey,
    WrongResource,
    Revoked,
    ScriptInactive,
    IpMismatch,
}

impl VerifyReason {
    pub fn is_valid(self) -> bool {
        self == Self::Ok
    }
}

/// What is known about a licence when a server verifies it.
#[derive(Debug, Clone)]
pub struct LicenseFacts<'a> {
    pub resource_name: &'a str,
    pub is_revoked: bool,
    pub script_active: bool,
    pub bound_ip: Option<&'a str>,
}

/// Decide a verification request. The caller binds `server_ip` to the licence
/// when the result is `Ok` and no IP was bound yet.
pub fn verify_license(
    facts: Option<&LicenseFacts<'_>>,
    requested_resource: &str,
    server_ip: &str,
) -> VerifyReason {
    let Some(facts) = facts else {
        return VerifyReason::UnknownKey;
    };
    if facts.is_revoked {
        return VerifyReason::Revoked;
    }
    if !facts.script_active {
        return VerifyReason::ScriptInactive;
    }
    if facts.resource_name != requested_resource {
        return VerifyReason::WrongResource;
    }
    match facts.bound_ip {
        Some(bound) if !same_ip(bound, server_ip) => VerifyReason::IpMismatch,
        _ => VerifyReason::Ok,
    }
}

/// Parse a literal IPv4 or IPv6 address into the form licences are bound
/// with, so `::1` and `0:0:0:0:0:0:0:1` name the same server.
pub fn canonical_server_ip(ip: &str) -> Result<String, CoreError> {
    ip.trim()
        .parse::<IpAddr>()
        .map(|addr| addr.to_string())
        .map_err(|_| CoreError::Validation(format!("Ungültige Server-IP '{ip}'")))
}

fn same_ip(a: &str, b: &str) -> bool {
    match (a.parse::<IpAddr>(), b.parse::<IpAddr>()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn resource_names() {
        assert!(validate_resource_name("sf_garage").is_ok());
        assert!(validate_resource_name("esx-shops2").is_ok());
        assert!(validate_resource_name("ab").is_err());
        assert!(validate_resource_name("MyScript").is_err());
        assert!(validate_resource_name("bad name").is_err());
    }

    #[test]
    fn parses_versions() {
        let v = ScriptVersion::parse("1.12.3").unwrap();
        assert_eq!(
            v,
            ScriptVersion {
                major: 1,
                minor: 12,
                patch: 3
            }
        );
        assert_eq!(ScriptVersion::parse("v2.0.0").unwrap().to_string(), "2.0.0");
        for bad in ["1.2", "1.2.3.4", "a.b.c", "1..2", "", "1.2.-3"] {
            assert!(ScriptVersion::parse(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn versions_compare_numerically() {
        let a = ScriptVersion::parse("1.9.0").unwrap();
        let b = ScriptVersion::parse("1.10.0").unwrap();
        assert!(b > a);
    }

    #[test]
    fn next_version_must_increase() {
        let latest = ScriptVersion::parse("1.2.0").unwrap();
        assert!(validate_next_version(None, latest).is_ok());
        assert!(validate_next_version(Some(latest), ScriptVersion::parse("1.2.1").unwrap()).is_ok());
        assert_matches!(
            validate_next_version(Some(latest), latest),
            Err(CoreError::Conflict(_))
        );
        assert!(validate_next_version(Some(latest), ScriptVersion::parse("1.1.9").unwrap()).is_err());
    }

    #[test]
    fn generated_keys_match_format() {
        for _ in 0..20 {
            let key = generate_license_key();
            assert_eq!(key.len(), 22);
            assert!(is_valid_license_key_format(&key), "{key}");
        }
        assert!(!is_valid_license_key_format("SF-0000-AAAA-BBBB-CCCC"));
        assert_eq!(
            normalize_license_key("  sf-abcd-efgh-jkmn-pqrs "),
            "SF-ABCD-EFGH-JKMN-PQRS"
        );
    }

    #[test]
    fn download_grant_payload_round_trip() {
        let grant = DownloadGrant {
            license_id: 5,
            version_id: 9,
        };
        assert_eq!(DownloadGrant::from_payload(&grant.to_payload()).unwrap(), grant);
        assert!(DownloadGrant::from_payload("oauth:discord:x").is_err());
        assert!(DownloadGrant::from_payload("download:5").is_err());
    }

    #[test]
    fn verification_decisions() {
        let facts = LicenseFacts {
            resource_name: "sf_garage",
            is_revoked: false,
            script_active: true,
            bound_ip: None,
        };
        assert_eq!(verify_license(None, "sf_garage", "1.2.3.4"), VerifyReason::UnknownKey);
        assert_eq!(verify_license(Some(&facts), "sf_garage", "1.2.3.4"), VerifyReason::Ok);
        assert_eq!(
            verify_license(Some(&facts), "sf_shops", "1.2.3.4"),
            VerifyReason::WrongResource
        );

        let bound = LicenseFacts {
            bound_ip: Some("1.2.3.4"),
            ..facts.clone()
        };
        assert_eq!(verify_license(Some(&bound), "sf_garage", "1.2.3.4"), VerifyReason::Ok);
        assert_eq!(
            verify_license(Some(&bound), "sf_garage", "5.6.7.8"),
            VerifyReason::IpMismatch
        );

        let revoked = LicenseFacts {
            is_revoked: true,
            ..facts.clone()
        };
        assert_eq!(
            verify_license(Some(&revoked), "sf_garage", "1.2.3.4"),
            VerifyReason::Revoked
        );
        let inactive = LicenseFacts {
            script_active: false,
            ..facts
        };
        assert!(!verify_license(Some(&inactive), "sf_garage", "1.2.3.4").is_valid());
    }

    #[test]
    fn server_ips_are_canonicalised() {
        assert_eq!(canonical_server_ip(" 203.0.113.7 ").unwrap(), "203.0.113.7");
        assert_eq!(canonical_server_ip("0:0:0:0:0:0:0:1").unwrap(), "::1");
        assert_eq!(canonical_server_ip("2001:DB8:0::1").unwrap(), "2001:db8::1");
        assert_matches!(canonical_server_ip("localhost"), Err(CoreError::Validation(_)));
    }

    #[test]
    fn bound_ip_matches_in_any_notation() {
        let facts = LicenseFacts {
            resource_name: "sf_garage",
            is_revoked: false,
            script_active: true,
            bound_ip: Some("0:0:0:0:0:0:0:1"),
        };
        assert_eq!(verify_license(Some(&facts), "sf_garage", "::1"), VerifyReason::Ok);
        assert_eq!(
            verify_license(Some(&facts), "sf_garage", "::2"),
            VerifyReason::IpMismatch
        );
    }
}
