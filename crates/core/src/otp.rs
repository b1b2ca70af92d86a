//! One-time passcodes for the simulated two-factor login.
//!
//! Codes are six random digits. Only their SHA-256 hash is persisted; the
//! plaintext is handed to the (simulated) delivery channel exactly once.

use chrono::Duration;
use rand::Rng;

use crate::crypto::sha256_hex;
use crate::error::CoreError;
use crate::types::Timestamp;

/// Number of digits in a passcode.
pub const OTP_LENGTH: usize = 6;

/// Minutes a challenge stays valid.
pub const OTP_TTL_MINS: i64 = 5;

/// Wrong guesses allowed before the challenge is burned.
pub const OTP_MAX_ATTEMPTS: i32 = 5;

/// A freshly issued passcode.
pub struct GeneratedOtp {
    /// Plaintext code, delivered once and never stored.
    pub code: String,
    /// SHA-256 hex digest stored with the challenge.
    pub hash: String,
    pub expires_at: Timestamp,
}

pub fn generate_otp(now: Timestamp) -> GeneratedOtp {
    let mut rng = rand::rng();
    let code: String = (0..OTP_LENGTH)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect();
    let hash = hash_otp(&code);
    GeneratedOtp {
        code,
        hash,
        expires_at: now + Duration::minutes(OTP_TTL_MINS),
    }
}

pub fn hash_otp(code: &str) -> String {
    sha256_hex(code.trim().as_bytes())
}

/// Why a challenge can no longer be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeState {
    Usable,
    Expired,
    Consumed,
    TooManyAttempts,
}

/// Check a stored challenge before comparing codes.
pub fn challenge_state(
    expires_at: Timestamp,
    consumed: bool,
    attempts: i32,
    now: Timestamp,
) -> ChallengeState {
    if consumed {
        ChallengeState::Consumed
    } else if attempts >= OTP_MAX_ATTEMPTS {
        ChallengeState::TooManyAttempts
    } else if expires_at <= now {
        ChallengeState::Expired
    } else {
        ChallengeState::Usable
    }
}

/// Map an unusable challenge to the error returned to the client.
pub fn ensure_usable(state: ChallengeState) -> Result<(), CoreError> {
    match state {
        ChallengeState::Usable => Ok(()),
        ChallengeState::Expired => Err(CoreError::Unauthorized(
            "Der Code ist abgelaufen. Bitte melde dich erneut an.".to_string(),
        )),
        ChallengeState::Consumed => Err(CoreError::Unauthorized(
            "Der Code wurde bereits verwendet".to_string(),
        )),
        ChallengeState::TooManyAttempts => Err(CoreError::Forbidden(
            "Zu viele Fehlversuche. Bitte melde dich erneut an.".to_string(),
        )),
    }
}

/// Validate the shape of a submitted code.
pub fn validate_code_format(code: &str) -> Result<(), CoreError> {
    let code = code.trim();
    if code.len() == OTP_LENGTH && code.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Der Code muss aus {OTP_LENGTH} Ziffern bestehen"
        )))
    }
}

pub fn verify_otp(code: &str, stored_hash: &str) -> bool {
    hash_otp(code) == stored_hash
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::Utc;

    use super::*;

    #[test]
    fn generated_code_is_six_digits_and_verifies() {
        let now = Utc::now();
        let otp = generate_otp(now);
        assert_eq!(otp.code.len(), OTP_LENGTH);
        assert!(otp.code.chars().all(|c| c.is_ascii_digit()));
        assert!(verify_otp(&otp.code, &otp.hash));
        assert!(verify_otp(&format!(" {} ", otp.code), &otp.hash));
        assert_eq!(otp.expires_at, now + Duration::minutes(OTP_TTL_MINS));
    }

    #[test]
    fn wrong_code_fails() {
        let otp = generate_otp(Utc::now());
        let wrong = if otp.code == "000000" { "111111" } else { "000000" };
        assert!(!verify_otp(wrong, &otp.hash));
    }

    #[test]
    fn challenge_states() {
        let now = Utc::now();
        let later = now + Duration::minutes(1);
        assert_eq!(challenge_state(later, false, 0, now), ChallengeState::Usable);
        assert_eq!(challenge_state(now, false, 0, now), ChallengeState::Expired);
        assert_eq!(challenge_state(later, true, 0, now), ChallengeState::Consumed);
        assert_eq!(
            challenge_state(later, false, OTP_MAX_ATTEMPTS, now),
            ChallengeState::TooManyAttempts
        );
    }

    #[test]
    fn unusable_challenges_map_to_errors() {
        assert!(ensure_usable(ChallengeState::Usable).is_ok());
        assert_matches!(
            ensure_usable(ChallengeState::Expired),
            Err(CoreError::Unauthorized(_))
        );
        assert_matches!(
            ensure_usable(ChallengeState::TooManyAttempts),
            Err(CoreError::Forbidden(_))
        );
    }

    #[test]
    fn code_format() {
        assert!(validate_code_format("123456").is_ok());
        assert!(validate_code_format("12345").is_err());
        assert!(validate_code_format("12a456").is_err());
    }
}
