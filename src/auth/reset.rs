use rand::{rngs::OsRng, RngCore};
use time::{Duration, OffsetDateTime};

use crate::{auth::repo_types::User, error::AppError};

pub const DEFAULT_RESET_TTL_MINUTES: i64 = 15;

/// 32 random bytes, hex-encoded (64 chars).
pub fn new_reset_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub fn reset_expiry(minutes: i64) -> OffsetDateTime {
    OffsetDateTime::now_utc() + Duration::minutes(minutes)
}

/// Every failure collapses into `InvalidOrExpired` so the caller cannot tell
/// an unknown token from an expired one.
pub fn check_reset(user: &User, token: &str, now: OffsetDateTime) -> Result<(), AppError> {
    let (Some(stored), Some(expires)) = (user.reset_token.as_deref(), user.reset_expires) else {
        return Err(AppError::InvalidOrExpired);
    };
    if stored != token || expires <= now {
        return Err(AppError::InvalidOrExpired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use time::macros::date;

    fn user_with(token: Option<&str>, expires: Option<OffsetDateTime>) -> User {
        User {
            id: 1,
            name: "Ana".into(),
            email: "ana@x.com".into(),
            cpf: "11122233344".into(),
            birth: date!(1990 - 01 - 01),
            password_hash: "$argon2id$stub".into(),
            reset_token: token.map(str::to_string),
            reset_expires: expires,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn token_is_64_hex_chars() {
        let token = new_reset_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn tokens_do_not_repeat() {
        let tokens: HashSet<String> = (0..1000).map(|_| new_reset_token()).collect();
        assert_eq!(tokens.len(), 1000);
    }

    #[test]
    fn expiry_is_now_plus_minutes() {
        let before = OffsetDateTime::now_utc();
        let expires = reset_expiry(DEFAULT_RESET_TTL_MINUTES);
        let after = OffsetDateTime::now_utc();
        assert!(expires >= before + Duration::minutes(15));
        assert!(expires <= after + Duration::minutes(15));
    }

    #[test]
    fn check_accepts_matching_unexpired_token() {
        let now = OffsetDateTime::now_utc();
        let user = user_with(Some("abc"), Some(now + Duration::minutes(5)));
        assert!(check_reset(&user, "abc", now).is_ok());
    }

    #[test]
    fn check_rejects_every_failure_the_same_way() {
        let now = OffsetDateTime::now_utc();
        let cases = [
            (user_with(None, None), "abc"),
            (user_with(Some("abc"), Some(now + Duration::minutes(5))), "abd"),
            (user_with(Some("abc"), Some(now - Duration::seconds(1))), "abc"),
            (user_with(Some("abc"), Some(now)), "abc"),
        ];
        for (user, token) in cases {
            let err = check_reset(&user, token, now).unwrap_err();
            assert!(matches!(err, AppError::InvalidOrExpired));
        }
    }
}
