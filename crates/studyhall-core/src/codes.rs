use rand::Rng;
use rand::distr::Alphanumeric;

/// Length of generated join codes. Stored codes may be up to 12 characters.
pub const JOIN_CODE_LEN: usize = 8;

/// Upper bound on stored join code length.
pub const MAX_JOIN_CODE_LEN: usize = 12;

/// Insert attempts before giving up on finding an unused code.
pub const MAX_CODE_ATTEMPTS: usize = 5;

/// Random case-sensitive alphanumeric code.
pub fn random_join_code() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(JOIN_CODE_LEN)
        .map(char::from)
        .collect()
}
