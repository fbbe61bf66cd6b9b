use adwatch_core::{Alert, Severity};

use super::RuleInput;

const SECONDS_PER_DAY: i64 = 86_400;

/// Critical alert once the access token is within the warning window of its
/// expiry. Tokens with `expires_at == 0` never expire.
pub fn token_expiration(input: &RuleInput<'_>) -> Vec<Alert> {
    let expires_at = input.snapshot.account.token.expires_at;
    if expires_at == 0 {
        return Vec::new();
    }

    let remaining = expires_at - input.now.timestamp();
    let window = i64::from(input.thresholds.token.expiry_warning_days) * SECONDS_PER_DAY;
    if remaining > window {
        return Vec::new();
    }

    let detail = if remaining <= 0 {
        "Meta access token has expired. Update token to restore monitoring.".to_string()
    } else {
        let days = ceil_days(remaining);
        format!(
            "Meta access token expires in {days} day{}. Update token to avoid monitoring interruption.",
            if days == 1 { "" } else { "s" }
        )
    };

    vec![Alert::new(
        "token_expiring",
        "🚨 Token Expiring Soon",
        detail,
        Severity::Critical,
    )]
}

fn ceil_days(seconds: i64) -> i64 {
    let days = seconds / SECONDS_PER_DAY;
    if seconds % SECONDS_PER_DAY > 0 {
        days + 1
    } else {
        days
    }
}
