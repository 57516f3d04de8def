//! Utility functions for the ricecooker-autopilot crate.

/// Mask a secret for display in logs.
///
/// Secrets of up to 8 characters are shown as-is. Longer ones keep their
/// first and last 4 characters with everything in between replaced by `*`.
///
/// # Example
///
/// ```
/// use ricecooker_autopilot::mask_secret;
///
/// assert_eq!(mask_secret("00112233445566778899aabbccddeeff"), "0011************************eeff");
/// assert_eq!(mask_secret("short"), "short");
/// ```
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return secret.to_string();
    }

    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}{}", head, "*".repeat(chars.len() - 8), tail)
}
