pub fn validate_identifier_value(kind: &str, value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err(format!("{kind} must be non-empty"));
    }
    if value
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
    {
        return Ok(());
    }
    Err(format!(
        "{kind} must use only ASCII letters, digits, '-' or '_'"
    ))
}

/// Lowercase hex of `len` random bytes. Falls back to process id and clock
/// bits when the OS source is unavailable.
pub fn random_hex(len: usize) -> String {
    let mut buf = vec![0u8; len];
    if getrandom::getrandom(&mut buf).is_err() {
        let seed = (std::process::id() as u128) ^ (super::now_millis() as u128).rotate_left(17);
        for (idx, byte) in buf.iter_mut().enumerate() {
            *byte = (seed >> ((idx % 16) * 8)) as u8;
        }
    }
    buf.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::{random_hex, validate_identifier_value};

    #[test]
    fn identifier_validation_rejects_path_characters() {
        assert!(validate_identifier_value("store key", "promptHistory").is_ok());
        assert!(validate_identifier_value("store key", "prompt-history_2").is_ok());
        assert!(validate_identifier_value("store key", "").is_err());
        assert!(validate_identifier_value("store key", "../etc").is_err());
    }

    #[test]
    fn random_hex_has_two_chars_per_byte() {
        let value = random_hex(4);
        assert_eq!(value.len(), 8);
        assert!(value.chars().all(|ch| ch.is_ascii_hexdigit()));
    }
}
