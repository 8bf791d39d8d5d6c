/// Validate an email: must contain '@' and '.', max 254 chars.
pub fn validate_email(email: &str) -> Option<String> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Some("Email is required".to_string());
    }
    if trimmed.len() > 254 {
        return Some("Email must be at most 254 characters".to_string());
    }
    if !trimmed.contains('@') || !trimmed.contains('.') {
        return Some("Email must be a valid address (contain '@' and '.')".to_string());
    }
    None
}

/// Validate a password: min 8 chars on create.
pub fn validate_password(password: &str) -> Option<String> {
    if password.is_empty() {
        return Some("Password is required".to_string());
    }
    if password.len() < 8 {
        return Some("Password must be at least 8 characters".to_string());
    }
    None
}

/// Validate a required text field with a max length.
pub fn validate_required(value: &str, field_name: &str, max_len: usize) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Some(format!("{field_name} is required"));
    }
    if trimmed.len() > max_len {
        return Some(format!("{field_name} must be at most {max_len} characters"));
    }
    None
}

/// Validate an optional text field with a max length (empty is OK).
pub fn validate_optional(value: &str, field_name: &str, max_len: usize) -> Option<String> {
    let trimmed = value.trim();
    if !trimmed.is_empty() && trimmed.len() > max_len {
        return Some(format!("{field_name} must be at most {max_len} characters"));
    }
    None
}

/// Validate an optional phone number: digits, spaces, `+`, `(`, `)` and `-` only.
pub fn validate_phone(phone: &str) -> Option<String> {
    let trimmed = phone.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.len() > 30 {
        return Some("Phone must be at most 30 characters".to_string());
    }
    let allowed = |c: char| c.is_ascii_digit() || c.is_whitespace() || "+()-".contains(c);
    if !trimmed.chars().all(allowed) {
        return Some("Phone may only contain digits, spaces, '+', '(', ')' and '-'".to_string());
    }
    None
}

/// Validate an optional postal code: exactly five digits.
pub fn validate_kode_pos(kode_pos: &str) -> Option<String> {
    let trimmed = kode_pos.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.len() != 5 || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Some("Postal code must be exactly 5 digits".to_string());
    }
    None
}
