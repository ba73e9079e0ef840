//! Field validators shared by the flows.

use garage_core::{CommitRequest, FieldIssue, FormData, StepError};

/// Length of a modern VIN.
pub const VIN_LENGTH: usize = 17;

/// Returns true for a 17-character VIN. I, O and Q are never used.
pub fn is_valid_vin(vin: &str) -> bool {
    vin.len() == VIN_LENGTH
        && vin
            .chars()
            .all(|c| (c.is_ascii_uppercase() || c.is_ascii_digit()) && !matches!(c, 'I' | 'O' | 'Q'))
}

/// Inline issues for the `vin` field.
pub fn vin_issues(data: &FormData) -> Vec<FieldIssue> {
    let Some(vin) = data.text("vin") else {
        return vec![FieldIssue::new("vin", "VIN is required")];
    };

    if vin.len() != VIN_LENGTH {
        return vec![FieldIssue::new(
            "vin",
            format!("VIN must be exactly {} characters", VIN_LENGTH),
        )];
    }

    if !is_valid_vin(vin) {
        return vec![FieldIssue::new(
            "vin",
            "VIN may only contain digits and capital letters other than I, O and Q",
        )];
    }

    Vec::new()
}

/// Returns true for a `0x`-prefixed 20-byte hex address.
pub fn is_wallet_address(address: &str) -> bool {
    address
        .strip_prefix("0x")
        .is_some_and(|hex| hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Issue if `field` is missing or blank.
pub fn required(data: &FormData, field: &str, label: &str) -> Option<FieldIssue> {
    data.text(field)
        .is_none()
        .then(|| FieldIssue::new(field, format!("{} is required", label)))
}

/// Issue unless `field` is `true`.
pub fn checked(data: &FormData, field: &str, message: &str) -> Option<FieldIssue> {
    (data.bool(field) != Some(true)).then(|| FieldIssue::new(field, message))
}

/// A required text field read from a commit request.
pub fn field(request: &CommitRequest, key: &str) -> Result<String, StepError> {
    request
        .form_data
        .text(key)
        .map(str::to_string)
        .ok_or_else(|| StepError::validation(key, format!("{} is required", key)))
}
