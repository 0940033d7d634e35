use rand::{distributions::Alphanumeric, thread_rng, Rng};

use crate::error::{Error, Result};

pub const GENERATED_CODE_LEN: usize = 6;
pub const MAX_CODE_LEN: usize = 32;

/// Random uppercase alphanumeric assessment code.
pub fn generate_assessment_code() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_CODE_LEN)
        .map(|b| char::from(b).to_ascii_uppercase())
        .collect()
}

/// Codes are matched case-insensitively by storing and comparing them uppercased.
pub fn normalize_assessment_code(raw: &str) -> Result<String> {
    let code = raw.trim().to_ascii_uppercase();
    if code.is_empty() {
        return Err(Error::BadRequest("Assessment code is required".to_string()));
    }
    if code.len() > MAX_CODE_LEN {
        return Err(Error::BadRequest(format!(
            "Assessment code must be at most {} characters",
            MAX_CODE_LEN
        )));
    }
    if !code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(Error::BadRequest(
            "Assessment code may only contain letters, digits and '-'".to_string(),
        ));
    }
    Ok(code)
}
