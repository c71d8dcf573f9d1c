use std::sync::LazyLock;

use regex::Regex;

use shared_models::error::AppError;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email pattern compiles")
});

// Old format ABC1234 or Mercosul ABC1D23.
static PLATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z]{3}[0-9][A-Z0-9][0-9]{2}$").expect("plate pattern compiles")
});

fn digits(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

fn only_digits_and(value: &str, allowed: &[char]) -> bool {
    value
        .chars()
        .all(|c| c.is_ascii_digit() || allowed.contains(&c) || c.is_whitespace())
}

pub fn is_valid_email(email: &str) -> bool {
    email.len() <= 254 && EMAIL_RE.is_match(email)
}

/// Trimmed, lower-case email.
pub fn normalize_email(email: &str) -> Result<String, AppError> {
    let email = email.trim().to_lowercase();
    if is_valid_email(&email) {
        Ok(email)
    } else {
        Err(AppError::ValidationError("Invalid email address".to_string()))
    }
}

fn cpf_check_digit(digits: &[u32], weight_start: u32) -> u32 {
    let sum: u32 = digits
        .iter()
        .zip((2..=weight_start).rev())
        .map(|(d, w)| d * w)
        .sum();

    match sum % 11 {
        0 | 1 => 0,
        r => 11 - r,
    }
}

pub fn is_valid_cpf(cpf: &str) -> bool {
    if !only_digits_and(cpf, &['.', '-']) {
        return false;
    }

    let numbers: Vec<u32> = cpf.chars().filter_map(|c| c.to_digit(10)).collect();
    if numbers.len() != 11 || numbers.iter().all(|&d| d == numbers[0]) {
        return false;
    }

    cpf_check_digit(&numbers[..9], 10) == numbers[9] && cpf_check_digit(&numbers[..10], 11) == numbers[10]
}

/// CPF as its 11 digits.
pub fn normalize_cpf(cpf: &str) -> Result<String, AppError> {
    if is_valid_cpf(cpf) {
        Ok(digits(cpf))
    } else {
        Err(AppError::ValidationError("Invalid CPF".to_string()))
    }
}

pub fn is_valid_cep(cep: &str) -> bool {
    only_digits_and(cep, &['-', '.']) && digits(cep).len() == 8
}

pub fn normalize_cep(cep: &str) -> Result<String, AppError> {
    if is_valid_cep(cep) {
        Ok(digits(cep))
    } else {
        Err(AppError::ValidationError("Invalid CEP".to_string()))
    }
}

/// Landline (DDD + 8 digits) or mobile (DDD + 9 + 8 digits).
pub fn is_valid_phone(phone: &str) -> bool {
    if !only_digits_and(phone, &['(', ')', '-', '+', '.']) {
        return false;
    }

    let mut number = digits(phone);
    if phone.trim_start().starts_with('+') {
        match number.strip_prefix("55") {
            Some(rest) => number = rest.to_string(),
            None => return false,
        }
    }

    let ddd_ok = number
        .get(..2)
        .and_then(|ddd| ddd.parse::<u32>().ok())
        .is_some_and(|ddd| (11..=99).contains(&ddd));

    match number.len() {
        10 => ddd_ok,
        11 => ddd_ok && number.as_bytes()[2] == b'9',
        _ => false,
    }
}

pub fn normalize_phone(phone: &str) -> Result<String, AppError> {
    if !is_valid_phone(phone) {
        return Err(AppError::ValidationError("Invalid phone number".to_string()));
    }

    let number = digits(phone);
    if phone.trim_start().starts_with('+') {
        Ok(number[2..].to_string())
    } else {
        Ok(number)
    }
}

fn canonical_plate(plate: &str) -> String {
    plate.trim().replace('-', "").to_uppercase()
}

pub fn is_valid_plate(plate: &str) -> bool {
    let trimmed = plate.trim();
    // At most one hyphen, right after the letters.
    let hyphen_ok = match trimmed.find('-') {
        None => true,
        Some(3) => trimmed.matches('-').count() == 1,
        Some(_) => false,
    };
    hyphen_ok && PLATE_RE.is_match(&canonical_plate(trimmed))
}

/// Upper case, no hyphen.
pub fn normalize_plate(plate: &str) -> Result<String, AppError> {
    if is_valid_plate(plate) {
        Ok(canonical_plate(plate))
    } else {
        Err(AppError::ValidationError("Invalid license plate".to_string()))
    }
}

/// Trims and rejects blank values for a required text field.
pub fn required(field: &str, value: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        Err(AppError::ValidationError(format!("{} is required", field)))
    } else {
        Ok(value.to_string())
    }
}
