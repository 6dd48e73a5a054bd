//! Verification code generation.

use rand::Rng;

/// Generate a code that can be sent to the user.
///
/// Uniformly random in `100000..=999999`, so the decimal rendering is always
/// exactly six digits with no padding needed.
pub fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    let code: u32 = rng.gen_range(100_000..=999_999);
    code.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_six_digit_numerics_in_range() {
        for _ in 0..1_000 {
            let code = generate_code();

            assert_eq!(code.len(), 6);
            let numeric: u32 = code.parse().unwrap();
            assert!((100_000..=999_999).contains(&numeric));
        }
    }
}
