/*!
Generates the opaque observation id described in the data model:
`obs_<timestamp36>_<random36>`.
*/

use chrono::Utc;
use rand::Rng;

const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn to_base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(ALPHABET[(n % 36) as usize]);
        n /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap()
}

/// Build a fresh observation id from the current wall clock and a
/// random suffix wide enough to make same-millisecond collisions
/// practically impossible.
pub fn generate_id() -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    let random: u64 = rand::thread_rng().gen_range(0..36u64.pow(8));
    format!("obs_{}_{}", to_base36(millis), to_base36(random))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_base36_zero() {
        assert_eq!(to_base36(0), "0");
    }

    #[test]
    fn test_to_base36_known_value() {
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
    }

    #[test]
    fn test_generate_id_has_expected_shape() {
        let id = generate_id();
        assert!(id.starts_with("obs_"));
        let parts: Vec<&str> = id.trim_start_matches("obs_").split('_').collect();
        assert_eq!(parts.len(), 2);
        assert!(parts.iter().all(|p| !p.is_empty()));
    }

    #[test]
    fn test_generate_id_is_not_constant() {
        let a = generate_id();
        let b = generate_id();
        assert_ne!(a, b);
    }
}
