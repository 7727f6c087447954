//! Room join-code generation (§4.2: "short, human-typeable, unique per room").

use rand::Rng;

const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const CODE_LEN: usize = 6;

/// Generates a random 6-character code drawn from an alphabet with
/// visually ambiguous characters (0/O, 1/I/L) removed.
pub fn generate_room_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LEN)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_code_has_expected_length_and_alphabet() {
        let code = generate_room_code();
        assert_eq!(code.len(), CODE_LEN);
        assert!(code.bytes().all(|b| ALPHABET.contains(&b)));
    }

    #[test]
    fn codes_are_not_trivially_repeated() {
        let codes: std::collections::HashSet<_> = (0..50).map(|_| generate_room_code()).collect();
        assert!(codes.len() > 1, "50 draws should not collapse to a single code");
    }
}
