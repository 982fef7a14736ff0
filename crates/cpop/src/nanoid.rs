//! Short random identifiers for display-only ids.
//!
//! Not suitable for secrets: the default generator is `rand::thread_rng`
//! and nothing here is hardened against prediction.

use rand::Rng;

use crate::constants::{DEFAULT_ID_LEN, ID_ALPHABET};

pub fn generate(length: usize) -> String {
    generate_with(&mut rand::thread_rng(), length)
}

pub fn generate_default() -> String {
    generate(DEFAULT_ID_LEN)
}

pub fn generate_with<R: Rng + ?Sized>(rng: &mut R, length: usize) -> String {
    (0..length)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    quickcheck! {
        fn length_matches_request(len: u8) -> bool {
            let len = len as usize;
            generate(len).len() == len
        }

        fn only_alphabet_symbols(len: u8) -> bool {
            generate(len as usize).bytes().all(|b| ID_ALPHABET.contains(&b))
        }
    }

    #[test]
    fn default_length_is_21() {
        assert_eq!(generate_default().len(), 21);
    }

    #[test]
    fn zero_length_is_empty() {
        assert!(generate(0).is_empty());
    }

    #[test]
    fn thousand_ids_are_distinct() {
        let ids: HashSet<String> = (0..1000).map(|_| generate(8)).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        let a = generate_with(&mut StdRng::seed_from_u64(7), 16);
        let b = generate_with(&mut StdRng::seed_from_u64(7), 16);
        assert_eq!(a, b);
    }

    #[test]
    fn alphabet_has_62_symbols() {
        let unique: HashSet<&u8> = ID_ALPHABET.iter().collect();
        assert_eq!(unique.len(), 62);
    }
}
