//! Private room codes.

use rand::Rng;

/// Characters a room code is drawn from.
pub const ROOM_CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Default room code length.
pub const DEFAULT_ROOM_CODE_LEN: usize = 6;

/// Draw a random code of `len` characters.
pub(crate) fn generate<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| char::from(ROOM_CODE_CHARSET[rng.random_range(0..ROOM_CODE_CHARSET.len())]))
        .collect()
}

/// Canonical form of a code typed by a player.
pub(crate) fn normalize(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn test_generate_length_and_charset() {
        let mut rng = SmallRng::seed_from_u64(3);
        for _ in 0..100 {
            let code = generate(&mut rng, DEFAULT_ROOM_CODE_LEN);
            assert_eq!(code.len(), 6);
            assert!(code.bytes().all(|b| ROOM_CODE_CHARSET.contains(&b)));
        }
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(" ab12cd "), "AB12CD");
    }
}
