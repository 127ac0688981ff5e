//! Identifiers and random selection.

use rand::seq::SliceRandom;
use rand::Rng;

const ID_LEN: usize = 9;
const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// A random 9-character base-36 token. Uniqueness is not checked.
pub fn generate_id() -> String {
    generate_id_with_rng(&mut rand::thread_rng())
}

pub fn generate_id_with_rng<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..ID_LEN)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

/// A uniformly chosen element, or `None` for an empty slice.
pub fn pick_random<T>(items: &[T]) -> Option<&T> {
    items.choose(&mut rand::thread_rng())
}

/// A shuffled copy of `items`; the input is left untouched.
pub fn shuffle<T: Clone>(items: &[T]) -> Vec<T> {
    shuffle_with_rng(items, &mut rand::thread_rng())
}

pub fn shuffle_with_rng<T: Clone, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> Vec<T> {
    let mut shuffled = items.to_vec();
    shuffled.shuffle(rng);
    shuffled
}
