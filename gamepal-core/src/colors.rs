//! Player and team color palette.

use rand::seq::SliceRandom;

/// High-contrast colors assigned to players and teams in order.
pub const PALETTE: [&str; 10] = [
    "#818cf8", "#c084fc", "#f472b6", "#fb7185", "#fbbf24", "#4ade80", "#22d3ee", "#60a5fa",
    "#a78bfa", "#f97316",
];

/// Palette color for position `index`, wrapping around.
pub fn color_by_index(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

pub fn random_color() -> &'static str {
    PALETTE
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(PALETTE[0])
}
