//! Dice: the standard catalog, a tray of dice to roll, custom-faced dice,
//! and dice notation.
//!
//! Notation supports XdY+Z and keep highest/lowest (`4d6kh3`, `2d20kl1`).

use crate::random::generate_id;
use crate::stores::DicePreset;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Most dice a single notation term may roll.
pub const MAX_DICE: u32 = 1000;

/// Error type for dice parsing.
#[derive(Debug, Error)]
pub enum DiceError {
    #[error("Invalid dice notation: {0}")]
    InvalidNotation(String),
    #[error("Invalid die size: {0}")]
    InvalidDieSize(u32),
    #[error("No dice specified")]
    NoDice,
    #[error("Too many dice: {0} (at most {max})", max = MAX_DICE)]
    TooManyDice(u32),
    #[error("Cannot keep {keep} dice when only rolling {count} (in {notation})")]
    InvalidKeepCount {
        keep: u32,
        count: u32,
        notation: String,
    },
}

/// The dice in the catalog. Serialized as the number of faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
pub enum DieType {
    D3,
    D4,
    D6,
    D8,
    D10,
    D12,
    D20,
    D100,
}

impl DieType {
    /// Catalog order.
    pub const ALL: [DieType; 8] = [
        DieType::D3,
        DieType::D4,
        DieType::D6,
        DieType::D8,
        DieType::D10,
        DieType::D12,
        DieType::D20,
        DieType::D100,
    ];

    pub fn sides(&self) -> u32 {
        match self {
            DieType::D3 => 3,
            DieType::D4 => 4,
            DieType::D6 => 6,
            DieType::D8 => 8,
            DieType::D10 => 10,
            DieType::D12 => 12,
            DieType::D20 => 20,
            DieType::D100 => 100,
        }
    }

    pub fn from_sides(sides: u32) -> Option<DieType> {
        DieType::ALL.into_iter().find(|d| d.sides() == sides)
    }

    pub fn roll_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        rng.gen_range(1..=self.sides())
    }
}

impl From<DieType> for u32 {
    fn from(die: DieType) -> u32 {
        die.sides()
    }
}

impl TryFrom<u32> for DieType {
    type Error = DiceError;

    fn try_from(sides: u32) -> Result<Self, Self::Error> {
        DieType::from_sides(sides).ok_or(DiceError::InvalidDieSize(sides))
    }
}

impl FromStr for DieType {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().to_lowercase();
        let digits = trimmed.strip_prefix('d').unwrap_or(&trimmed);
        let sides: u32 = digits
            .parse()
            .map_err(|_| DiceError::InvalidNotation(s.to_string()))?;
        DieType::try_from(sides)
    }
}

impl fmt::Display for DieType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "D{}", self.sides())
    }
}

// ============================================================================
// Dice tray
// ============================================================================

/// A die on the tray. `value` is `None` until first rolled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Die {
    pub id: String,
    #[serde(rename = "type")]
    pub die: DieType,
    pub value: Option<u32>,
    pub is_locked: bool,
}

impl Die {
    pub fn new(die: DieType) -> Self {
        Self {
            id: generate_id(),
            die,
            value: None,
            is_locked: false,
        }
    }
}

/// Dice currently in play. Locked dice keep their value across rolls.
#[derive(Debug, Clone, Default)]
pub struct DiceTray {
    dice: Vec<Die>,
    custom: Vec<CustomDie>,
}

impl DiceTray {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lay out the dice a preset describes.
    pub fn from_preset(preset: &DicePreset) -> Self {
        let mut tray = Self::new();
        for group in &preset.standard_dice {
            for _ in 0..group.count {
                tray.add(group.die);
            }
        }
        tray.custom = preset
            .custom_dice
            .iter()
            .cloned()
            .map(|mut die| {
                die.current_face_index = None;
                die.is_locked = false;
                die
            })
            .collect();
        tray
    }

    pub fn dice(&self) -> &[Die] {
        &self.dice
    }

    pub fn custom_dice(&self) -> &[CustomDie] {
        &self.custom
    }

    pub fn add(&mut self, die: DieType) -> &Die {
        self.dice.push(Die::new(die));
        &self.dice[self.dice.len() - 1]
    }

    pub fn add_custom(&mut self, die: CustomDie) {
        self.custom.push(die);
    }

    /// Remove a standard or custom die by id.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.dice.len() + self.custom.len();
        self.dice.retain(|d| d.id != id);
        self.custom.retain(|d| d.id != id);
        before != self.dice.len() + self.custom.len()
    }

    pub fn toggle_lock(&mut self, id: &str) -> bool {
        if let Some(die) = self.dice.iter_mut().find(|d| d.id == id) {
            die.is_locked = !die.is_locked;
            return true;
        }
        if let Some(die) = self.custom.iter_mut().find(|d| d.id == id) {
            die.is_locked = !die.is_locked;
            return true;
        }
        false
    }

    pub fn clear(&mut self) {
        self.dice.clear();
        self.custom.clear();
    }

    pub fn roll(&mut self) {
        self.roll_with_rng(&mut rand::thread_rng());
    }

    /// Roll every unlocked die.
    pub fn roll_with_rng<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for die in self.dice.iter_mut().filter(|d| !d.is_locked) {
            die.value = Some(die.die.roll_with_rng(rng));
        }
        for die in self.custom.iter_mut() {
            die.roll_with_rng(rng);
        }
    }

    /// Sum of the rolled standard dice.
    pub fn total(&self) -> u32 {
        self.dice.iter().filter_map(|d| d.value).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.dice.is_empty() && self.custom.is_empty()
    }
}

// ============================================================================
// Custom dice
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomDieFace {
    pub value: String,
    pub color: Option<String>,
}

impl CustomDieFace {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            color: None,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

/// A die with arbitrary labelled faces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomDie {
    pub id: String,
    pub name: String,
    pub faces: Vec<CustomDieFace>,
    pub current_face_index: Option<usize>,
    pub is_locked: bool,
    pub game: Option<String>,
}

impl CustomDie {
    pub fn new(name: impl Into<String>, faces: Vec<CustomDieFace>) -> Self {
        Self {
            id: generate_id(),
            name: name.into(),
            faces,
            current_face_index: None,
            is_locked: false,
            game: None,
        }
    }

    pub fn for_game(mut self, game: impl Into<String>) -> Self {
        self.game = Some(game.into());
        self
    }

    /// The face showing, if rolled.
    pub fn current_face(&self) -> Option<&CustomDieFace> {
        self.current_face_index.and_then(|i| self.faces.get(i))
    }

    /// Land on a random face. Locked or faceless dice do not move.
    pub fn roll_with_rng<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<&CustomDieFace> {
        if !self.is_locked && !self.faces.is_empty() {
            self.current_face_index = Some(rng.gen_range(0..self.faces.len()));
        }
        self.current_face()
    }
}

// ============================================================================
// Notation
// ============================================================================

/// A single die component of a dice expression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiceComponent {
    pub count: u32,
    pub die_type: DieType,
    pub keep_highest: Option<u32>,
    pub keep_lowest: Option<u32>,
}

/// A complete dice expression (e.g., 2d6+3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiceExpression {
    pub components: Vec<DiceComponent>,
    pub modifier: i32,
    pub original: String,
}

impl DiceExpression {
    /// Parse a dice notation string.
    pub fn parse(notation: &str) -> Result<Self, DiceError> {
        let notation = notation.trim().to_lowercase();
        if notation.is_empty() {
            return Err(DiceError::NoDice);
        }

        let mut components = Vec::new();
        let mut modifier: i32 = 0;
        let mut current = String::new();
        let mut sign: i32 = 1;

        for ch in notation.chars() {
            match ch {
                '+' | '-' => {
                    if !current.is_empty() {
                        Self::parse_term(&current, sign, &mut components, &mut modifier)?;
                        current.clear();
                    }
                    sign = if ch == '+' { 1 } else { -1 };
                }
                ' ' => continue,
                _ => current.push(ch),
            }
        }

        if !current.is_empty() {
            Self::parse_term(&current, sign, &mut components, &mut modifier)?;
        }

        if components.is_empty() {
            return Err(DiceError::NoDice);
        }

        Ok(DiceExpression {
            components,
            modifier,
            original: notation,
        })
    }

    fn parse_term(
        term: &str,
        sign: i32,
        components: &mut Vec<DiceComponent>,
        modifier: &mut i32,
    ) -> Result<(), DiceError> {
        let invalid = || DiceError::InvalidNotation(term.to_string());

        let Some((count_str, rest)) = term.split_once('d') else {
            let value: i32 = term.parse().map_err(|_| invalid())?;
            *modifier = value
                .checked_mul(sign)
                .and_then(|v| modifier.checked_add(v))
                .ok_or_else(invalid)?;
            return Ok(());
        };

        let count: u32 = if count_str.is_empty() {
            1
        } else {
            count_str.parse().map_err(|_| invalid())?
        };
        if count > MAX_DICE {
            return Err(DiceError::TooManyDice(count));
        }

        let (sides_str, keep_highest, keep_lowest) =
            if let Some((sides, keep)) = rest.split_once("kh") {
                (sides, Some(keep.parse().map_err(|_| invalid())?), None)
            } else if let Some((sides, keep)) = rest.split_once("kl") {
                (sides, None, Some(keep.parse().map_err(|_| invalid())?))
            } else {
                (rest, None, None)
            };

        let sides: u32 = sides_str.parse().map_err(|_| invalid())?;
        let die_type = DieType::try_from(sides)?;

        if let Some(keep) = keep_highest.or(keep_lowest) {
            if keep > count {
                return Err(DiceError::InvalidKeepCount {
                    keep,
                    count,
                    notation: term.to_string(),
                });
            }
        }

        components.push(DiceComponent {
            count,
            die_type,
            keep_highest,
            keep_lowest,
        });
        Ok(())
    }

    pub fn roll(&self) -> RollResult {
        self.roll_with_rng(&mut rand::thread_rng())
    }

    /// Roll with a specific RNG (useful for testing).
    pub fn roll_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) -> RollResult {
        let component_results: Vec<ComponentResult> = self
            .components
            .iter()
            .map(|component| {
                let rolls: Vec<u32> = (0..component.count)
                    .map(|_| component.die_type.roll_with_rng(rng))
                    .collect();

                let mut kept = rolls.clone();
                if let Some(keep) = component.keep_highest {
                    kept.sort_by(|a, b| b.cmp(a));
                    kept.truncate(keep as usize);
                } else if let Some(keep) = component.keep_lowest {
                    kept.sort();
                    kept.truncate(keep as usize);
                }

                ComponentResult {
                    die_type: component.die_type,
                    subtotal: kept.iter().sum(),
                    rolls,
                    kept,
                }
            })
            .collect();

        let dice_total: i64 = component_results
            .iter()
            .map(|c| i64::from(c.subtotal))
            .sum();
        let total = (dice_total + i64::from(self.modifier))
            .clamp(i64::from(i32::MIN), i64::from(i32::MAX));

        RollResult {
            total: total as i32,
            modifier: self.modifier,
            component_results,
        }
    }
}

impl FromStr for DiceExpression {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DiceExpression::parse(s)
    }
}

impl fmt::Display for DiceExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.original)
    }
}

/// Result of rolling a single dice component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentResult {
    pub die_type: DieType,
    pub rolls: Vec<u32>,
    pub kept: Vec<u32>,
    pub subtotal: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollResult {
    pub component_results: Vec<ComponentResult>,
    pub modifier: i32,
    pub total: i32,
}

impl fmt::Display for RollResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .component_results
            .iter()
            .map(|c| {
                let shown: Vec<String> = c.rolls.iter().map(|r| r.to_string()).collect();
                format!("[{}]", shown.join(", "))
            })
            .collect();
        write!(f, "{}", parts.join(" + "))?;
        match self.modifier {
            0 => {}
            m if m > 0 => write!(f, " + {m}")?,
            m => write!(f, " - {}", m.abs())?,
        }
        write!(f, " = {}", self.total)
    }
}

/// Parse and roll in one step.
pub fn roll(notation: &str) -> Result<RollResult, DiceError> {
    Ok(DiceExpression::parse(notation)?.roll())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_catalog_has_eight_dice() {
        assert_eq!(DieType::ALL.len(), 8);
        assert_eq!(DieType::ALL[0].to_string(), "D3");
        assert_eq!(DieType::ALL[7].to_string(), "D100");
    }

    #[test]
    fn test_die_type_serializes_as_number() {
        assert_eq!(serde_json::to_string(&DieType::D12).unwrap(), "12");
        assert_eq!(serde_json::from_str::<DieType>("3").unwrap(), DieType::D3);
        assert!(serde_json::from_str::<DieType>("7").is_err());
    }

    #[test]
    fn test_die_type_from_str() {
        assert_eq!("d20".parse::<DieType>().unwrap(), DieType::D20);
        assert_eq!("D6".parse::<DieType>().unwrap(), DieType::D6);
        assert_eq!("100".parse::<DieType>().unwrap(), DieType::D100);
        assert!("d7".parse::<DieType>().is_err());
    }

    #[test]
    fn test_parse_with_modifier() {
        let expr = DiceExpression::parse("2d6+3").unwrap();
        assert_eq!(expr.components[0].count, 2);
        assert_eq!(expr.components[0].die_type, DieType::D6);
        assert_eq!(expr.modifier, 3);

        let expr = DiceExpression::parse("1d3-1").unwrap();
        assert_eq!(expr.modifier, -1);
    }

    #[test]
    fn test_parse_keep() {
        let expr = DiceExpression::parse("4d6kh3").unwrap();
        assert_eq!(expr.components[0].keep_highest, Some(3));

        assert!(matches!(
            DiceExpression::parse("4d6kh5"),
            Err(DiceError::InvalidKeepCount { keep: 5, count: 4, .. })
        ));
        assert!(DiceExpression::parse("4d6kh4").is_ok());
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(DiceExpression::parse(""), Err(DiceError::NoDice)));
        assert!(matches!(DiceExpression::parse("5"), Err(DiceError::NoDice)));
        assert!(matches!(
            DiceExpression::parse("1d7"),
            Err(DiceError::InvalidDieSize(7))
        ));
        assert!(DiceExpression::parse("xd6").is_err());
    }

    #[test]
    fn test_modifier_overflow_is_rejected() {
        assert!(matches!(
            DiceExpression::parse("1d6+2147483647+1"),
            Err(DiceError::InvalidNotation(_))
        ));
        assert!(matches!(
            DiceExpression::parse("1d6-2147483647-2"),
            Err(DiceError::InvalidNotation(_))
        ));
        let expr = DiceExpression::parse("1d6+2147483647").unwrap();
        assert_eq!(expr.modifier, i32::MAX);
        assert_eq!(expr.roll().total, i32::MAX);
    }

    #[test]
    fn test_dice_count_is_capped() {
        assert!(matches!(
            DiceExpression::parse("4000000000d100"),
            Err(DiceError::TooManyDice(4_000_000_000))
        ));
        assert!(matches!(
            DiceExpression::parse("1001d6"),
            Err(DiceError::TooManyDice(1001))
        ));
        let expr = DiceExpression::parse("1000d100").unwrap();
        let result = expr.roll_with_rng(&mut StdRng::seed_from_u64(5));
        assert_eq!(result.component_results[0].rolls.len(), 1000);
        assert!(result.total >= 1000 && result.total <= 100_000);
    }

    #[test]
    fn test_keep_highest_roll() {
        let expr = DiceExpression::parse("4d6kh3").unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let result = expr.roll_with_rng(&mut rng);
            let c = &result.component_results[0];
            assert_eq!(c.rolls.len(), 4);
            assert_eq!(c.kept.len(), 3);
            let dropped = *c.rolls.iter().min().unwrap();
            assert_eq!(c.subtotal, c.rolls.iter().sum::<u32>() - dropped);
        }
    }

    #[test]
    fn test_roll_range() {
        for _ in 0..100 {
            let result = roll("1d20+5").unwrap();
            assert!(result.total >= 6 && result.total <= 25);
        }
    }

    #[test]
    fn test_tray_locked_dice_keep_value() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut tray = DiceTray::new();
        let first = tray.add(DieType::D6).id.clone();
        tray.add(DieType::D20);
        assert_eq!(tray.total(), 0);

        tray.roll_with_rng(&mut rng);
        let kept = tray.dice()[0].value;
        assert!(tray.toggle_lock(&first));

        for _ in 0..20 {
            tray.roll_with_rng(&mut rng);
            assert_eq!(tray.dice()[0].value, kept);
        }
        let total: u32 = tray.dice().iter().filter_map(|d| d.value).sum();
        assert_eq!(tray.total(), total);

        assert!(tray.remove(&first));
        assert!(!tray.remove(&first));
        assert_eq!(tray.dice().len(), 1);
    }

    #[test]
    fn test_custom_die_rolls_to_a_face() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut die = CustomDie::new(
            "Weather",
            vec![
                CustomDieFace::new("sun").with_color("#fbbf24"),
                CustomDieFace::new("rain"),
            ],
        );
        assert!(die.current_face().is_none());

        let face = die.roll_with_rng(&mut rng).cloned().unwrap();
        assert!(face.value == "sun" || face.value == "rain");

        die.is_locked = true;
        let index = die.current_face_index;
        die.roll_with_rng(&mut rng);
        assert_eq!(die.current_face_index, index);

        let mut blank = CustomDie::new("Blank", vec![]);
        assert!(blank.roll_with_rng(&mut rng).is_none());
    }
}
