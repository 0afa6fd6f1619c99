//! Dice randomness seam and roll request validation.
//!
//! Production rolls through the thread RNG. Tests inject a seeded or a
//! fixed-sequence roller so totals are predictable.

use std::ops::RangeInclusive;

use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::errors::domain::{DomainError, ValidationKind};

pub const ALLOWED_DICE: [i32; 7] = [4, 6, 8, 10, 12, 20, 100];
pub const MODIFIER_RANGE: RangeInclusive<i32> = -100..=100;
pub const DICE_COUNT_RANGE: RangeInclusive<i32> = 1..=100;
pub const INTENTION_MAX_CHARS: usize = 64;
pub const REASON_MAX_CHARS: usize = 500;

pub trait DiceRoller: Send + Sync {
    /// `count` faces, each in `1..=sides`.
    fn roll(&self, sides: u32, count: u32) -> Vec<i32>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngRoller;

impl DiceRoller for ThreadRngRoller {
    fn roll(&self, sides: u32, count: u32) -> Vec<i32> {
        let mut rng = rand::rng();
        (0..count)
            .map(|_| rng.random_range(1..=sides) as i32)
            .collect()
    }
}

/// Reproducible rolls from a fixed seed.
#[derive(Debug)]
pub struct SeededRoller {
    rng: Mutex<ChaCha8Rng>,
}

impl SeededRoller {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }
}

impl DiceRoller for SeededRoller {
    fn roll(&self, sides: u32, count: u32) -> Vec<i32> {
        let mut rng = self.rng.lock();
        (0..count)
            .map(|_| rng.random_range(1..=sides) as i32)
            .collect()
    }
}

/// Replays a fixed list of faces, wrapping around when exhausted. Faces are
/// used as given, without clamping to `sides`.
#[derive(Debug)]
pub struct SequenceRoller {
    values: Vec<i32>,
    index: Mutex<usize>,
}

impl SequenceRoller {
    pub fn new(values: Vec<i32>) -> Self {
        Self {
            values,
            index: Mutex::new(0),
        }
    }
}

impl DiceRoller for SequenceRoller {
    fn roll(&self, _sides: u32, count: u32) -> Vec<i32> {
        if self.values.is_empty() {
            return vec![1; count as usize];
        }
        let mut index = self.index.lock();
        (0..count)
            .map(|_| {
                let face = self.values[*index % self.values.len()];
                *index += 1;
                face
            })
            .collect()
    }
}

pub fn total(faces: &[i32], modifier: i32) -> i32 {
    faces.iter().sum::<i32>() + modifier
}

pub fn validate_modifier(modifier: i32) -> Result<(), DomainError> {
    if MODIFIER_RANGE.contains(&modifier) {
        Ok(())
    } else {
        Err(DomainError::validation(
            ValidationKind::InvalidModifier,
            format!("Modifier must be between -100 and 100, got {modifier}"),
        ))
    }
}

pub fn validate_dice_count(count: i32) -> Result<(), DomainError> {
    if DICE_COUNT_RANGE.contains(&count) {
        Ok(())
    } else {
        Err(DomainError::validation(
            ValidationKind::InvalidDiceCount,
            format!("Dice count must be between 1 and 100, got {count}"),
        ))
    }
}

pub fn validate_dice_type(sides: i32) -> Result<(), DomainError> {
    if ALLOWED_DICE.contains(&sides) {
        Ok(())
    } else {
        Err(DomainError::validation(
            ValidationKind::InvalidDiceType,
            format!("Dice type must be one of {ALLOWED_DICE:?}, got d{sides}"),
        ))
    }
}

/// Trimmed intention, 1 to 64 characters.
pub fn normalize_intention(raw: &str) -> Result<String, DomainError> {
    let trimmed = raw.trim();
    let len = trimmed.chars().count();
    if len == 0 || len > INTENTION_MAX_CHARS {
        return Err(DomainError::validation(
            ValidationKind::InvalidIntention,
            format!("Intention must be 1 to {INTENTION_MAX_CHARS} characters, got {len}"),
        ));
    }
    Ok(trimmed.to_string())
}

/// Optional free-text reason; blank becomes `None`.
pub fn normalize_reason(raw: Option<String>) -> Result<Option<String>, DomainError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.chars().count() > REASON_MAX_CHARS {
        return Err(DomainError::validation(
            ValidationKind::InvalidReason,
            format!("Reason must be at most {REASON_MAX_CHARS} characters"),
        ));
    }
    Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
}
