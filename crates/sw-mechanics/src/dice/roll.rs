//! Dice roll results and aggregation.

use serde::{Deserialize, Serialize};

use super::Die;

/// The result of rolling a single die.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DieResult {
    /// The type of die that was rolled.
    pub die: Die,
    /// The value rolled (1 to die.sides()).
    pub value: u32,
    /// False when a keep-highest pool discarded this die.
    pub kept: bool,
}

/// The result of evaluating a formula.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollResult {
    /// The normalized formula that was evaluated.
    pub formula: String,
    /// Every die rolled, in roll order, including discarded ones.
    pub dice: Vec<DieResult>,
    /// Signed total of kept dice, constants, and bindings.
    pub total: i32,
}

impl RollResult {
    /// Values of the dice that count toward the total.
    pub fn kept_values(&self) -> Vec<u32> {
        self.dice
            .iter()
            .filter(|d| d.kept)
            .map(|d| d.value)
            .collect()
    }

    /// The highest single die value, or 0 if no dice were rolled.
    pub fn highest(&self) -> u32 {
        self.dice.iter().map(|d| d.value).max().unwrap_or(0)
    }

    /// Number of dice rolled.
    pub fn count(&self) -> usize {
        self.dice.len()
    }
}

impl std::fmt::Display for RollResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let values: Vec<String> = self
            .dice
            .iter()
            .map(|d| {
                if d.kept {
                    d.value.to_string()
                } else {
                    format!("~{}", d.value)
                }
            })
            .collect();
        write!(f, "{} = [{}] = {}", self.formula, values.join(", "), self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_result(values: &[(u32, bool)], total: i32) -> RollResult {
        RollResult {
            formula: "3d6kh2".to_string(),
            dice: values
                .iter()
                .map(|&(value, kept)| DieResult {
                    die: Die::D6,
                    value,
                    kept,
                })
                .collect(),
            total,
        }
    }

    #[test]
    fn kept_values_skip_dropped_dice() {
        let r = make_result(&[(3, true), (1, false), (6, true)], 9);
        assert_eq!(r.kept_values(), vec![3, 6]);
        assert_eq!(r.highest(), 6);
        assert_eq!(r.count(), 3);
    }

    #[test]
    fn empty_result() {
        let r = RollResult {
            formula: "5".to_string(),
            dice: Vec::new(),
            total: 5,
        };
        assert_eq!(r.highest(), 0);
        assert_eq!(r.count(), 0);
    }

    #[test]
    fn display_marks_dropped_dice() {
        let r = make_result(&[(3, true), (1, false), (6, true)], 9);
        insta::assert_snapshot!(r.to_string(), @"3d6kh2 = [3, ~1, 6] = 9");
    }
}
