//! Chore minigame progress counter.
//!
//! The minigame itself is presentation; the simulation only needs to know
//! whether the required number of steps was reached.
use serde::{Deserialize, Serialize};

use crate::constants::{EARNING_CHORE_STEPS, PUNISHMENT_CHORE_STEPS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChoreKind {
    /// Paid household chore.
    Earning,
    /// Unpaid chore owed while grounded, twice as long.
    Punishment,
}

impl ChoreKind {
    #[must_use]
    pub const fn for_grounding(grounded: bool) -> Self {
        if grounded {
            Self::Punishment
        } else {
            Self::Earning
        }
    }

    #[must_use]
    pub const fn required_steps(self) -> u32 {
        match self {
            Self::Earning => EARNING_CHORE_STEPS,
            Self::Punishment => PUNISHMENT_CHORE_STEPS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoreProgress {
    pub kind: ChoreKind,
    pub required: u32,
    pub current: u32,
}

impl ChoreProgress {
    #[must_use]
    pub const fn new(kind: ChoreKind) -> Self {
        Self {
            kind,
            required: kind.required_steps(),
            current: 0,
        }
    }

    /// Record one step. Returns whether the chore is now complete.
    pub fn step(&mut self) -> bool {
        self.current = (self.current + 1).min(self.required);
        self.is_complete()
    }

    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.current >= self.required
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn punishment_chores_take_twice_as_long() {
        let mut earning = ChoreProgress::new(ChoreKind::for_grounding(false));
        let mut punishment = ChoreProgress::new(ChoreKind::for_grounding(true));
        assert_eq!(punishment.required, earning.required * 2);

        for _ in 0..24 {
            assert!(!earning.step());
        }
        assert!(earning.step());
        assert!(earning.step(), "extra steps stay complete");
        assert_eq!(earning.current, 25);

        for _ in 0..49 {
            punishment.step();
        }
        assert!(!punishment.is_complete());
        assert!(punishment.step());
    }
}
