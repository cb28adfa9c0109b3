//! Field acceptance gate.

use reel_core::{PlanField, Verdict};
use strum::EnumCount;

/// Cursor over the plan fields, in gate order.
///
/// The cursor only moves forward, one field per accepting verdict; a
/// rejection leaves it where it is. Fields behind the cursor are committed.
///
/// # Examples
///
/// ```
/// use reel_core::{PlanField, Verdict};
/// use reel_planning::FieldGate;
///
/// let mut gate = FieldGate::new();
/// gate.advance(&Verdict::accept("YES"));
/// gate.advance(&Verdict::reject("NO, too long"));
/// assert_eq!(gate.current(), Some(PlanField::AudioContent));
/// assert!(gate.is_committed(PlanField::Style));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldGate {
    cursor: usize,
}

impl FieldGate {
    /// Gate positioned on the first field.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cursor position, `0..=PlanField::COUNT`.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Field awaiting a verdict, `None` once every field passed.
    pub fn current(&self) -> Option<PlanField> {
        PlanField::at(self.cursor)
    }

    /// Whether every field passed.
    pub fn is_complete(&self) -> bool {
        self.cursor >= PlanField::COUNT
    }

    /// Whether `field` already passed its gate.
    pub fn is_committed(&self, field: PlanField) -> bool {
        field.position() < self.cursor
    }

    /// Apply a verdict on the current field and return the new cursor.
    pub fn advance(&mut self, verdict: &Verdict) -> usize {
        self.cursor = next_cursor(self.cursor, verdict);
        self.cursor
    }
}

/// Gate transition: accept moves one field forward, reject stays.
pub fn next_cursor(cursor: usize, verdict: &Verdict) -> usize {
    if verdict.accepted && cursor < PlanField::COUNT {
        cursor + 1
    } else {
        cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_never_decreases_and_stops_at_end() {
        let mut gate = FieldGate::new();
        let verdicts = [true, false, false, true, true, false, true, true, true];
        let mut last = 0;
        for accepted in verdicts {
            let verdict = if accepted {
                Verdict::accept("YES")
            } else {
                Verdict::reject("NO")
            };
            let cursor = gate.advance(&verdict);
            assert!(cursor >= last);
            if !accepted {
                assert_eq!(cursor, last);
            }
            last = cursor;
        }
        assert!(gate.is_complete());
        assert_eq!(gate.cursor(), PlanField::COUNT);
        assert_eq!(gate.current(), None);
    }
}
