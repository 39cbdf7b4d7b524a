//! Tuplet groups: `(n` compresses the next `n` notes, chords or rests.
//!
//! The time the group occupies comes from a fixed table:
//!
//! | count | units of time |
//! |-------|---------------|
//! | 2, 3  | 2             |
//! | 4-7   | 4             |
//! | 8, 9  | 8             |
//! | other | `n * 2 / 3`   |
//!
//! Each member's resolved duration is multiplied by `units / n`, then
//! rounded to whole steps (minimum one). An optional `:m:k` suffix is
//! accepted and ignored.

/// An open tuplet group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tuplet {
    remaining: u32,
    factor: f64,
}

impl Tuplet {
    /// Start a group of `count` members. `None` for a zero count.
    pub fn new(count: u32) -> Option<Self> {
        if count == 0 {
            return None;
        }
        Some(Self {
            remaining: count,
            factor: tuplet_units(count) as f64 / count as f64,
        })
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Consume one member slot and return the scale factor for it.
    pub fn next_member(&mut self) -> f64 {
        self.remaining = self.remaining.saturating_sub(1);
        self.factor
    }

    pub fn is_finished(&self) -> bool {
        self.remaining == 0
    }
}

/// Units of time a group of `count` notes occupies.
pub fn tuplet_units(count: u32) -> u32 {
    match count {
        2 | 3 => 2,
        4..=7 => 4,
        8 | 9 => 8,
        n => (u64::from(n) * 2 / 3) as u32,
    }
}

/// Scale a member's duration, rounding to whole steps.
pub fn scale_duration(duration: f64, factor: f64) -> f64 {
    (duration * factor).round().max(1.0)
}

/// Parse a tuplet opener whose `(` sits at `open`.
///
/// Returns the group (if the count is usable) and the index after the
/// opener, including any ignored `:m:k` ratio suffix.
pub fn parse_tuplet(chars: &[char], open: usize) -> (Option<Tuplet>, usize) {
    let mut j = open + 1;
    let digits_start = j;
    while chars.get(j).is_some_and(|c| c.is_ascii_digit()) {
        j += 1;
    }
    let digits: String = chars[digits_start.min(j)..j].iter().collect();

    for _ in 0..2 {
        if chars.get(j) != Some(&':') {
            break;
        }
        j += 1;
        while chars.get(j).is_some_and(|c| c.is_ascii_digit()) {
            j += 1;
        }
    }

    let tuplet = digits.parse::<u32>().ok().and_then(Tuplet::new);
    (tuplet, j)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units_table() {
        assert_eq!(tuplet_units(2), 2);
        assert_eq!(tuplet_units(3), 2);
        assert_eq!(tuplet_units(5), 4);
        assert_eq!(tuplet_units(7), 4);
        assert_eq!(tuplet_units(9), 8);
        assert_eq!(tuplet_units(10), 6);
        assert_eq!(tuplet_units(1), 0);
    }

    #[test]
    fn test_units_for_huge_count() {
        assert_eq!(tuplet_units(u32::MAX), 2_863_311_530);
        let factor = Tuplet::new(3_000_000_000).unwrap().factor();
        assert!((factor - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_triplet_of_quarters() {
        let mut triplet = Tuplet::new(3).unwrap();
        let factor = triplet.next_member();
        // Three quarters (4 steps) in the time of two
        assert_eq!(scale_duration(4.0, factor), 3.0);
        triplet.next_member();
        assert!(!triplet.is_finished());
        triplet.next_member();
        assert!(triplet.is_finished());
    }

    #[test]
    fn test_scale_never_below_one_step() {
        let factor = Tuplet::new(1).unwrap().factor();
        assert_eq!(scale_duration(2.0, factor), 1.0);
    }

    #[test]
    fn test_parse_tuplet_with_ratio() {
        let chars: Vec<char> = "(3:2:3abc".chars().collect();
        let (tuplet, next) = parse_tuplet(&chars, 0);
        assert_eq!(tuplet.map(|t| t.factor()), Some(2.0 / 3.0));
        assert_eq!(next, 6);
    }

    #[test]
    fn test_parse_tuplet_plain_and_zero() {
        let chars: Vec<char> = "(5abcde".chars().collect();
        let (tuplet, next) = parse_tuplet(&chars, 0);
        assert_eq!(tuplet.map(|t| t.factor()), Some(0.8));
        assert_eq!(next, 2);

        let zero: Vec<char> = "(0abc".chars().collect();
        let (tuplet, next) = parse_tuplet(&zero, 0);
        assert!(tuplet.is_none());
        assert_eq!(next, 2);
    }
}
