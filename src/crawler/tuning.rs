//! Adaptive term-length tuning
//!
//! Longer query terms match fewer tracks. A session that found nothing gets a
//! shorter term next time; one that filled more than half its pick target gets
//! a longer one.

/// Computes a session's term length for the next tick
///
/// # Arguments
///
/// * `current` - The term length used this tick
/// * `picked` - Number of items picked this tick
/// * `target` - The per-search pick target
pub fn adapt_term_length(current: u32, picked: usize, target: usize) -> u32 {
    if picked == 0 {
        current.saturating_sub(1).max(1)
    } else if picked * 2 > target {
        current.saturating_add(1)
    } else {
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_picks_shortens() {
        assert_eq!(adapt_term_length(5, 0, 5), 4);
        assert_eq!(adapt_term_length(2, 0, 5), 1);
    }

    #[test]
    fn test_floor_is_one() {
        assert_eq!(adapt_term_length(1, 0, 5), 1);
    }

    #[test]
    fn test_more_than_half_lengthens() {
        assert_eq!(adapt_term_length(5, 3, 5), 6);
        assert_eq!(adapt_term_length(5, 5, 5), 6);
    }

    #[test]
    fn test_half_or_less_is_unchanged() {
        assert_eq!(adapt_term_length(5, 1, 5), 5);
        assert_eq!(adapt_term_length(5, 2, 5), 5);
        assert_eq!(adapt_term_length(5, 2, 4), 5);
    }
}
