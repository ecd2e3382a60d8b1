//! Denylist safety gate

use log::debug;

/// Unsafe-topic terms. Matching is plain substring containment,
/// so "nonviolence" is blocked too (known false positive).
pub const DENYLIST: [&str; 3] = ["suicide", "violence", "weapon"];

const HARD_STOP_MESSAGE: &str
  = "Your safety matters. I cannot assist with that request.";

/// Returns `false` if any denylisted term appears anywhere
/// in `text`, ignoring case.
pub fn is_safe(text: &str) -> bool
{   let lowered = text.to_lowercase();
    match DENYLIST.iter().find(|term| lowered.contains(*term))
    {   Some(term) => {
          debug!("Safety gate matched term: {}", term);
          false
        }
      , None => true
    }
}

/// Fixed refusal returned for blocked input
pub fn hard_stop_message() -> &'static str
{   HARD_STOP_MESSAGE
}

#[cfg(test)]
mod tests
{   use super::*;

    #[test]
    fn test_blocks_case_insensitively()
    {   assert!(!is_safe("Talking about VIOLENCE here"));
        assert!(!is_safe("a Weapon"));
    }

    #[test]
    fn test_substring_over_blocks()
    {   assert!(!is_safe("I believe in nonviolence"));
    }

    #[test]
    fn test_allows_ordinary_text()
    {   assert!(is_safe("I feel tired after work"));
        assert!(is_safe(""));
    }
}
