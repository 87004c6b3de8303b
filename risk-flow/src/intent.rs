//! Keyword scorer deciding which prediction the user is asking about.

use serde::{Deserialize, Serialize};

use crate::schema::Domain;

const DELAY_KEYWORDS: &[&str] = &[
    "delay", "late", "time", "schedule", "timeline", "duration", "on time",
];

const COST_KEYWORDS: &[&str] = &[
    "cost", "overrun", "budget", "expense", "spending", "financial",
];

const HELP_KEYWORDS: &[&str] = &["help", "what can"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    Predict(Domain),
    Unknown,
}

/// Number of distinct keywords contained anywhere in `lowered`
fn score(lowered: &str, keywords: &[&str]) -> usize {
    keywords.iter().filter(|kw| lowered.contains(*kw)).count()
}

/// Pick the domain with the strictly higher keyword score; ties are `Unknown`.
pub fn classify(text: &str) -> Intent {
    let lowered = text.to_lowercase();
    let delay = score(&lowered, DELAY_KEYWORDS);
    let cost = score(&lowered, COST_KEYWORDS);

    if delay > cost {
        Intent::Predict(Domain::Delay)
    } else if cost > delay {
        Intent::Predict(Domain::CostOverrun)
    } else {
        Intent::Unknown
    }
}

pub fn is_help_request(text: &str) -> bool {
    let lowered = text.to_lowercase();
    HELP_KEYWORDS.iter().any(|kw| lowered.contains(kw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_domain_questions() {
        assert_eq!(
            classify("Will this project be delayed?"),
            Intent::Predict(Domain::Delay)
        );
        assert_eq!(
            classify("Check cost overrun"),
            Intent::Predict(Domain::CostOverrun)
        );
        assert_eq!(
            classify("BUDGET overrun prediction"),
            Intent::Predict(Domain::CostOverrun)
        );
    }

    #[test]
    fn test_ties_are_unknown() {
        assert_eq!(classify("there is a schedule and budget risk"), Intent::Unknown);
        assert_eq!(classify("hello there"), Intent::Unknown);
        assert_eq!(classify(""), Intent::Unknown);
    }

    // "on time" also contains "time", so it scores twice.
    #[test]
    fn test_substring_matching_counts_overlaps() {
        assert_eq!(score("is it on time", DELAY_KEYWORDS), 2);
        assert_eq!(
            classify("on time despite the cost"),
            Intent::Predict(Domain::Delay)
        );
    }

    #[test]
    fn test_repeated_keyword_counts_once() {
        assert_eq!(score("cost cost cost", COST_KEYWORDS), 1);
        assert_eq!(classify("cost cost cost late timeline"), Intent::Predict(Domain::Delay));
    }

    #[test]
    fn test_help_detection() {
        assert!(is_help_request("Help me"));
        assert!(is_help_request("what can you do?"));
        assert!(!is_help_request("hi"));
    }
}
