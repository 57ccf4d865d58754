//! Electrical-industry relevance heuristic for externally sourced listings.
//!
//! Aggregated job boards return plenty of adjacent trades. A listing is kept
//! when its title carries a strong electrical signal that is not preceded by
//! another trade, or, failing that, when it names no other trade and mentions
//! an electrical keyword somewhere in the title or description.

/// Terms that mark a title as electrical on their own.
const TITLE_PRIORITY_TERMS: &[&str] = &[
    "electric",
    "sparky",
    "solar",
    "fire alarm",
    "security engineer",
];

/// Matched only at the very start of the title ("EV Charger Installer").
const LEADING_EV: &str = "ev ";

const EXCLUDED_TRADES: &[&str] = &[
    "joiner",
    "carpenter",
    "plumber",
    "plumbing",
    "gas engineer",
    "gas safe",
    "heating engineer",
    "bricklayer",
    "plasterer",
    "roofer",
    "painter",
    "decorator",
    "tiler",
    "glazier",
    "scaffolder",
    "welder",
    "fabricator",
    "landscaper",
    "gardener",
    "groundworker",
    "cleaner",
    "chef",
    "hgv driver",
    "van driver",
    "security officer",
    "security guard",
    "door supervisor",
];

const ELECTRICAL_KEYWORDS: &[&str] = &[
    "electrician",
    "electrical",
    "electric",
    "sparky",
    "wiring",
    "rewire",
    "rewiring",
    "18th edition",
    "bs 7671",
    "bs7671",
    "ecs card",
    "consumer unit",
    "distribution board",
    "switchgear",
    "testing and inspection",
    "inspection and testing",
    "fixed wire",
    "pat testing",
    "fire alarm",
    "emergency lighting",
    "ev charger",
    "ev charging",
    "charge point",
    "solar pv",
    "photovoltaic",
    "battery storage",
    "data cabling",
    "structured cabling",
    "containment",
    "access control",
    "intruder alarm",
    "building services",
];

/// Short terms that only count as whole words ("jib" but not "jibe").
const WHOLE_WORD_KEYWORDS: &[&str] = &["eicr", "jib", "am2", "cctv", "m&e"];

fn contains_word(haystack: &str, word: &str) -> bool {
    haystack.match_indices(word).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + word.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

fn earliest_position(haystack: &str, terms: &[&str]) -> Option<usize> {
    terms.iter().filter_map(|term| haystack.find(term)).min()
}

fn electrical_signal_position(title: &str) -> Option<usize> {
    let leading_ev = title.starts_with(LEADING_EV).then_some(0);
    [earliest_position(title, TITLE_PRIORITY_TERMS), leading_ev]
        .into_iter()
        .flatten()
        .min()
}

/// Classifies a listing. Inputs are matched case-insensitively.
pub fn is_electrical_job(title: &str, description: &str) -> bool {
    let title = title.trim().to_lowercase();

    let excluded_at = earliest_position(&title, EXCLUDED_TRADES);

    if let Some(electrical_at) = electrical_signal_position(&title) {
        // First-mentioned trade wins.
        return match excluded_at {
            Some(excluded_at) => excluded_at > electrical_at,
            None => true,
        };
    }

    if excluded_at.is_some() {
        return false;
    }

    let text = format!("{} {}", title, description.to_lowercase());
    ELECTRICAL_KEYWORDS.iter().any(|keyword| text.contains(keyword))
        || WHOLE_WORD_KEYWORDS
            .iter()
            .any(|keyword| contains_word(&text, keyword))
}
