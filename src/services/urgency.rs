use crate::db::types::Urgency;

pub(crate) const HIGH_URGENCY_KEYWORDS: &[&str] = &[
    "hazard",
    "danger",
    "dangerous",
    "emergency",
    "urgent",
    "severe",
    "short circuit",
    "short-circuit",
    "exposed wire",
    "naked wire",
    "fire",
    "burning",
    "smoke",
    "spark",
    "electric shock",
    "electrocution",
    "flooding",
    "flood",
    "leak",
    "gas leak",
    "no water",
    "no electricity",
    "broken glass",
    "injury",
    "injured",
    "health",
    "safety",
    "risk",
    "immediate",
    "critical",
    "serious",
];

/// Substring match, so "sparks" and "leaking" count.
pub(crate) fn contains_high_urgency_keyword(text: &str) -> bool {
    let lowered = text.to_lowercase();
    HIGH_URGENCY_KEYWORDS.iter().any(|keyword| lowered.contains(keyword))
}

/// Final urgency for a complaint. A keyword can only raise the AI judgment,
/// never lower it; without an AI judgment the keywords decide alone.
pub(crate) fn reconcile_urgency(
    text: &str,
    ai_completed: bool,
    urgency_from_ai: Option<Urgency>,
) -> Urgency {
    let keyword_high = contains_high_urgency_keyword(text);

    match (ai_completed, urgency_from_ai) {
        (true, Some(Urgency::Low)) if keyword_high => Urgency::High,
        (true, Some(urgency)) => urgency,
        _ if keyword_high => Urgency::High,
        _ => Urgency::Low,
    }
}
