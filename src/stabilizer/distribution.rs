use std::collections::BTreeMap;

/// Class label to probability.
///
/// Ordered by label so every scan over a distribution visits labels in the same
/// (lexicographic) order regardless of how the payload was serialized.
pub type ClassDistribution = BTreeMap<String, f64>;

/// Sentinel below any real probability; an empty scan keeps it.
const NO_WINNER: f64 = -1.0;

/// Highest-probability label, or `None` for an empty distribution.
///
/// Ties go to the first label in iteration order, i.e. the lexicographically
/// smallest one, because the scan only replaces the winner on a strict `>`.
pub fn top_label(probs: &ClassDistribution) -> Option<(&str, f64)> {
    let mut best: Option<&str> = None;
    let mut best_value = NO_WINNER;
    for (label, value) in probs {
        if *value > best_value {
            best = Some(label.as_str());
            best_value = *value;
        }
    }
    best.map(|label| (label, best_value))
}

/// Sum of all probabilities in the distribution.
pub fn total(probs: &ClassDistribution) -> f64 {
    probs.values().sum()
}

/// Entries sorted by descending probability, ties broken by label.
pub fn ranked(probs: &ClassDistribution) -> Vec<(&str, f64)> {
    let mut entries: Vec<(&str, f64)> = probs
        .iter()
        .map(|(label, value)| (label.as_str(), *value))
        .collect();
    entries.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    entries
}

#[cfg(test)]
pub(crate) fn dist(entries: &[(&str, f64)]) -> ClassDistribution {
    entries
        .iter()
        .map(|(label, value)| ((*label).to_string(), *value))
        .collect()
}
