use crate::oracle::duplicates::FindDuplicatesOracle;
use crate::oracle::fibonacci::FibonacciOracle;
use crate::oracle::sum_first_n::SumFirstNOracle;
use crate::oracle::Oracle;
use once_cell::sync::Lazy;
use std::collections::HashMap;

static FIBONACCI: FibonacciOracle = FibonacciOracle;
static SUM_FIRST_N: SumFirstNOracle = SumFirstNOracle;
static FIND_DUPLICATES: FindDuplicatesOracle = FindDuplicatesOracle;

/// Intent label -> oracle. Read-only after first use.
static REGISTRY: Lazy<HashMap<&'static str, &'static dyn Oracle>> = Lazy::new(|| {
    let mut registry: HashMap<&'static str, &'static dyn Oracle> = HashMap::new();
    registry.insert("fibonacci", &FIBONACCI);
    // Upstream generators label unclassified requests "general"; they are
    // overwhelmingly sequence prompts.
    registry.insert("general", &FIBONACCI);
    registry.insert("sum_first_n", &SUM_FIRST_N);
    registry.insert("find_duplicates", &FIND_DUPLICATES);
    registry
});

pub fn lookup(intent: &str) -> Option<&'static dyn Oracle> {
    let registry: &'static HashMap<&'static str, &'static dyn Oracle> = &REGISTRY;
    registry.get(intent).copied()
}

/// Registered intent labels, sorted
pub fn intents() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = REGISTRY.keys().copied().collect();
    names.sort_unstable();
    names
}
