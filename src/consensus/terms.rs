//! Domain term extraction.
//!
//! A fixed automotive vocabulary in four categories. Multi-word terms match
//! on whole words only, so "coil" never matches inside "recoil".

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Term category used for per-category structural similarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Component,
    Symptom,
    Action,
    Code,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Component,
        Category::Symptom,
        Category::Action,
        Category::Code,
    ];
}

/// Canonical term followed by the surface forms that count as it.
type Vocabulary = &'static [(&'static str, &'static [&'static str])];

const COMPONENTS: Vocabulary = &[
    ("spark plug", &["spark plug", "spark plugs"]),
    ("ignition coil", &["ignition coil", "ignition coils", "coil pack", "coil packs"]),
    ("fuel injector", &["fuel injector", "fuel injectors", "injector", "injectors"]),
    ("fuel pump", &["fuel pump"]),
    ("fuel filter", &["fuel filter"]),
    ("oxygen sensor", &["oxygen sensor", "oxygen sensors", "o2 sensor", "o2 sensors"]),
    ("mass airflow sensor", &["mass airflow sensor", "mass air flow sensor", "maf sensor", "maf"]),
    ("catalytic converter", &["catalytic converter", "catalytic converters", "cat converter"]),
    ("throttle body", &["throttle body"]),
    ("egr valve", &["egr valve"]),
    ("pcv valve", &["pcv valve"]),
    ("thermostat", &["thermostat"]),
    ("water pump", &["water pump"]),
    ("radiator", &["radiator"]),
    ("alternator", &["alternator"]),
    ("battery", &["battery"]),
    ("starter", &["starter", "starter motor"]),
    ("timing belt", &["timing belt"]),
    ("timing chain", &["timing chain"]),
    ("serpentine belt", &["serpentine belt", "drive belt"]),
    ("brake pad", &["brake pad", "brake pads"]),
    ("brake rotor", &["brake rotor", "brake rotors", "rotor", "rotors"]),
    ("brake caliper", &["brake caliper", "brake calipers", "caliper", "calipers"]),
    ("brake fluid", &["brake fluid"]),
    ("brake line", &["brake line", "brake lines"]),
    ("master cylinder", &["master cylinder"]),
    ("abs module", &["abs module"]),
    ("wheel speed sensor", &["wheel speed sensor", "wheel speed sensors"]),
    ("camshaft position sensor", &["camshaft position sensor", "cam sensor"]),
    ("crankshaft position sensor", &["crankshaft position sensor", "crank sensor"]),
    ("knock sensor", &["knock sensor"]),
    ("vacuum hose", &["vacuum hose", "vacuum hoses", "vacuum line", "vacuum leak"]),
    ("intake manifold", &["intake manifold"]),
    ("head gasket", &["head gasket"]),
    ("gas cap", &["gas cap", "fuel cap"]),
    ("evap system", &["evap system", "evap canister", "purge valve"]),
    ("transmission", &["transmission"]),
    ("torque converter", &["torque converter"]),
    ("clutch", &["clutch"]),
    ("coolant", &["coolant", "antifreeze"]),
    ("engine oil", &["engine oil", "oil level"]),
    ("airbag", &["airbag", "air bag"]),
];

const SYMPTOMS: Vocabulary = &[
    ("misfire", &["misfire", "misfires", "misfiring"]),
    ("rough idle", &["rough idle", "idles rough", "rough idling"]),
    ("stalling", &["stall", "stalls", "stalling"]),
    ("hesitation", &["hesitation", "hesitates", "stumble", "stumbles"]),
    ("knocking", &["knock", "knocking", "pinging"]),
    ("overheating", &["overheat", "overheats", "overheating"]),
    ("hard start", &["hard start", "hard starting", "cranks but"]),
    ("no start", &["no start", "won't start", "will not start"]),
    ("check engine light", &["check engine light", "cel", "mil"]),
    ("poor fuel economy", &["poor fuel economy", "bad fuel economy", "low mpg"]),
    ("loss of power", &["loss of power", "lack of power", "power loss"]),
    ("vibration", &["vibration", "vibrates", "shaking"]),
    ("grinding", &["grinding", "grinds"]),
    ("squealing", &["squeal", "squeals", "squealing", "squeak"]),
    ("leak", &["leak", "leaks", "leaking"]),
    ("smoke", &["smoke", "smoking"]),
    ("surging", &["surge", "surges", "surging"]),
    ("lean condition", &["lean condition", "running lean", "system too lean"]),
    ("rich condition", &["rich condition", "running rich", "system too rich"]),
    ("soft pedal", &["soft pedal", "spongy pedal", "spongy brake"]),
];

const ACTIONS: Vocabulary = &[
    ("replace", &["replace", "replacing", "replaced", "replacement"]),
    ("repair", &["repair", "repairing", "fix"]),
    ("inspect", &["inspect", "inspecting", "inspection", "check"]),
    ("clean", &["clean", "cleaning"]),
    ("test", &["test", "testing", "measure"]),
    ("tighten", &["tighten", "tightening", "reseat"]),
    ("reset", &["reset", "clear the code", "clear codes"]),
    ("flush", &["flush", "flushing"]),
    ("bleed", &["bleed", "bleeding"]),
    ("adjust", &["adjust", "adjusting"]),
    ("recharge", &["recharge", "charge the battery"]),
    ("reprogram", &["reprogram", "reflash", "software update"]),
    ("no action", NO_ACTION_FORMS),
];

/// Surface forms meaning nothing needs doing. They embed intervention words
/// ("repair", "fix"), so callers classifying interventions strip them first.
pub(crate) const NO_ACTION_FORMS: &[&str] = &[
    "no action",
    "no repair",
    "no repairs",
    "nothing to fix",
    "nothing to repair",
];

/// Symptom phrases removed before matching actions, so the "check" in
/// "check engine light" never reads as an inspection.
const ACTION_MASKS: &[&str] = &["check engine light", "check engine"];

/// OBD-II style diagnostic trouble code.
static CODE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b[PBCU][0-3][0-9A-F]{3}\b").expect("code regex should compile")
});

/// Domain terms found in one response, split by category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermSet {
    pub components: BTreeSet<String>,
    pub symptoms: BTreeSet<String>,
    pub actions: BTreeSet<String>,
    pub codes: BTreeSet<String>,
}

impl TermSet {
    /// Extract all vocabulary terms and diagnostic codes from `text`.
    ///
    /// # Examples
    ///
    /// ```
    /// use verdict::consensus::terms::TermSet;
    ///
    /// let terms = TermSet::extract("P0301: replace the spark plugs to stop the misfire.");
    /// assert!(terms.components.contains("spark plug"));
    /// assert!(terms.symptoms.contains("misfire"));
    /// assert!(terms.actions.contains("replace"));
    /// assert!(terms.codes.contains("P0301"));
    /// ```
    pub fn extract(text: &str) -> Self {
        let normalized = normalize(text);
        Self {
            components: match_vocabulary(&normalized, COMPONENTS),
            symptoms: match_vocabulary(&normalized, SYMPTOMS),
            actions: match_vocabulary(&strip_phrases(&normalized, ACTION_MASKS), ACTIONS),
            codes: CODE_PATTERN
                .find_iter(text)
                .map(|m| m.as_str().to_ascii_uppercase())
                .collect(),
        }
    }

    pub fn category(&self, category: Category) -> &BTreeSet<String> {
        match category {
            Category::Component => &self.components,
            Category::Symptom => &self.symptoms,
            Category::Action => &self.actions,
            Category::Code => &self.codes,
        }
    }

    /// Every term, tagged with its category.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &str)> + '_ {
        Category::ALL.into_iter().flat_map(move |category| {
            self.category(category)
                .iter()
                .map(move |term| (category, term.as_str()))
        })
    }

    pub fn is_empty(&self) -> bool {
        Category::ALL.iter().all(|c| self.category(*c).is_empty())
    }
}

/// Lower-case and collapse to space-separated words, padded with spaces so
/// whole-word phrases can be found with `contains(" phrase ")`.
///
/// Apostrophes are kept so forms like "won't" survive.
pub(crate) fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push(' ');
    let mut last_space = true;
    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() || c == '\'' {
            out.push(c);
            last_space = false;
        } else if !last_space {
            out.push(' ');
            last_space = true;
        }
    }
    if !last_space {
        out.push(' ');
    }
    out
}

/// Whether a normalized text contains `phrase` as whole words.
pub(crate) fn contains_phrase(normalized: &str, phrase: &str) -> bool {
    normalized.contains(&format!(" {} ", phrase))
}

/// Remove every whole-word occurrence of `phrases` from a normalized text.
pub(crate) fn strip_phrases(normalized: &str, phrases: &[&str]) -> String {
    let mut out = normalized.to_string();
    for phrase in phrases {
        let padded = format!(" {} ", phrase);
        while out.contains(&padded) {
            out = out.replace(&padded, " ");
        }
    }
    out
}

fn match_vocabulary(normalized: &str, vocabulary: Vocabulary) -> BTreeSet<String> {
    vocabulary
        .iter()
        .filter(|(_, forms)| forms.iter().any(|form| contains_phrase(normalized, form)))
        .map(|(canonical, _)| canonical.to_string())
        .collect()
}
