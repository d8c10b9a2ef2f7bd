//! Rule data for the safety gate: unsafe phrases, known diagnostic codes,
//! and contradictory recommendation classes.

use crate::consensus::terms::{contains_phrase, normalize, strip_phrases, TermSet, NO_ACTION_FORMS};
use std::collections::{BTreeSet, HashSet};

/// Phrases that instruct defeating a safety system.
const BUILTIN_DENYLIST: &[&str] = &[
    "bypass the safety system",
    "bypass the safety",
    "disable the safety system",
    "override the safety",
    "disable the airbag",
    "disable the airbags",
    "disconnect the airbag",
    "tamper with the airbag",
    "disable the abs",
    "disable abs",
    "disconnect the brake",
    "disconnect the brakes",
    "ignore the brake warning",
    "remove the seatbelt",
];

/// Common generic OBD-II codes.
const BUILTIN_CODES: &[&str] = &[
    "P0010", "P0011", "P0016", "P0100", "P0101", "P0102", "P0103", "P0106", "P0107", "P0110",
    "P0113", "P0115", "P0116", "P0117", "P0118", "P0120", "P0121", "P0122", "P0128", "P0130",
    "P0131", "P0133", "P0134", "P0135", "P0136", "P0137", "P0138", "P0141", "P0171", "P0172",
    "P0174", "P0175", "P0200", "P0201", "P0202", "P0203", "P0204", "P0217", "P0230", "P0299",
    "P0300", "P0301", "P0302", "P0303", "P0304", "P0305", "P0306", "P0307", "P0308", "P0325",
    "P0335", "P0340", "P0341", "P0351", "P0352", "P0400", "P0401", "P0402", "P0420", "P0421",
    "P0430", "P0440", "P0441", "P0442", "P0446", "P0449", "P0455", "P0456", "P0457", "P0500",
    "P0505", "P0506", "P0507", "P0562", "P0563", "P0600", "P0606", "P0700", "P0715", "P0720",
    "P0730", "P0740", "P0750", "P0841", "B0001", "B0100", "C0035", "C0040", "C0045", "C0050",
    "C0265", "U0001", "U0100", "U0101", "U0121", "U0140",
];

/// Case- and punctuation-insensitive phrase matcher.
#[derive(Debug, Clone)]
pub struct Denylist {
    phrases: Vec<String>,
}

impl Denylist {
    /// Built-in phrases plus `extra`.
    pub fn new(extra: &[String]) -> Self {
        let phrases = BUILTIN_DENYLIST
            .iter()
            .map(|p| p.to_string())
            .chain(extra.iter().cloned())
            .map(|p| normalize(&p).trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        Self { phrases }
    }

    /// First denylisted phrase found in `text`.
    pub fn find(&self, text: &str) -> Option<&str> {
        let normalized = normalize(text);
        self.phrases
            .iter()
            .find(|phrase| contains_phrase(&normalized, phrase))
            .map(String::as_str)
    }
}

/// Registry of diagnostic codes considered valid.
#[derive(Debug, Clone)]
pub struct CodeRegistry {
    codes: HashSet<String>,
}

impl CodeRegistry {
    pub fn new(include_builtin: bool, extra: &[String]) -> Self {
        let builtin = include_builtin
            .then_some(BUILTIN_CODES)
            .unwrap_or_default()
            .iter()
            .map(|c| c.to_string());
        let codes = builtin
            .chain(extra.iter().map(|c| c.trim().to_ascii_uppercase()))
            .collect();
        Self { codes }
    }

    pub fn contains(&self, code: &str) -> bool {
        self.codes.contains(&code.trim().to_ascii_uppercase())
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

/// Coarse class of a recommendation, used to spot contradictions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ActionClass {
    /// Some part needs work (replace, repair, flush, ...).
    Intervention,
    /// Nothing needs doing.
    NoAction,
    /// The vehicle should not be driven.
    StopDriving,
    /// The vehicle can keep being driven.
    SafeToDrive,
}

impl ActionClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionClass::Intervention => "intervention",
            ActionClass::NoAction => "no action",
            ActionClass::StopDriving => "stop driving",
            ActionClass::SafeToDrive => "safe to drive",
        }
    }
}

/// Pairs of classes that cannot both be right.
const CONTRADICTIONS: &[(ActionClass, ActionClass)] = &[
    (ActionClass::Intervention, ActionClass::NoAction),
    (ActionClass::StopDriving, ActionClass::SafeToDrive),
];

/// Canonical actions (see `TermSet`) that mean a part needs work.
const INTERVENTIONS: &[&str] = &[
    "replace", "repair", "flush", "bleed", "recharge", "reprogram", "tighten", "adjust",
];

const STOP_DRIVING: &[&str] = &[
    "stop driving",
    "do not drive",
    "don't drive",
    "unsafe to drive",
    "not safe to drive",
    "have it towed",
    "tow the vehicle",
];

/// Negated forms removed before looking for `SAFE_TO_DRIVE`.
const NEGATED_SAFE: &[&str] = &["not safe to drive", "isn't safe to drive", "not okay to drive"];

const SAFE_TO_DRIVE: &[&str] = &[
    "safe to drive",
    "okay to drive",
    "ok to drive",
    "fine to drive",
    "continue driving",
    "keep driving",
];

/// Recommendation classes expressed by one response.
pub fn classify_actions(text: &str) -> BTreeSet<ActionClass> {
    let normalized = normalize(text);
    let mut classes = BTreeSet::new();

    if NO_ACTION_FORMS.iter().any(|p| contains_phrase(&normalized, p)) {
        classes.insert(ActionClass::NoAction);
    }
    let interventions = TermSet::extract(&strip_phrases(&normalized, NO_ACTION_FORMS));
    if interventions
        .actions
        .iter()
        .any(|a| INTERVENTIONS.contains(&a.as_str()))
    {
        classes.insert(ActionClass::Intervention);
    }
    if STOP_DRIVING.iter().any(|p| contains_phrase(&normalized, p)) {
        classes.insert(ActionClass::StopDriving);
    }
    let affirmed = strip_phrases(&normalized, NEGATED_SAFE);
    if SAFE_TO_DRIVE.iter().any(|p| contains_phrase(&affirmed, p)) {
        classes.insert(ActionClass::SafeToDrive);
    }

    classes
}

/// First contradictory pair held by two different responses in `texts`.
///
/// A single response mentioning both sides ("replace it now, or no action if
/// it clears") is not a conflict on its own.
pub fn find_conflict<'a>(
    texts: impl IntoIterator<Item = &'a str>,
) -> Option<(ActionClass, ActionClass)> {
    let per_response: Vec<BTreeSet<ActionClass>> =
        texts.into_iter().map(classify_actions).collect();

    CONTRADICTIONS.iter().copied().find(|(a, b)| {
        per_response.iter().enumerate().any(|(i, left)| {
            per_response.iter().enumerate().any(|(j, right)| {
                i != j && left.contains(a) && right.contains(b)
            })
        })
    })
}
