//! Rule-based intent classification and entity extraction
//!
//! Both passes are deterministic: the same normalized text always yields
//! the same intent and the same entity set. Intent rules are checked in
//! priority order and the first matching keyword wins. Entity scanners run
//! independently of the intent, so any mix of kinds can be populated.

use crate::core::types::{EntityKind, EntitySet, Intent, Query};
use regex::Regex;
use std::ops::Range;
use std::sync::OnceLock;

/// Priority-ordered keyword table; earlier rows win
const INTENT_RULES: &[(Intent, &[&str])] = &[
    (
        Intent::Stop,
        &[
            "stop",
            "halt",
            "kill",
            "shutdown",
            "shut down",
            "terminate",
            "pause",
            "end",
        ],
    ),
    (
        Intent::Launch,
        &["launch", "start", "spawn", "open", "run", "boot"],
    ),
    (
        Intent::Navigate,
        &[
            "navigate", "go to", "move to", "drive to", "goal", "waypoint",
        ],
    ),
    (
        Intent::Publish,
        &[
            "publish", "send", "move", "drive", "turn", "rotate", "velocity", "forward",
            "backward",
        ],
    ),
    (
        Intent::Echo,
        &[
            "echo",
            "show",
            "listen",
            "monitor",
            "subscribe",
            "print",
            "display",
            "read",
        ],
    ),
];

/// Known robot models, most specific spelling first
const ROBOT_MODELS: &[(&str, &str)] = &[
    (
        "turtlebot3_waffle_pi",
        r"\bturtle[\s_-]?bot[\s_-]?3[\s_-]*waffle[\s_-]*pi\b",
    ),
    (
        "turtlebot3_waffle",
        r"\bturtle[\s_-]?bot[\s_-]?3[\s_-]*waffle\b",
    ),
    (
        "turtlebot3_burger",
        r"\b(?:turtle[\s_-]?bot[\s_-]?3(?:[\s_-]*burger)?|tb3)\b",
    ),
    ("turtlebot4", r"\bturtle[\s_-]?bot[\s_-]?4\b"),
    ("tiago", r"\btiago\b"),
    ("pr2", r"\bpr[\s_-]?2\b"),
    ("husky", r"\bhusky\b"),
    ("jackal", r"\bjackal\b"),
    ("ur10", r"\bur[\s_-]?10\b"),
    ("ur5", r"\bur[\s_-]?5\b"),
    ("panda", r"\b(?:franka[\s_-]*)?panda\b"),
    ("spot", r"\bspot\b"),
];

/// Units accepted after a bare number, longest first
const UNITS: &[&str] = &[
    "rad/s", "m/s", "deg", "rad", "hz", "ms", "mm", "cm", "m", "s", "%",
];

fn topic_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?:^|[\s"'(=,\[])(/[a-z_][a-z0-9_]*(?:/[a-z_][a-z0-9_]*)*)"#)
            .expect("topic pattern is valid")
    })
}

fn coordinate_res() -> &'static [Regex; 2] {
    static RES: OnceLock<[Regex; 2]> = OnceLock::new();
    RES.get_or_init(|| {
        [
            Regex::new(r"\bx\s*[=:]?\s*(-?\d+(?:\.\d+)?)[\s,]+(?:and\s+)?-{0,2}y\s*[=:]?\s*(-?\d+(?:\.\d+)?)")
                .expect("x/y pattern is valid"),
            Regex::new(r"\(?\s*(-?\d+(?:\.\d+)?)\s*,\s*(-?\d+(?:\.\d+)?)\s*\)?")
                .expect("pair pattern is valid"),
        ]
    })
}

fn number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-?\d+(?:\.\d+)?").expect("number pattern is valid"))
}

fn simulator_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(gazebo|ignition|gz|webots)\b").expect("simulator pattern is valid")
    })
}

fn robot_model_res() -> &'static [(&'static str, Regex)] {
    static RES: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    RES.get_or_init(|| {
        ROBOT_MODELS
            .iter()
            .map(|(name, pattern)| (*name, Regex::new(pattern).expect("model pattern is valid")))
            .collect()
    })
}

/// Classify normalized text by the first matching keyword rule
pub fn classify_intent(text: &str) -> Intent {
    let words: Vec<&str> = text
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
        .collect();
    if words.is_empty() {
        return Intent::Unknown;
    }
    let padded = format!(" {} ", words.join(" "));

    INTENT_RULES
        .iter()
        .find(|(_, keywords)| {
            keywords
                .iter()
                .any(|kw| padded.contains(&format!(" {kw} ")))
        })
        .map(|(intent, _)| *intent)
        .unwrap_or(Intent::Unknown)
}

/// Scan text for topics, coordinates, numbers, robot models and simulators
pub fn extract_entities(text: &str) -> EntitySet {
    let text = text.to_lowercase();
    let mut entities = EntitySet::new();
    // Spans already attributed to an entity; numbers inside them are not
    // reported again as bare parameters.
    let mut claimed: Vec<Range<usize>> = Vec::new();

    for caps in topic_re().captures_iter(&text) {
        if let Some(m) = caps.get(1) {
            entities.insert(EntityKind::Topic, m.as_str());
            claimed.push(m.range());
        }
    }

    for (name, re) in robot_model_res() {
        for m in re.find_iter(&text) {
            if overlaps(&claimed, &m.range()) {
                continue;
            }
            entities.insert(EntityKind::RobotModel, *name);
            claimed.push(m.range());
        }
    }

    for caps in simulator_re().captures_iter(&text) {
        if let Some(m) = caps.get(1) {
            let name = match m.as_str() {
                "webots" => "webots",
                _ => "gazebo",
            };
            entities.insert(EntityKind::Simulator, name);
        }
    }

    for re in coordinate_res() {
        for caps in re.captures_iter(&text) {
            let (Some(whole), Some(x), Some(y)) = (caps.get(0), caps.get(1), caps.get(2)) else {
                continue;
            };
            if overlaps(&claimed, &whole.range()) || glued_to_word(&text, x.start()) {
                continue;
            }
            entities.insert(
                EntityKind::Coordinate,
                format!("{},{}", x.as_str(), y.as_str()),
            );
            claimed.push(whole.range());
        }
    }

    for m in number_re().find_iter(&text) {
        if overlaps(&claimed, &m.range()) || glued_to_word(&text, m.start()) {
            continue;
        }
        match unit_after(&text[m.end()..]) {
            Some(Some(unit)) => {
                entities.insert(
                    EntityKind::NumericParameter,
                    format!("{} {}", m.as_str(), unit),
                );
            }
            Some(None) => entities.insert(EntityKind::NumericParameter, m.as_str()),
            None => {}
        }
    }

    entities
}

/// Classify and extract in one pass; empty queries short-circuit
pub fn analyze(query: &Query) -> (Intent, EntitySet) {
    if query.is_empty() {
        return (Intent::Unknown, EntitySet::new());
    }
    let text = query.normalized();
    (classify_intent(text), extract_entities(text))
}

/// Every numeric literal in `text`, for loose value comparisons
pub fn numbers_in(text: &str) -> Vec<f64> {
    number_re()
        .find_iter(text)
        .filter(|m| !glued_to_word(text, m.start()))
        .filter_map(|m| m.as_str().parse().ok())
        .collect()
}

fn overlaps(claimed: &[Range<usize>], range: &Range<usize>) -> bool {
    claimed
        .iter()
        .any(|c| c.start < range.end && range.start < c.end)
}

/// True when the token at `start` continues an identifier (`turtlebot3`, `v1.2`)
fn glued_to_word(text: &str, start: usize) -> bool {
    text[..start]
        .chars()
        .next_back()
        .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '.' || c == '/')
}

/// Unit following a number
///
/// `Some(Some(unit))` for a recognised unit, `Some(None)` for a bare
/// number, `None` when the number runs into an identifier (`3d`).
fn unit_after(rest: &str) -> Option<Option<&'static str>> {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let after_space = rest.strip_prefix(' ').unwrap_or(rest);
    for unit in UNITS {
        if let Some(tail) = after_space.strip_prefix(unit) {
            if !tail.chars().next().is_some_and(is_word) {
                return Some(Some(unit));
            }
        }
    }
    if rest.chars().next().is_some_and(is_word) {
        None
    } else {
        Some(None)
    }
}
