use std::collections::HashMap;

use crosscount_parser::{Cardinal, TransitType};
use once_cell::sync::Lazy;
use polars::prelude::*;

/// Result of splitting a counter label such as `Ped South` or `NB`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecomposedLabel {
    pub direction: String,
    pub transit_type: Option<TransitType>,
    pub rule: &'static str,
}

/// One pattern in the label decomposition priority list.
pub trait LabelRule: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn decompose(&self, tokens: &[&str]) -> Option<(String, Option<TransitType>)>;
}

static LABEL_RULES: Lazy<Vec<&'static dyn LabelRule>> = Lazy::new(|| {
    vec![
        &CardinalOnlyRule as &dyn LabelRule,
        &AbbreviationRule as &dyn LabelRule,
        &ModeSplitRule as &dyn LabelRule,
        &FreeFormRule as &dyn LabelRule,
    ]
});

/// Rules in priority order. The first rule that accepts a label decides it.
pub fn all_rules() -> &'static [&'static dyn LabelRule] {
    LABEL_RULES.as_slice()
}

pub fn decompose_label(label: &str) -> Option<DecomposedLabel> {
    decompose_with_rules(label, all_rules())
}

/// Returns `None` only for blank labels. A label made entirely of separators is kept
/// whole as a single token.
pub fn decompose_with_rules(label: &str, rules: &[&dyn LabelRule]) -> Option<DecomposedLabel> {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        return None;
    }
    let mut tokens = split_label(trimmed);
    if tokens.is_empty() {
        tokens.push(trimmed);
    }

    rules.iter().find_map(|rule| {
        rule.decompose(&tokens)
            .map(|(direction, transit_type)| DecomposedLabel {
                direction,
                transit_type,
                rule: rule.name(),
            })
    })
}

fn split_label(label: &str) -> Vec<&str> {
    label
        .split(|c: char| matches!(c, '.' | '_' | '-') || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .collect()
}

fn normalize_direction(tokens: &[&str]) -> String {
    if let [single] = tokens {
        if let Some(cardinal) =
            Cardinal::from_name(single).or_else(|| Cardinal::from_abbreviation(single))
        {
            return cardinal.as_str().to_string();
        }
    }
    tokens.join(" ")
}

struct CardinalOnlyRule;

impl LabelRule for CardinalOnlyRule {
    fn name(&self) -> &'static str {
        "cardinal_only"
    }

    fn description(&self) -> &'static str {
        "a bare direction (North, South, East, West) counts bikes"
    }

    fn decompose(&self, tokens: &[&str]) -> Option<(String, Option<TransitType>)> {
        match tokens {
            [single] => Cardinal::from_name(single)
                .map(|cardinal| (cardinal.as_str().to_string(), Some(TransitType::Bike))),
            _ => None,
        }
    }
}

struct AbbreviationRule;

impl LabelRule for AbbreviationRule {
    fn name(&self) -> &'static str {
        "abbreviation"
    }

    fn description(&self) -> &'static str {
        "NB/SB/EB/WB map to a direction and count bikes"
    }

    fn decompose(&self, tokens: &[&str]) -> Option<(String, Option<TransitType>)> {
        match tokens {
            [single] => Cardinal::from_abbreviation(single)
                .map(|cardinal| (cardinal.as_str().to_string(), Some(TransitType::Bike))),
            _ => None,
        }
    }
}

struct ModeSplitRule;

impl LabelRule for ModeSplitRule {
    fn name(&self) -> &'static str {
        "mode_split"
    }

    fn description(&self) -> &'static str {
        "a mode token (bike, ped, ...) plus the remaining tokens as direction"
    }

    fn decompose(&self, tokens: &[&str]) -> Option<(String, Option<TransitType>)> {
        if tokens.len() < 2 {
            return None;
        }
        let (position, mode) = tokens
            .iter()
            .enumerate()
            .find_map(|(idx, token)| TransitType::try_from(*token).ok().map(|mode| (idx, mode)))?;

        let rest: Vec<&str> = tokens
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != position)
            .map(|(_, token)| *token)
            .collect();
        Some((normalize_direction(&rest), Some(mode)))
    }
}

struct FreeFormRule;

impl LabelRule for FreeFormRule {
    fn name(&self) -> &'static str {
        "free_form"
    }

    fn description(&self) -> &'static str {
        "anything else keeps the label as direction with no transit type"
    }

    fn decompose(&self, tokens: &[&str]) -> Option<(String, Option<TransitType>)> {
        Some((normalize_direction(tokens), None))
    }
}

/// Adds `direction`, `transit_type` and `decompose_rule` columns derived from `label`.
pub fn apply_decomposition(df: &DataFrame) -> PolarsResult<DataFrame> {
    let labels = df.column("label")?.str()?;

    let mut cache: HashMap<&str, Option<DecomposedLabel>> = HashMap::new();
    let mut directions: Vec<Option<String>> = Vec::with_capacity(df.height());
    let mut transit: Vec<Option<&'static str>> = Vec::with_capacity(df.height());
    let mut rules: Vec<Option<&'static str>> = Vec::with_capacity(df.height());

    for label in labels.into_iter() {
        let decomposed = label.and_then(|label| {
            cache
                .entry(label)
                .or_insert_with(|| decompose_label(label))
                .clone()
        });
        match decomposed {
            Some(decomposed) => {
                transit.push(decomposed.transit_type.map(|mode| mode.as_str()));
                rules.push(Some(decomposed.rule));
                directions.push(Some(decomposed.direction));
            }
            None => {
                directions.push(None);
                transit.push(None);
                rules.push(None);
            }
        }
    }

    let mut output = df.clone();
    let mut columns = [
        Series::new("direction".into(), directions).into(),
        Series::new("transit_type".into(), transit).into(),
        Series::new("decompose_rule".into(), rules).into(),
    ];
    output.hstack_mut(columns.as_mut_slice())?;
    Ok(output)
}
