use crosscount_core::decompose::{
    all_rules, apply_decomposition, decompose_label, decompose_with_rules,
};
use crosscount_parser::TransitType;
use polars::df;

#[test]
fn rules_are_listed_in_priority_order() {
    let names: Vec<&str> = all_rules().iter().map(|rule| rule.name()).collect();
    assert_eq!(
        names,
        vec!["cardinal_only", "abbreviation", "mode_split", "free_form"]
    );
    assert!(all_rules().iter().all(|rule| !rule.description().is_empty()));
}

#[test]
fn bare_cardinal_counts_bikes() {
    let decomposed = decompose_label("North").expect("decomposed");
    assert_eq!(decomposed.direction, "North");
    assert_eq!(decomposed.transit_type, Some(TransitType::Bike));
    assert_eq!(decomposed.rule, "cardinal_only");

    let lower = decompose_label("south").expect("decomposed");
    assert_eq!(lower.direction, "South");
}

#[test]
fn abbreviations_expand_to_directions() {
    let cases = [("NB", "North"), ("SB", "South"), ("EB", "East"), ("WB", "West")];
    for (label, direction) in cases {
        let decomposed = decompose_label(label).expect("decomposed");
        assert_eq!(decomposed.direction, direction, "label {label}");
        assert_eq!(decomposed.transit_type, Some(TransitType::Bike));
        assert_eq!(decomposed.rule, "abbreviation");
    }
}

#[test]
fn mode_token_splits_from_direction_in_either_position() {
    let ped = decompose_label("Ped South").expect("decomposed");
    assert_eq!(ped.direction, "South");
    assert_eq!(ped.transit_type, Some(TransitType::Pedestrian));
    assert_eq!(ped.rule, "mode_split");

    let trailing = decompose_label("North.bike").expect("decomposed");
    assert_eq!(trailing.direction, "North");
    assert_eq!(trailing.transit_type, Some(TransitType::Bike));

    let dotted = decompose_label("Pedestrian.North").expect("decomposed");
    assert_eq!(dotted.direction, "North");
    assert_eq!(dotted.transit_type, Some(TransitType::Pedestrian));

    let abbreviated = decompose_label("Bike_NB").expect("decomposed");
    assert_eq!(abbreviated.direction, "North");
    assert_eq!(abbreviated.transit_type, Some(TransitType::Bike));
}

#[test]
fn unknown_labels_keep_their_text_as_direction() {
    let decomposed = decompose_label("East Sidewalk").expect("decomposed");
    assert_eq!(decomposed.direction, "East Sidewalk");
    assert_eq!(decomposed.transit_type, None);
    assert_eq!(decomposed.rule, "free_form");
}

#[test]
fn decomposition_never_leaves_both_fields_empty() {
    for label in ["North", "WB", "Ped South", "Bike", "Sidewalk", "x-y_z"] {
        let decomposed = decompose_label(label).expect("decomposed");
        assert!(
            !decomposed.direction.is_empty() || decomposed.transit_type.is_some(),
            "label {label} lost both fields"
        );
    }
}

#[test]
fn blank_labels_do_not_decompose() {
    assert!(decompose_label("").is_none());
    assert!(decompose_label("   ").is_none());
}

#[test]
fn separator_only_labels_keep_their_text() {
    for label in ["-", " . _ ", "--"] {
        let decomposed = decompose_label(label).expect("decomposed");
        assert_eq!(decomposed.direction, label.trim(), "label {label:?}");
        assert_eq!(decomposed.transit_type, None);
        assert_eq!(decomposed.rule, "free_form");
    }
}

#[test]
fn custom_rule_lists_are_honored() {
    let free_form_only: Vec<_> = all_rules()
        .iter()
        .copied()
        .filter(|rule| rule.name() == "free_form")
        .collect();
    let decomposed = decompose_with_rules("North", &free_form_only).expect("decomposed");
    assert_eq!(decomposed.rule, "free_form");
    assert_eq!(decomposed.transit_type, None);
    assert_eq!(decomposed.direction, "North");
}

#[test]
fn every_non_blank_row_gets_a_direction_or_mode() {
    let long = df![
        "label" => ["North", "-", "Ped South", "_."],
    ]
    .expect("frame");
    let decomposed = apply_decomposition(&long).expect("decompose failed");

    let directions = decomposed
        .column("direction")
        .expect("direction")
        .str()
        .expect("str");
    let transit = decomposed
        .column("transit_type")
        .expect("transit_type")
        .str()
        .expect("str");
    let rules = decomposed
        .column("decompose_rule")
        .expect("decompose_rule")
        .str()
        .expect("str");
    for idx in 0..decomposed.height() {
        assert!(
            directions.get(idx).is_some() || transit.get(idx).is_some(),
            "row {idx} lost both fields"
        );
        assert!(rules.get(idx).is_some(), "row {idx} has no rule");
    }
    assert_eq!(directions.get(1), Some("-"));
}
