use chrono::NaiveDate;
use crosscount_core::config::{
    default_towards, ConfigError, ReportConfig, TowardsPair, DEFAULT_COUNTY, DEFAULT_STATE,
    DEFAULT_TIMEZONE,
};

#[test]
fn defaults_cover_seattle_crossings() {
    let config = ReportConfig::default();
    assert_eq!(config.timezone, DEFAULT_TIMEZONE);
    assert_eq!(config.county, DEFAULT_COUNTY);
    assert_eq!(config.state.as_deref(), Some(DEFAULT_STATE));
    assert_eq!(config.towards, default_towards());
    assert_eq!(config.towards.len(), 4);
    assert_eq!(config.annotations.len(), 1);
    assert!(config.validate().is_ok());
}

#[test]
fn toml_overrides_selected_fields() {
    let config = ReportConfig::from_toml_str(
        r#"
counts_dir = "data/seattle"
weather_path = "data/weather.csv"
county = "Pierce"
state = "Washington"

[[towards]]
crossing = "2nd Ave Cycletrack"
direction = "South"

[[annotations]]
label = "Stay Home"
start = "2020-03-23"
end = "2020-05-31"
"#,
    )
    .expect("config parses");

    assert_eq!(config.county, "Pierce");
    assert_eq!(config.state.as_deref(), Some("Washington"));
    assert_eq!(config.timezone, DEFAULT_TIMEZONE);
    assert_eq!(
        config.towards,
        vec![TowardsPair::new("2nd Ave Cycletrack", "South")]
    );
    let window = &config.annotations[0];
    assert!(window.contains(NaiveDate::from_ymd_opt(2020, 3, 23).expect("date")));
    assert!(window.contains(NaiveDate::from_ymd_opt(2020, 5, 31).expect("date")));
    assert!(!window.contains(NaiveDate::from_ymd_opt(2020, 6, 1).expect("date")));
    assert!(config.counts_pattern().ends_with("*.csv"));
}

#[test]
fn invalid_values_are_rejected() {
    let zone = ReportConfig::from_toml_str(r#"timezone = "Nowhere/Special""#);
    assert!(matches!(zone, Err(ConfigError::InvalidTimezone(_))));

    let annotation = ReportConfig::from_toml_str(
        r#"
[[annotations]]
label = "backwards"
start = "2020-07-01"
end = "2020-06-01"
"#,
    );
    assert!(matches!(
        annotation,
        Err(ConfigError::InvalidAnnotation { .. })
    ));

    let pair = ReportConfig::from_toml_str(
        r#"
[[towards]]
crossing = "Fremont Bridge"
direction = " "
"#,
    );
    assert!(matches!(pair, Err(ConfigError::InvalidTowardsPair(0))));

    let syntax = ReportConfig::from_toml_str("county = ");
    assert!(matches!(syntax, Err(ConfigError::Toml(_))));
}
