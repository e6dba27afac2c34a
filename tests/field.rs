mod common;

use data_extractor::{ConfigError, Error, Field, Json, JsonExtractor, SimpleExtractor};
use serde_json::{Value, json};

#[test]
fn test_field_extract() {
    let data = common::json0();
    let field = Field::new(JsonExtractor::new("data.users[*].name"));

    assert_eq!(field.extract(&data).expect("Failed to extract"), json!("Vang Stout"));
}

#[test]
fn test_field_extract_with_is_many() {
    let data = common::json0();
    let ids = Field::many(JsonExtractor::new("data.users[*].id"));
    let missing = Field::many(JsonExtractor::new("data.notexists[*]"));

    assert_eq!(ids.extract(&data).expect("Failed to extract"), json!([0, 1, 2, 3, 4, 5]));
    assert_eq!(missing.extract(&data).expect("Failed to extract"), json!([]));
}

#[test]
fn test_null_default_is_a_default() {
    let data = common::json0();
    let field = Field::builder()
        .extractor(JsonExtractor::new("data.notexists"))
        .default(Value::Null)
        .build()
        .expect("Failed to build field");

    assert_eq!(field.default(), Some(&Value::Null));
    assert_eq!(field.extract(&data).expect("Default should be used"), Value::Null);

    let cloned = field.clone();
    assert_eq!(cloned.default(), Some(&Value::Null));
}

#[test]
fn test_no_default_is_preserved_by_clone() {
    let field = Field::new(JsonExtractor::new("data.notexists"));
    let cloned = field.clone();

    assert_eq!(cloned.default(), None);
    assert!(matches!(cloned.extract(&common::json0()), Err(Error::Extract(_))));
}

#[test]
fn test_field_parameters_conflict() {
    let result = Field::<Json>::builder()
        .extractor(JsonExtractor::new("data"))
        .many()
        .default(Value::Null)
        .build();

    assert_eq!(
        result.err(),
        Some(ConfigError::DefaultWithMany {
            default: Value::Null
        })
    );
}

#[test]
fn test_setters_validate_conflict() {
    let mut field = Field::many(JsonExtractor::new("data"));
    assert!(field.set_default(Some(json!(0))).is_err());
    assert_eq!(field.default(), None);

    let mut field = Field::new(JsonExtractor::new("data"));
    field.set_default(Some(json!(0))).expect("Singular fields accept defaults");
    assert!(field.set_many(true).is_err());
    assert!(!field.is_many());

    field.set_default(None).expect("Clearing the default is always valid");
    field.set_many(true).expect("No default, no conflict");
    assert!(field.is_many());
}

#[test]
fn test_bare_field_returns_the_element() {
    let field = Field::<Json>::bare();
    let many = Field::<Json>::builder().many().build().expect("Failed to build field");

    assert_eq!(field.extract(&json!({"id": 1})).expect("Failed to extract"), json!({"id": 1}));
    assert_eq!(field.extract(&json!([1, 2])).expect("Failed to extract"), json!(1));
    assert_eq!(many.extract(&json!([1, 2])).expect("Failed to extract"), json!([1, 2]));
    assert_eq!(many.extract(&json!("x")).expect("Failed to extract"), json!(["x"]));
}

#[test]
fn test_field_debug() {
    let field = Field::builder()
        .extractor(JsonExtractor::new("id"))
        .name("uid")
        .default(0)
        .build()
        .expect("Failed to build field");

    assert_eq!(format!("{field:?}"), r#"Field(JsonExtractor("id"), name="uid", default=0)"#);
    assert_eq!(
        format!("{:?}", Field::many(JsonExtractor::new("ids"))),
        r#"Field(JsonExtractor("ids"), is_many=true)"#
    );
    assert_eq!(format!("{:?}", Field::<Json>::bare()), "Field()");
}

#[test]
fn test_change_extractor_expression() {
    let data = common::json0();
    let mut field = Field::new(JsonExtractor::new("data.start"));

    field
        .extractor_mut()
        .expect("Field has an extractor")
        .set_expr("data.total".to_string());

    assert_eq!(field.extractor().map(|extractor| extractor.expr()), Some("data.total"));
    assert_eq!(field.extract(&data).expect("Failed to extract"), json!(100));

    field.set_extractor(None);
    assert!(field.extractor().is_none());
}

#[test]
fn test_field_name() {
    let mut field = Field::new(JsonExtractor::new("id"));
    assert_eq!(field.name(), None);

    field.set_name(Some("uid".to_string()));
    assert_eq!(field.name(), Some("uid"));
}
