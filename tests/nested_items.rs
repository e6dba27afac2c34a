mod common;

use data_extractor::{Child, Field, Item, Json, JsonExtractor, Schema};
use serde_json::{Value, json};

fn user_schema() -> Schema<Json> {
    Schema::builder("User")
        .field("uid", Field::new(JsonExtractor::new("id")))
        .field(
            "username",
            Field::builder()
                .extractor(JsonExtractor::new("name"))
                .name("name")
                .build()
                .expect("Failed to build username field"),
        )
        .field(
            "gender",
            Field::builder()
                .extractor(JsonExtractor::new("gender"))
                .default(Value::Null)
                .build()
                .expect("Failed to build gender field"),
        )
        .build()
        .expect("Failed to build User schema")
}

#[test]
fn test_complex_item_extract_json_data() {
    let data = common::json0();
    let users_result = common::users_result();
    let user = user_schema();

    let item = Item::new(&user, JsonExtractor::new("data.users[*]"));
    assert_eq!(item.extract(&data).expect("Failed to extract user"), users_result[0]);

    let item = Item::many(&user, JsonExtractor::new("data.users[*]"));
    assert_eq!(
        item.extract(&data).expect("Failed to extract users"),
        Value::Array(users_result.clone())
    );

    let response = Schema::<Json>::builder("UserResponse")
        .field(
            "start",
            Field::builder()
                .extractor(JsonExtractor::new("start"))
                .default(0)
                .build()
                .expect("Failed to build start field"),
        )
        .field("size", Field::new(JsonExtractor::new("size")))
        .field("total", Field::new(JsonExtractor::new("total")))
        .item("data", Item::many(&user, JsonExtractor::new("users[*]")))
        .build()
        .expect("Failed to build UserResponse schema");

    let item = Item::new(&response, JsonExtractor::new("data"));
    assert_eq!(
        item.extract(&data).expect("Failed to extract response"),
        json!({
            "start": 0,
            "size": 5,
            "total": 100,
            "data": users_result,
        })
    );
}

#[test]
fn test_item_preserves_declaration_order() {
    let data = common::json0();
    let item = Item::new(&user_schema(), JsonExtractor::new("data.users[*]"));

    let user = item.extract(&data).expect("Failed to extract user");
    let keys: Vec<&String> = user.as_object().expect("Items are objects").keys().collect();

    assert_eq!(keys, ["uid", "name", "gender"]);
    assert_eq!(item.field_names().collect::<Vec<_>>(), ["uid", "username", "gender"]);
}

#[test]
fn test_special_field_name() {
    let data = common::json0();
    let user = Schema::<Json>::builder("User")
        .field("uid", Field::new(JsonExtractor::new("id")))
        .field(
            "username",
            Field::builder()
                .extractor(JsonExtractor::new("name"))
                .name("user.name")
                .build()
                .expect("Failed to build field"),
        )
        .build()
        .expect("Failed to build schema");

    let item = Item::new(&user, JsonExtractor::new("data.users[*]"));

    assert_eq!(
        item.extract(&data).expect("Failed to extract"),
        json!({"uid": 0, "user.name": "Vang Stout"})
    );
}

#[test]
fn test_renamed_nested_item() {
    let data = common::json0();
    let user = Schema::<Json>::builder("User")
        .field("uid", Field::new(JsonExtractor::new("id")))
        .build()
        .expect("Failed to build User schema");
    let response = Schema::<Json>::builder("UserResponse")
        .item(
            "_",
            Item::builder(&user)
                .extractor(JsonExtractor::new("users[*]"))
                .name("data")
                .build()
                .expect("Failed to build item"),
        )
        .build()
        .expect("Failed to build UserResponse schema");

    let item = Item::new(&response, JsonExtractor::new("data"));

    assert_eq!(item.extract(&data).expect("Failed to extract"), json!({"data": {"uid": 0}}));
}

fn jack() -> Value {
    json!({
        "id": 1,
        "username": "Jack",
        "count_follower": 100,
        "count_following": 1,
        "count_like": 1_000_000,
    })
}

#[test]
fn test_item_extractor_is_none() {
    let user = Schema::<Json>::builder("User")
        .field("uid", Field::new(JsonExtractor::new("id")))
        .field("username", Field::new(JsonExtractor::new("username")))
        .build()
        .expect("Failed to build schema");

    let single = Item::bare(&user);
    let many = Item::builder(&user).many().build().expect("Failed to build item");

    assert_eq!(
        single.extract(&jack()).expect("Failed to extract"),
        json!({"uid": 1, "username": "Jack"})
    );
    assert_eq!(
        many.extract(&json!([jack()])).expect("Failed to extract"),
        json!([{"uid": 1, "username": "Jack"}])
    );
}

#[test]
fn test_nested_item_extractor_is_none() {
    let count = Schema::<Json>::builder("Count")
        .field("follower", Field::new(JsonExtractor::new("count_follower")))
        .field("following", Field::new(JsonExtractor::new("count_following")))
        .field("like", Field::new(JsonExtractor::new("count_like")))
        .build()
        .expect("Failed to build Count schema");
    let user = Schema::<Json>::builder("User")
        .field("uid", Field::new(JsonExtractor::new("id")))
        .field("username", Field::new(JsonExtractor::new("username")))
        .item("count", Item::bare(&count))
        .build()
        .expect("Failed to build User schema");

    let expected = json!({
        "uid": 1,
        "username": "Jack",
        "count": {"follower": 100, "following": 1, "like": 1_000_000},
    });

    assert_eq!(Item::bare(&user).extract(&jack()).expect("Failed to extract"), expected);
    assert_eq!(
        Item::builder(&user)
            .many()
            .build()
            .expect("Failed to build item")
            .extract(&json!([jack()]))
            .expect("Failed to extract"),
        json!([expected])
    );
}

#[test]
fn test_item_default() {
    let item = Item::builder(&user_schema())
        .extractor(JsonExtractor::new("data.notexists"))
        .default(json!({}))
        .build()
        .expect("Failed to build item");

    assert_eq!(item.extract(&common::json0()).expect("Default should be used"), json!({}));
    assert!(
        Item::builder(&user_schema())
            .many()
            .default(Value::Null)
            .build()
            .is_err()
    );
}

#[test]
fn test_field_mut_does_not_affect_other_items() {
    let data = common::json0();
    let schema = user_schema();
    let original = Item::new(&schema, JsonExtractor::new("data.users[*]"));
    let mut changed = original.clone();

    match changed.field_mut("uid") {
        Some(Child::Field(field)) => field.set_name(Some("id".to_string())),
        other => panic!("Expected a field, got {other:?}"),
    }

    assert_eq!(
        changed.extract(&data).expect("Failed to extract"),
        json!({"id": 0, "name": "Vang Stout", "gender": "female"})
    );
    assert_eq!(
        original.extract(&data).expect("Failed to extract"),
        json!({"uid": 0, "name": "Vang Stout", "gender": "female"})
    );
    assert_eq!(schema.get("uid").and_then(Child::name), None);
}

#[test]
fn test_item_debug() {
    let item = Item::many(&user_schema(), JsonExtractor::new("users[*]"));

    assert_eq!(format!("{item:?}"), r#"User(JsonExtractor("users[*]"), is_many=true)"#);
    assert_eq!(format!("{:?}", Item::bare(&user_schema())), "User()");
}
