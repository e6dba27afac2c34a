mod common;

use std::env;

use data_extractor::{
    Backend, DeclarationError, Field, Item, ItemSchema, Json, JsonExtractor, RESERVED_METHODS,
    RESERVED_PARAMETERS, Schema, XPathExtractor, Xml, XmlValue, is_reserved_key,
};
use serde_json::json;
use serial_test::serial;

fn user_schema() -> Schema<Json> {
    Schema::builder("User")
        .field("uid", Field::new(JsonExtractor::new("id")))
        .build()
        .expect("Failed to build User schema")
}

#[test]
fn test_inheritance() {
    let json0 = common::json0();
    let data = &json0["data"]["users"][0];
    let user = user_schema();
    let with_gender = Schema::<Json>::builder("UserWithGender")
        .extends(&user)
        .field("gender", Field::new(JsonExtractor::new("gender")))
        .build()
        .expect("Failed to build UserWithGender schema");

    assert_eq!(Item::bare(&user).extract(data).expect("Failed to extract"), json!({"uid": 0}));
    assert_eq!(
        Item::bare(&with_gender).extract(data).expect("Failed to extract"),
        json!({"uid": 0, "gender": "female"})
    );
}

#[test]
fn test_override_keeps_inherited_position() {
    let parent = Schema::<Json>::builder("Parent")
        .field("a", Field::new(JsonExtractor::new("a")))
        .field("b", Field::new(JsonExtractor::new("b")))
        .build()
        .expect("Failed to build Parent schema");
    let child = Schema::<Json>::builder("Child")
        .extends(&parent)
        .field("c", Field::new(JsonExtractor::new("c")))
        .field("a", Field::new(JsonExtractor::new("b")))
        .build()
        .expect("Failed to build Child schema");

    assert_eq!(child.field_names().collect::<Vec<_>>(), ["a", "b", "c"]);
    assert_eq!(
        Item::bare(&child)
            .extract(&json!({"a": 1, "b": 2, "c": 3}))
            .expect("Failed to extract"),
        json!({"a": 2, "b": 2, "c": 3})
    );
    assert_eq!(parent.len(), 2);
}

#[test]
fn test_item_remove_super_extractor() {
    let user = user_schema();
    let no_id = Schema::<Json>::builder("NoIdUser")
        .extends(&user)
        .declare("uid", None::<Field<Json>>)
        .build()
        .expect("Failed to build NoIdUser schema");
    let also_no_id = Schema::<Json>::builder("NoIdUser")
        .extends(&user)
        .remove("uid")
        .build()
        .expect("Failed to build NoIdUser schema");

    assert!(no_id.is_empty());
    assert!(also_no_id.is_empty());
    assert_eq!(Item::bare(&no_id).extract(&json!({"id": 1})).expect("Failed to extract"), json!({}));
}

#[test]
fn test_remove_before_extends() {
    let user = user_schema();
    let no_id = Schema::<Json>::builder("NoIdUser")
        .remove("uid")
        .extends(&user)
        .build()
        .expect("Failed to build NoIdUser schema");
    let redeclared = Schema::<Json>::builder("User")
        .remove("uid")
        .field("uid", Field::new(JsonExtractor::new("user_id")))
        .extends(&user)
        .build()
        .expect("Failed to build User schema");

    assert!(no_id.is_empty());
    assert_eq!(
        Item::bare(&redeclared).extract(&json!({"id": 1, "user_id": 2})).expect("Failed to extract"),
        json!({"uid": 2})
    );
}

#[test]
#[serial]
fn test_field_overwrites_parameter() {
    let line = line!() + 2;
    let result = Schema::<Json>::builder("User")
        .field("name", Field::new(JsonExtractor::new("name")))
        .build();

    let err = result.expect_err("'name' is a reserved key");
    assert_eq!(err.schema, "User");
    assert_eq!(err.key, "name");
    assert_eq!(err.file.as_deref(), Some(file!()));
    assert_eq!(err.line, Some(line));
    assert_eq!(err.column, Some(9));
    assert_eq!(err.text, r#".field("name", Field::new(JsonExtractor::new("name")))"#);
    assert!(err.message.contains(r#"overwrites the parameter "name" of User"#));
    assert!(err.message.contains(r#"name="name""#));
}

#[test]
#[serial]
fn test_field_overwrites_method() {
    let line = line!() + 3;
    let result = Schema::<Json>::builder("User")
        .field("uid", Field::new(JsonExtractor::new("id")))
        .field("field_names", Field::new(JsonExtractor::new("field_names")))
        .build();

    let err = result.expect_err("'field_names' is a reserved key");
    assert_eq!(err.key, "field_names");
    assert_eq!(err.line, Some(line));
    assert!(err.message.contains(r#"overwrites the method "field_names" of User"#));
    assert!(
        err.to_string()
            .ends_with(r#"    .field("field_names", Field::new(JsonExtractor::new("field_names")))"#)
    );
}

#[test]
fn test_first_reserved_key_is_reported() {
    let result = Schema::<Json>::builder("User")
        .field("extract", Field::new(JsonExtractor::new("extract")))
        .field("is_many", Field::new(JsonExtractor::new("is_many")))
        .build();

    assert_eq!(result.expect_err("Reserved keys").key, "extract");
}

#[test]
fn test_every_reserved_key_is_rejected() {
    for key in RESERVED_PARAMETERS.iter().chain(&RESERVED_METHODS) {
        let result = Schema::<Json>::builder("User")
            .field(key, Field::new(JsonExtractor::new(*key)))
            .build();
        assert!(result.is_err(), "{key} should be rejected");
    }
}

#[test]
fn test_reserved_keys_match_derive_check() {
    const _: () = assert!(is_reserved_key("name") && !is_reserved_key("username"));

    for key in RESERVED_PARAMETERS.iter().chain(&RESERVED_METHODS) {
        assert!(is_reserved_key(key), "{key} should be reserved");
    }
    for key in ["uid", "username", "names", "extractors", "", "Name"] {
        assert!(!is_reserved_key(key), "{key} should not be reserved");
    }
}

#[test]
fn test_avoid_field_overwriting_parameter() {
    let data = common::json0();
    let schema = Schema::<Json>::builder("User")
        .field("uid", Field::new(JsonExtractor::new("id")))
        .field(
            "username",
            Field::builder()
                .extractor(JsonExtractor::new("name"))
                .name("name")
                .build()
                .expect("Failed to build field"),
        )
        .build()
        .expect("Renamed fields are not reserved");

    let item = Item::new(&schema, JsonExtractor::new("data.users[*]"));

    assert_eq!(
        item.extract(&data).expect("Failed to extract"),
        json!({"uid": 0, "name": "Vang Stout"})
    );
}

#[test]
#[serial]
fn test_declaration_error_when_source_is_unreadable() {
    let current = env::current_dir().expect("Failed to read current directory");
    env::set_current_dir(env::temp_dir()).expect("Failed to change directory");
    let result = Schema::<Json>::builder("User")
        .field("name", Field::new(JsonExtractor::new("name")))
        .build();
    env::set_current_dir(current).expect("Failed to restore directory");

    let err = result.expect_err("'name' is a reserved key");
    assert_eq!(err.file, None);
    assert_eq!(err.line, None);
    assert_eq!(err.column, None);
    assert_eq!(err.text, r#"name=Field(JsonExtractor("name"))"#);
    assert!(err.message.starts_with(r#""name=Field(JsonExtractor(\"name\"))" overwrites"#));
    assert!(err.to_string().ends_with("\n    name=Field(JsonExtractor(\"name\"))"));
}

#[test]
fn test_declaration_error_without_location() {
    let err = DeclarationError {
        message: "reserved".to_string(),
        schema: "User".to_string(),
        key: "name".to_string(),
        file: None,
        line: None,
        column: None,
        text: r#"name=Field(JsonExtractor("name"))"#.to_string(),
    };

    assert_eq!(err.to_string(), "reserved\n    name=Field(JsonExtractor(\"name\"))");
}

#[derive(ItemSchema)]
struct User {
    uid: Field<Json>,
    username: Field<Json>,
}

#[derive(ItemSchema)]
#[schema(name = "UserWithGender")]
struct GenderedUser {
    #[field(extends)]
    base: User,

    gender: Field<Json>,

    #[field(skip)]
    #[allow(dead_code)]
    note: String,
}

#[derive(ItemSchema)]
struct NoNameUser {
    #[field(extends)]
    base: User,

    username: Option<Field<Json>>,
}

#[derive(ItemSchema)]
struct Response {
    total: Field<Json>,
    users: Item<Json>,
}

#[derive(ItemSchema)]
struct Generic<B: Backend> {
    value: Field<B>,
}

fn user() -> User {
    User {
        uid: Field::new(JsonExtractor::new("id")),
        username: Field::builder()
            .extractor(JsonExtractor::new("name"))
            .name("name")
            .build()
            .expect("Failed to build field"),
    }
}

#[test]
fn test_derive_schema() {
    let data = common::json0();
    let schema = user().schema().expect("Failed to build schema");
    let item = Item::new(&schema, JsonExtractor::new("data.users[*]"));

    assert_eq!(schema.name(), "User");
    assert_eq!(schema.field_names().collect::<Vec<_>>(), ["uid", "username"]);
    assert_eq!(
        item.extract(&data).expect("Failed to extract"),
        json!({"uid": 0, "name": "Vang Stout"})
    );
}

#[test]
fn test_derive_inheritance() {
    let json0 = common::json0();
    let data = &json0["data"]["users"][0];
    let schema = GenderedUser {
        base: user(),
        gender: Field::new(JsonExtractor::new("gender")),
        note: "not part of the schema".to_string(),
    }
    .schema()
    .expect("Failed to build schema");

    assert_eq!(schema.name(), "UserWithGender");
    assert_eq!(
        Item::bare(&schema).extract(data).expect("Failed to extract"),
        json!({"uid": 0, "name": "Vang Stout", "gender": "female"})
    );
}

#[test]
fn test_derive_removes_with_none() {
    let schema = NoNameUser {
        base: user(),
        username: None,
    }
    .schema()
    .expect("Failed to build schema");

    assert_eq!(schema.field_names().collect::<Vec<_>>(), ["uid"]);
}

#[test]
fn test_derive_nested_item() {
    let data = common::json0();
    let user = user().schema().expect("Failed to build User schema");
    let response = Response {
        total: Field::new(JsonExtractor::new("total")),
        users: Item::many(&user, JsonExtractor::new("users[*]")),
    }
    .schema()
    .expect("Failed to build Response schema");

    let item = Item::new(&response, JsonExtractor::new("data"));
    let extracted = item.extract(&data).expect("Failed to extract");

    assert_eq!(extracted["total"], json!(100));
    assert_eq!(extracted["users"].as_array().map(Vec::len), Some(6));
}

#[test]
fn test_derive_generic_backend() {
    let package = common::parse_xml(common::ARTICLES);
    let document = package.as_document();
    let root = XmlValue::from(document.root());

    let schema = Generic::<Xml> {
        value: Field::new(XPathExtractor::new("string(//li[2]/div[@class='title'])")),
    }
    .schema()
    .expect("Failed to build schema");

    assert_eq!(
        Item::bare(&schema)
            .extract(&root)
            .expect("Failed to extract")
            .to_json(),
        json!({"value": "Title 2"})
    );
}
