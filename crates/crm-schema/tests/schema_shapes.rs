use crm_orm::Model;
use crm_schema::{ModelCatalog, SchemaRegistry};

#[derive(Model)]
#[orm(table = "role")]
struct Role {
    #[orm(primary_key)]
    id: i32,
    #[orm(char(max_length = 64), unique)]
    name: String,
    #[orm(one2many(target = "user", back_field = "role_id"))]
    users: (),
}

#[derive(Model)]
#[orm(table = "user")]
struct User {
    #[orm(primary_key)]
    id: i32,
    #[orm(char(max_length = 255), unique, required)]
    username: String,
    #[orm(null = true, many2one(target = "role"))]
    role_id: Option<i32>,
}

fn registry() -> SchemaRegistry {
    let mut catalog = ModelCatalog::new();
    catalog.register::<Role>();
    catalog.register::<User>();
    SchemaRegistry::build_all(&catalog)
}

#[test]
fn create_schema_drops_id_and_turns_many2one_into_id_or_virtual_id() {
    let registry = registry();
    let create = registry.get_create_schema("user").unwrap();
    let properties = create["properties"].as_object().unwrap();

    assert!(!properties.contains_key("id"));
    assert!(properties.contains_key("username"));
    assert_eq!(create["required"], serde_json::json!(["username"]));

    let role_prop = &properties["role"];
    assert!(role_prop["oneOf"].is_array());
}

#[test]
fn update_schema_has_no_required_fields() {
    let registry = registry();
    let update = registry.get_update_schema("user").unwrap();
    assert_eq!(update["required"], serde_json::json!([]));
    assert!(update["properties"].as_object().unwrap().contains_key("username"));
}

#[test]
fn search_output_reduces_many2one_to_id_and_name() {
    let registry = registry();
    let search_output = registry.get_search_output_schema("user").unwrap();
    let role_prop = &search_output["properties"]["role"];
    assert_eq!(role_prop["type"], "object");
    assert!(role_prop["properties"].as_object().unwrap().contains_key("id"));
    assert!(role_prop["properties"].as_object().unwrap().contains_key("name"));
}

#[test]
fn read_output_nests_one_level_then_flattens_relations_to_id_and_name() {
    let registry = registry();
    let user_read = registry.get_read_output_schema("user").unwrap();
    let role_nested = &user_read["properties"]["role"];
    // second level: role's own "users" relation must already be {id,name}-shaped
    let nested_users = &role_nested["properties"]["users"];
    assert_eq!(nested_users["type"], "array");
    let item_props = nested_users["items"]["properties"].as_object().unwrap();
    assert_eq!(item_props.len(), 2);
    assert!(item_props.contains_key("id"));
    assert!(item_props.contains_key("name"));
}

#[test]
fn mutually_referencing_models_terminate_without_recursing_forever() {
    // role -> user -> role would recurse indefinitely without the
    // second-level flatten; just reaching this point without a stack
    // overflow/hang is the property under test.
    let registry = registry();
    assert!(registry.get_read_output_schema("role").is_some());
    assert!(registry.get_read_output_schema("user").is_some());
}

#[test]
fn fields_not_subset_of_allowed_is_rejected() {
    let registry = registry();
    let set = registry.get("user").unwrap();
    assert!(set.fields_subset_of_allowed(&["username".to_string(), "role".to_string()]));
    assert!(!set.fields_subset_of_allowed(&["nonexistent_field".to_string()]));
}

#[test]
fn triplets_cover_scalar_and_relation_fields() {
    let registry = registry();
    let triplets = registry.get_triplets("user");
    let names: Vec<&str> = triplets.iter().map(|t| t.field.as_str()).collect();
    assert!(names.contains(&"username"));
    assert!(names.contains(&"role"));
}

#[test]
fn search_input_restricts_sort_to_stored_columns() {
    let registry = registry();
    let search_input = registry.get_search_input_schema("user").unwrap();
    let sort_enum = search_input["properties"]["sort"]["enum"].as_array().unwrap();
    let sort_names: Vec<&str> = sort_enum.iter().map(|v| v.as_str().unwrap()).collect();
    assert!(sort_names.contains(&"id"));
    assert!(sort_names.contains(&"username"));
    assert!(!sort_names.contains(&"role"));
}
