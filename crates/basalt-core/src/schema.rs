//! Schema compiler — validation, translation and compatibility checks
//! for declarative collection schemas.
//!
//! A collection schema is a JSON document whose single top-level key
//! is the collection type name. Field nodes carry `_type`,
//! `_required`, `_language` and `_array` meta keys; nested objects are
//! further object trees. The top level may carry an `_acl` sub-tree
//! (role → permission names) and an `_id` property path.
//!
//! `translate` turns a validated schema into the storage engine's
//! mapping grammar, embedding the source document verbatim under
//! `_meta` so it can be read back unchanged. The translation is
//! deterministic: re-translating an unchanged schema yields
//! byte-identical output.

use serde_json::{Map, Value, json};
use tracing::debug;

use crate::acl::{AclSettings, Permission, RolePermissions, default_role_permissions};
use crate::error::{BasaltError, BasaltResult};
use crate::store::SchemaStore;

/// Recognized `_type` tags for field nodes.
const FIELD_TYPES: &[&str] = &[
    "string",
    "text",
    "boolean",
    "integer",
    "long",
    "float",
    "double",
    "date",
    "time",
    "timestamp",
    "enum",
    "geopoint",
    "object",
    "stash",
];

/// A schema that passed [`validate`]. Holds the source document
/// verbatim.
#[derive(Debug, Clone)]
pub struct ValidatedSchema {
    type_name: String,
    document: Value,
}

impl ValidatedSchema {
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The source schema document, as supplied.
    pub fn document(&self) -> &Value {
        &self.document
    }

    fn body(&self) -> &Map<String, Value> {
        // validated: top level is an object holding the type name key
        self.document
            .as_object()
            .and_then(|o| o.get(&self.type_name))
            .and_then(Value::as_object)
            .expect("validated schema has a body")
    }

    /// The embedded permission matrix, if the schema declares one.
    pub fn acl(&self) -> Option<RolePermissions> {
        parse_acl(self.body().get("_acl")?).ok()
    }
}

fn is_meta_key(key: &str) -> bool {
    key.starts_with('_')
}

fn parse_acl(node: &Value) -> BasaltResult<RolePermissions> {
    let roles = node
        .as_object()
        .ok_or_else(|| BasaltError::validation("_acl must be an object of role to permissions"))?;

    let mut matrix = RolePermissions::new();
    for (role, permissions) in roles {
        let names = permissions.as_array().ok_or_else(|| {
            BasaltError::validation(format!("_acl role [{role}] must map to a permission array"))
        })?;
        let mut set = std::collections::BTreeSet::new();
        for name in names {
            let name = name.as_str().ok_or_else(|| {
                BasaltError::validation(format!("_acl role [{role}] contains a non-string entry"))
            })?;
            let permission = Permission::from_name(name).ok_or_else(|| {
                BasaltError::validation(format!(
                    "unknown permission [{name}] in _acl for role [{role}]"
                ))
            })?;
            set.insert(permission);
        }
        matrix.insert(role.clone(), set);
    }
    Ok(matrix)
}

/// Validates a schema document for collection type `type_name`.
///
/// Checks that every field node has a recognized `_type` tag, that
/// object nesting is well-formed, and that the `_acl` sub-tree only
/// references known permission names. Errors identify the offending
/// dotted field path.
pub fn validate(type_name: &str, document: &Value) -> BasaltResult<ValidatedSchema> {
    let top = document
        .as_object()
        .ok_or_else(|| BasaltError::validation("schema must be a JSON object"))?;

    let body = top
        .get(type_name)
        .ok_or_else(|| {
            BasaltError::validation(format!("schema must have [{type_name}] as top-level key"))
        })?
        .as_object()
        .ok_or_else(|| {
            BasaltError::validation(format!("schema [{type_name}] must map to an object"))
        })?;

    if let Some(acl) = body.get("_acl") {
        parse_acl(acl)?;
    }

    for (key, node) in body {
        if !is_meta_key(key) {
            validate_field(&format!("{type_name}.{key}"), node)?;
        }
    }

    Ok(ValidatedSchema {
        type_name: type_name.to_string(),
        document: document.clone(),
    })
}

fn validate_field(path: &str, node: &Value) -> BasaltResult<()> {
    let fields = node.as_object().ok_or_else(|| {
        BasaltError::validation(format!("field [{path}] must be an object node"))
    })?;

    let type_tag = fields
        .get("_type")
        .ok_or_else(|| BasaltError::validation(format!("field [{path}] is missing _type")))?
        .as_str()
        .ok_or_else(|| BasaltError::validation(format!("field [{path}] _type must be a string")))?;

    if !FIELD_TYPES.contains(&type_tag) {
        return Err(BasaltError::validation(format!(
            "field [{path}] has unknown type [{type_tag}]"
        )));
    }

    let children: Vec<(&String, &Value)> = fields
        .iter()
        .filter(|(key, _)| !is_meta_key(key))
        .collect();

    if type_tag == "object" {
        if children.is_empty() {
            return Err(BasaltError::validation(format!(
                "object field [{path}] must declare at least one property"
            )));
        }
        for (key, child) in children {
            validate_field(&format!("{path}.{key}"), child)?;
        }
    } else if !children.is_empty() {
        return Err(BasaltError::validation(format!(
            "field [{path}] of type [{type_tag}] must not declare nested properties"
        )));
    }

    Ok(())
}

/// Translates a validated schema into the storage engine's mapping
/// grammar. The source document is embedded verbatim under `_meta`;
/// the storage engine never interprets it.
pub fn translate(schema: &ValidatedSchema) -> Value {
    let properties = translate_properties(schema.body());

    debug!(type_name = %schema.type_name(), "translated schema into mapping");

    json!({
        schema.type_name(): {
            "dynamic": "strict",
            "_meta": schema.document(),
            "properties": properties,
        }
    })
}

fn translate_properties(body: &Map<String, Value>) -> Value {
    let mut properties = Map::new();
    for (key, node) in body {
        if is_meta_key(key) {
            continue;
        }
        // validated nodes are objects with a recognized _type
        let fields = node.as_object().expect("validated field node");
        let type_tag = fields
            .get("_type")
            .and_then(Value::as_str)
            .expect("validated field type");
        properties.insert(key.clone(), translate_field(type_tag, fields));
    }
    Value::Object(properties)
}

fn translate_field(type_tag: &str, fields: &Map<String, Value>) -> Value {
    match type_tag {
        "string" | "enum" => json!({ "type": "keyword" }),
        "text" => {
            let analyzer = fields
                .get("_language")
                .and_then(Value::as_str)
                .unwrap_or("standard");
            json!({ "type": "text", "analyzer": analyzer })
        }
        "boolean" => json!({ "type": "boolean" }),
        "integer" => json!({ "type": "integer" }),
        "long" => json!({ "type": "long" }),
        "float" => json!({ "type": "float" }),
        "double" => json!({ "type": "double" }),
        "date" => json!({ "type": "date", "format": "date" }),
        "time" => json!({ "type": "date", "format": "hour_minute_second" }),
        "timestamp" => json!({ "type": "date", "format": "date_time" }),
        "geopoint" => json!({ "type": "geo_point" }),
        "stash" => json!({ "type": "object", "enabled": false }),
        "object" => json!({
            "type": "object",
            "properties": translate_properties(fields),
        }),
        other => unreachable!("unvalidated field type [{other}]"),
    }
}

/// Rejects structural changes that are incompatible with already
/// stored data: a field present in both schemas whose `_type` or
/// `_array` flag changed. Field additions are allowed.
pub fn check_compatible(
    type_name: &str,
    stored: &ValidatedSchema,
    updated: &ValidatedSchema,
) -> BasaltResult<()> {
    check_fields_compatible(type_name, type_name, stored.body(), updated.body())
}

fn check_fields_compatible(
    type_name: &str,
    path: &str,
    stored: &Map<String, Value>,
    updated: &Map<String, Value>,
) -> BasaltResult<()> {
    for (key, old_node) in stored {
        if is_meta_key(key) {
            continue;
        }
        let Some(new_node) = updated.get(key) else {
            continue;
        };
        let field_path = format!("{path}.{key}");
        let old = old_node.as_object().expect("validated field node");
        let new = new_node.as_object().expect("validated field node");

        let old_type = old.get("_type").and_then(Value::as_str);
        let new_type = new.get("_type").and_then(Value::as_str);
        if old_type != new_type {
            return Err(BasaltError::IncompatibleSchema {
                type_name: type_name.to_string(),
                detail: format!(
                    "field [{field_path}] type changed from [{}] to [{}]",
                    old_type.unwrap_or("?"),
                    new_type.unwrap_or("?")
                ),
            });
        }

        let old_array = old.get("_array").and_then(Value::as_bool).unwrap_or(false);
        let new_array = new.get("_array").and_then(Value::as_bool).unwrap_or(false);
        if old_array != new_array {
            return Err(BasaltError::IncompatibleSchema {
                type_name: type_name.to_string(),
                detail: format!("field [{field_path}] array flag changed"),
            });
        }

        if old_type == Some("object") {
            check_fields_compatible(type_name, &field_path, old, new)?;
        }
    }
    Ok(())
}

/// Store-backed schema management: compile on write, read `_meta`
/// back verbatim, and expose the per-tenant ACL settings document.
pub struct SchemaService<S> {
    store: S,
}

impl<S: SchemaStore> SchemaService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Validates, checks compatibility against the stored mapping,
    /// translates and persists a collection schema. Incompatible
    /// updates are rejected before anything reaches the store.
    pub async fn set_schema(
        &self,
        tenant: &str,
        type_name: &str,
        document: Value,
    ) -> BasaltResult<()> {
        let updated = validate(type_name, &document)?;

        if let Some(mapping) = self.store.get_mapping(tenant, type_name).await? {
            let stored_document = meta_of(&mapping, type_name)?;
            let stored = validate(type_name, &stored_document)?;
            check_compatible(type_name, &stored, &updated)?;
        }

        let mapping = translate(&updated);
        self.store.put_mapping(tenant, type_name, mapping).await
    }

    /// The schema document as supplied at `set_schema` time, read back
    /// from the mapping's `_meta`.
    pub async fn get_schema(&self, tenant: &str, type_name: &str) -> BasaltResult<Option<Value>> {
        match self.store.get_mapping(tenant, type_name).await? {
            Some(mapping) => Ok(Some(meta_of(&mapping, type_name)?)),
            None => Ok(None),
        }
    }

    pub async fn delete_schema(&self, tenant: &str, type_name: &str) -> BasaltResult<()> {
        self.store.delete_mapping(tenant, type_name).await
    }

    /// The merged ACL settings document: one role matrix per declared
    /// collection type. Types declared without an `_acl` report the
    /// built-in default matrix.
    pub async fn acl_settings(&self, tenant: &str) -> BasaltResult<AclSettings> {
        let mut settings = AclSettings::new();
        for (type_name, mapping) in self.store.list_mappings(tenant).await? {
            let document = meta_of(&mapping, &type_name)?;
            let schema = validate(&type_name, &document)?;
            let matrix = schema.acl().unwrap_or_else(default_role_permissions);
            settings.insert(type_name, matrix);
        }
        Ok(settings)
    }

    /// Replaces the permission matrix of every named type wholesale;
    /// the new matrix fully supersedes the old one, never a partial
    /// merge. Naming an undeclared type is a validation error.
    pub async fn set_acl_settings(&self, tenant: &str, settings: AclSettings) -> BasaltResult<()> {
        for (type_name, matrix) in settings {
            let document = self.get_schema(tenant, &type_name).await?.ok_or_else(|| {
                BasaltError::validation(format!(
                    "no schema declared for collection type [{type_name}]"
                ))
            })?;

            let mut document = document;
            let body = document
                .as_object_mut()
                .and_then(|o| o.get_mut(&type_name))
                .and_then(Value::as_object_mut)
                .ok_or_else(|| BasaltError::InternalConsistency {
                    detail: format!("stored schema [{type_name}] has no body"),
                })?;
            body.insert("_acl".into(), serde_json::to_value(&matrix).map_err(
                |e| BasaltError::Internal(format!("failed to encode acl: {e}")),
            )?);

            self.set_schema(tenant, &type_name, document).await?;
        }
        Ok(())
    }
}

fn meta_of(mapping: &Value, type_name: &str) -> BasaltResult<Value> {
    mapping
        .get(type_name)
        .and_then(|m| m.get("_meta"))
        .cloned()
        .ok_or_else(|| BasaltError::InternalConsistency {
            detail: format!("stored mapping for [{type_name}] carries no _meta"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn car_schema() -> Value {
        json!({
            "car": {
                "serialNumber": { "_type": "string", "_required": true },
                "buyDate": { "_type": "date", "_required": true },
                "color": { "_type": "enum", "_required": true },
                "techChecked": { "_type": "boolean" },
                "model": {
                    "_type": "object",
                    "_required": true,
                    "description": { "_type": "text", "_language": "french" },
                    "fiscalPower": { "_type": "integer" },
                    "size": { "_type": "float" }
                },
                "location": { "_type": "geopoint" }
            }
        })
    }

    #[test]
    fn validates_a_well_formed_schema() {
        assert!(validate("car", &car_schema()).is_ok());
    }

    #[test]
    fn rejects_unknown_type_tag_with_field_path() {
        let schema = json!({ "toto": { "color": { "_type": "XXX" } } });
        let err = validate("toto", &schema).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("toto.color"), "{message}");
        assert!(message.contains("XXX"), "{message}");
    }

    #[test]
    fn rejects_missing_type_tag() {
        let schema = json!({ "toto": { "color": { "_required": true } } });
        assert!(validate("toto", &schema).is_err());
    }

    #[test]
    fn rejects_nested_properties_on_leaf_fields() {
        let schema = json!({
            "toto": { "color": { "_type": "string", "shade": { "_type": "string" } } }
        });
        let err = validate("toto", &schema).unwrap_err();
        assert!(err.to_string().contains("toto.color"));
    }

    #[test]
    fn rejects_wrong_top_level_key() {
        let err = validate("car", &json!({ "bike": {} })).unwrap_err();
        assert!(matches!(err, BasaltError::Validation { .. }));
    }

    #[test]
    fn rejects_unknown_permission_in_acl() {
        let schema = json!({
            "message": {
                "_acl": { "admin": ["search", "obliterate"] },
                "text": { "_type": "text" }
            }
        });
        let err = validate("message", &schema).unwrap_err();
        assert!(err.to_string().contains("obliterate"));
    }

    #[test]
    fn parses_embedded_acl() {
        let schema = json!({
            "message": {
                "_acl": { "admin": ["search"], "iron": ["read_all"] },
                "text": { "_type": "text" }
            }
        });
        let validated = validate("message", &schema).unwrap();
        let acl = validated.acl().unwrap();
        assert_eq!(acl.len(), 2);
        assert!(acl["admin"].contains(&Permission::Search));
        assert!(acl["iron"].contains(&Permission::ReadAll));
    }

    #[test]
    fn translation_embeds_schema_verbatim() {
        let schema = car_schema();
        let validated = validate("car", &schema).unwrap();
        let mapping = translate(&validated);

        assert_eq!(mapping["car"]["_meta"], schema);
        assert_eq!(mapping["car"]["dynamic"], "strict");
        assert_eq!(mapping["car"]["properties"]["serialNumber"]["type"], "keyword");
        assert_eq!(mapping["car"]["properties"]["buyDate"]["format"], "date");
        assert_eq!(
            mapping["car"]["properties"]["model"]["properties"]["description"]["analyzer"],
            "french"
        );
        assert_eq!(mapping["car"]["properties"]["location"]["type"], "geo_point");
    }

    #[test]
    fn translation_is_idempotent() {
        let validated = validate("car", &car_schema()).unwrap();
        let first = serde_json::to_string(&translate(&validated)).unwrap();
        let second = serde_json::to_string(&translate(&validated)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn type_change_is_incompatible() {
        let stored = validate("car", &car_schema()).unwrap();

        let mut updated = car_schema();
        updated["car"]["color"]["_type"] = json!("date");
        let updated = validate("car", &updated).unwrap();

        let err = check_compatible("car", &stored, &updated).unwrap_err();
        match err {
            BasaltError::IncompatibleSchema { detail, .. } => {
                assert!(detail.contains("car.color"), "{detail}");
            }
            other => panic!("expected IncompatibleSchema, got {other:?}"),
        }
    }

    #[test]
    fn nested_type_change_is_incompatible() {
        let stored = validate("car", &car_schema()).unwrap();

        let mut updated = car_schema();
        updated["car"]["model"]["fiscalPower"]["_type"] = json!("string");
        let updated = validate("car", &updated).unwrap();

        assert!(check_compatible("car", &stored, &updated).is_err());
    }

    #[test]
    fn array_flag_change_is_incompatible() {
        let stored = json!({ "sale": { "items": { "_type": "string", "_array": true } } });
        let updated = json!({ "sale": { "items": { "_type": "string" } } });
        let stored = validate("sale", &stored).unwrap();
        let updated = validate("sale", &updated).unwrap();
        assert!(check_compatible("sale", &stored, &updated).is_err());
    }

    #[test]
    fn field_addition_is_compatible() {
        let stored = validate("car", &car_schema()).unwrap();

        let mut updated = car_schema();
        updated["car"]["nickname"] = json!({ "_type": "string" });
        let updated = validate("car", &updated).unwrap();

        assert!(check_compatible("car", &stored, &updated).is_ok());
    }
}
