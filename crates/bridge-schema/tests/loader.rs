use bridge_core::{Role, TypeDescriptor};
use bridge_schema::{ArgumentError, SchemaError, SchemaLoader, SchemaRegistry};
use serde_json::json;

const MOBILE_SYSTEM_FACADE: &str = r#"{
  "name": "MobileSystemFacade",
  "type": "facade",
  "senders": ["web"],
  "receivers": ["ios", "android"],
  "doc": "Common operations implemented by each mobile platform.",
  "methods": {
    "findSuggestions": {
      "doc": "Find suggestions in the OS contact provider.",
      "arg": [{ "query": "string" }],
      "ret": "List<NativeContact>"
    },
    "openLink": {
      "doc": "Open URI in the OS.",
      "arg": [{ "uri": "string" }],
      "ret": "boolean"
    },
    "shareText": {
      "arg": [{ "text": "string" }, { "title": "string" }],
      "ret": "boolean"
    },
    "setAppLock": {
      "arg": [{ "enabled": "boolean" }],
      "ret": "void"
    }
  }
}"#;

const NATIVE_CONTACT: &str = r#"{
  "name": "NativeContact",
  "type": "struct",
  "doc": "Contact as returned by the OS contact provider.",
  "fields": { "name": "string", "mailAddress": "string" }
}"#;

fn load(documents: &[&str]) -> Result<SchemaRegistry, SchemaError> {
    let mut loader = SchemaLoader::new();
    for (index, text) in documents.iter().enumerate() {
        loader.add_json_str(&format!("doc{index}.json"), text)?;
    }
    loader.finish()
}

#[test]
fn lookup_round_trips_declared_signatures() {
    let registry = load(&[MOBILE_SYSTEM_FACADE, NATIVE_CONTACT]).expect("registry");
    let facade = registry.facade("MobileSystemFacade").expect("facade");

    assert_eq!(facade.senders.iter().map(Role::as_str).collect::<Vec<_>>(), vec!["web"]);
    assert!(facade.can_receive(&Role::new("android")));
    assert_eq!(facade.methods.len(), 4);

    let share = facade.method("shareText").expect("method");
    let names: Vec<_> = share.params.iter().map(|param| param.name.as_str()).collect();
    assert_eq!(names, vec!["text", "title"]);
    assert_eq!(share.ret, TypeDescriptor::boolean());

    let find = facade.method("findSuggestions").expect("method");
    assert_eq!(find.ret.to_string(), "List<NativeContact>");
    assert_eq!(find.signature(), "findSuggestions(query: string) -> List<NativeContact>");

    let contact = registry.structure("NativeContact").expect("struct");
    let fields: Vec<_> = contact.fields.iter().map(|field| field.name.as_str()).collect();
    assert_eq!(fields, vec!["name", "mailAddress"]);
}

#[test]
fn filters_facades_by_role() {
    let registry = load(&[MOBILE_SYSTEM_FACADE, NATIVE_CONTACT]).expect("registry");
    assert_eq!(registry.facades_for_sender(&Role::new("web")).count(), 1);
    assert_eq!(registry.facades_for_receiver(&Role::new("web")).count(), 0);
    assert_eq!(registry.facades_for_receiver(&Role::new("ios")).count(), 1);
}

#[test]
fn rejects_unresolved_named_type() {
    let err = load(&[MOBILE_SYSTEM_FACADE]).expect_err("NativeContact missing");
    assert!(matches!(
        err,
        SchemaError::UnresolvedType { ref name, .. } if name == "NativeContact"
    ));
}

#[test]
fn typeref_satisfies_named_reference() {
    let typeref = r#"{ "name": "NativeContact", "type": "typeref", "location": { "typescript": "../Contact.js" } }"#;
    let registry = load(&[MOBILE_SYSTEM_FACADE, typeref]).expect("registry");
    assert!(registry.typeref("NativeContact").is_some());
    assert!(registry.resolves("NativeContact"));
}

#[test]
fn rejects_duplicate_method_names() {
    let text = r#"{
      "name": "CommonSystemFacade", "type": "facade",
      "senders": ["web"], "receivers": ["desktop"],
      "methods": {
        "initializeDone": { "arg": [], "ret": "void" },
        "initializeDone": { "arg": [], "ret": "void" }
      }
    }"#;
    let err = load(&[text]).expect_err("duplicate method");
    assert!(matches!(
        err,
        SchemaError::DuplicateMethod { ref facade, ref method }
            if facade == "CommonSystemFacade" && method == "initializeDone"
    ));
}

#[test]
fn rejects_duplicate_parameter_names() {
    let doc = json!({
        "name": "FileFacade", "type": "facade",
        "senders": ["web"], "receivers": ["desktop"],
        "methods": { "copy": { "arg": [{ "path": "string" }, { "path": "string" }], "ret": "void" } }
    });
    let err = SchemaRegistry::from_documents([&doc]).expect_err("duplicate param");
    assert!(matches!(err, SchemaError::DuplicateParameter { ref param, .. } if param == "path"));
}

#[test]
fn rejects_multi_key_parameter() {
    let doc = json!({
        "name": "FileFacade", "type": "facade",
        "senders": ["web"], "receivers": ["desktop"],
        "methods": { "copy": { "arg": [{ "from": "string", "to": "string" }], "ret": "void" } }
    });
    let err = SchemaRegistry::from_documents([&doc]).expect_err("two keys");
    assert!(matches!(err, SchemaError::MalformedParameter { index: 0, .. }));
}

#[test]
fn rejects_empty_role_sets() {
    let doc = json!({
        "name": "FileFacade", "type": "facade",
        "senders": [], "receivers": ["desktop"],
        "methods": {}
    });
    let err = SchemaRegistry::from_documents([&doc]).expect_err("no senders");
    assert!(matches!(err, SchemaError::EmptyRoleSet { side: "senders", .. }));
}

#[test]
fn rejects_void_parameter_and_nested_void_return() {
    let param = json!({
        "name": "F", "type": "facade", "senders": ["web"], "receivers": ["ios"],
        "methods": { "m": { "arg": [{ "x": "void" }], "ret": "void" } }
    });
    assert!(matches!(
        SchemaRegistry::from_documents([&param]),
        Err(SchemaError::MisplacedVoid { .. })
    ));

    let ret = json!({
        "name": "F", "type": "facade", "senders": ["web"], "receivers": ["ios"],
        "methods": { "m": { "arg": [], "ret": "List<void>" } }
    });
    assert!(matches!(
        SchemaRegistry::from_documents([&ret]),
        Err(SchemaError::MisplacedVoid { .. })
    ));
}

#[test]
fn rejects_bad_map_key_and_bad_type_text() {
    let map = json!({
        "name": "F", "type": "facade", "senders": ["web"], "receivers": ["ios"],
        "methods": { "m": { "arg": [{ "x": "Map<boolean, string>" }], "ret": "void" } }
    });
    assert!(matches!(
        SchemaRegistry::from_documents([&map]),
        Err(SchemaError::InvalidMapKey { .. })
    ));

    let text = json!({
        "name": "F", "type": "facade", "senders": ["web"], "receivers": ["ios"],
        "methods": { "m": { "arg": [{ "x": "List<string" }], "ret": "void" } }
    });
    assert!(matches!(
        SchemaRegistry::from_documents([&text]),
        Err(SchemaError::InvalidType { .. })
    ));
}

#[test]
fn rejects_duplicate_definitions_across_documents() {
    let err = load(&[NATIVE_CONTACT, NATIVE_CONTACT]).expect_err("defined twice");
    assert!(matches!(
        err,
        SchemaError::DuplicateDefinition { ref first, ref second, .. }
            if first == "doc0.json" && second == "doc1.json"
    ));
}

#[test]
fn reports_missing_fields_with_source_label() {
    let mut loader = SchemaLoader::new();
    let err = loader
        .add_json_str("broken.json", r#"{ "name": "F", "type": "facade", "senders": ["web"] }"#)
        .expect_err("missing receivers");
    match err {
        SchemaError::Decode { source_label, error } => {
            assert_eq!(source_label, "broken.json");
            assert_eq!(error.path, "$.receivers");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn rejects_unknown_document_type() {
    let doc = json!({ "name": "X", "type": "enum" });
    assert!(matches!(
        SchemaRegistry::from_documents([&doc]),
        Err(SchemaError::UnknownDocumentType { ref kind, .. }) if kind == "enum"
    ));
}

#[test]
fn loads_directory_in_file_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("MobileSystemFacade.json"), MOBILE_SYSTEM_FACADE).expect("write");
    std::fs::write(dir.path().join("NativeContact.json"), NATIVE_CONTACT).expect("write");
    std::fs::write(dir.path().join("README.md"), "not a schema").expect("write");

    let registry = SchemaRegistry::from_dir(dir.path()).expect("registry");
    assert_eq!(registry.len(), 1);
    assert!(registry.structure("NativeContact").is_some());
}

#[test]
fn checks_call_arguments() {
    let registry = load(&[MOBILE_SYSTEM_FACADE, NATIVE_CONTACT]).expect("registry");
    let facade = registry.facade("MobileSystemFacade").expect("facade");
    let share = facade.method("shareText").expect("method");

    registry
        .check_arguments(facade, share, &[json!("hello"), json!("greeting")])
        .expect("valid args");

    let err = registry
        .check_arguments(facade, share, &[json!("hello")])
        .expect_err("too few");
    assert!(matches!(err, ArgumentError::Count { expected: 2, found: 1, .. }));

    let err = registry
        .check_arguments(facade, share, &[json!("hello"), json!(5)])
        .expect_err("wrong type");
    match err {
        ArgumentError::Type { param, mismatch, .. } => {
            assert_eq!(param, "title");
            assert_eq!(mismatch.path, "title");
            assert_eq!(mismatch.found, "number");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn rejects_invalid_identifiers() {
    let doc = json!({
        "name": "FileFacade", "type": "facade",
        "senders": ["web"], "receivers": ["desktop"],
        "methods": { "open-file": { "arg": [], "ret": "void" } }
    });
    assert!(matches!(
        SchemaRegistry::from_documents([&doc]),
        Err(SchemaError::InvalidIdentifier { ref name }) if name == "open-file"
    ));

    let structure = json!({ "name": "2fa", "type": "struct", "fields": {} });
    assert!(matches!(
        SchemaRegistry::from_documents([&structure]),
        Err(SchemaError::InvalidIdentifier { ref name }) if name == "2fa"
    ));
}

#[test]
fn rejects_blank_and_padded_roles() {
    for role in ["", "   ", " web", "android "] {
        let doc = json!({
            "name": "FileFacade", "type": "facade",
            "senders": [role], "receivers": ["desktop"],
            "methods": {}
        });
        let err = SchemaRegistry::from_documents([&doc]).expect_err("bad role");
        assert!(
            matches!(err, SchemaError::InvalidRole { role: ref found, .. } if found == role),
            "role {role:?}: {err}"
        );
    }
}

#[test]
fn rejects_repeated_struct_field_in_text() {
    let text = r#"{
      "name": "NativeContact", "type": "struct",
      "fields": { "name": "string", "mailAddress": "string", "name": "string?" }
    }"#;
    let err = load(&[text]).expect_err("duplicate field");
    assert!(matches!(
        err,
        SchemaError::DuplicateField { ref structure, ref field }
            if structure == "NativeContact" && field == "name"
    ));
}

#[test]
fn rejects_repeated_top_level_key() {
    let text = r#"{
      "name": "FileFacade", "type": "facade",
      "senders": ["web"], "receivers": ["desktop"], "senders": ["ios"],
      "methods": {}
    }"#;
    let err = load(&[text]).expect_err("duplicate senders");
    assert!(matches!(
        err,
        SchemaError::DuplicateKey { ref source_label, ref path }
            if source_label == "doc0.json" && path == "senders"
    ));
}

#[test]
fn repeated_key_inside_parameter_is_malformed() {
    let text = r#"{
      "name": "FileFacade", "type": "facade",
      "senders": ["web"], "receivers": ["desktop"],
      "methods": {
        "copy": { "arg": [{ "from": "string" }, { "to": "string", "to": "bytes" }], "ret": "void" }
      }
    }"#;
    let err = load(&[text]).expect_err("two keys in one parameter");
    assert!(matches!(
        err,
        SchemaError::MalformedParameter { ref owner, index: 1 } if owner == "FileFacade.copy"
    ));
}

#[test]
fn rejects_names_that_collide_in_rust() {
    let structure = json!({
        "name": "NativeContact", "type": "struct",
        "fields": { "mailAddress": "string", "mail_address": "string" }
    });
    assert!(matches!(
        SchemaRegistry::from_documents([&structure]),
        Err(SchemaError::IdentifierCollision { ref owner, ref first, ref second })
            if owner == "NativeContact" && first == "mailAddress" && second == "mail_address"
    ));

    let params = json!({
        "name": "FileFacade", "type": "facade",
        "senders": ["web"], "receivers": ["desktop"],
        "methods": { "open": { "arg": [{ "filePath": "string" }, { "file_path": "string" }], "ret": "void" } }
    });
    assert!(matches!(
        SchemaRegistry::from_documents([&params]),
        Err(SchemaError::IdentifierCollision { ref owner, .. }) if owner == "FileFacade.open"
    ));

    let methods = json!({
        "name": "FileFacade", "type": "facade",
        "senders": ["web"], "receivers": ["desktop"],
        "methods": {
            "getURL": { "arg": [], "ret": "string" },
            "get_url": { "arg": [], "ret": "string" }
        }
    });
    assert!(matches!(
        SchemaRegistry::from_documents([&methods]),
        Err(SchemaError::IdentifierCollision { ref owner, .. }) if owner == "FileFacade"
    ));
}
