#![forbid(unsafe_code)]

//! End-to-end binding scenarios against the reference document model.

use proxyland_core::{BindTarget, Engine, EngineConfig, Value};
use proxyland_dom::Document;
use proxyland_harness::{attr_of, engine_on, fixture, list_at, map_at, text_of};
use serde_json::json;

fn join(list: &Value, separator: &str) -> Value {
    list.as_list()
        .map(|list| Value::from(list.join(separator)))
        .unwrap_or_default()
}

// ============================================================================
// Text content
// ============================================================================

#[test]
fn field_binding_follows_writes() {
    let doc = fixture(r#"<div id="simple"></div>"#);
    let engine = engine_on(&doc, json!({"value": "initial"}));

    engine.bind_field("#simple", "value").unwrap();
    assert_eq!(text_of(&doc, "#simple"), "initial");

    map_at(&engine, "").set("value", "updated");
    assert_eq!(text_of(&doc, "#simple"), "updated");
}

#[test]
fn nested_field_binding() {
    let doc = fixture(r#"<div id="nested"></div>"#);
    let engine = engine_on(&doc, json!({"nested": {"value": "initial"}}));

    engine
        .bind_map("#nested", |data| data.pointer("/nested/value"))
        .unwrap();
    assert_eq!(text_of(&doc, "#nested"), "initial");

    map_at(&engine, "/nested").set("value", "updated");
    assert_eq!(text_of(&doc, "#nested"), "updated");
}

#[test]
fn list_push_and_pop() {
    let doc = fixture(r#"<div id="array"></div>"#);
    let engine = engine_on(&doc, json!({"list": [1, 2, 3]}));

    engine
        .bind_map("#array", |data| join(&data.get("list").unwrap_or_default(), ", "))
        .unwrap();
    assert_eq!(text_of(&doc, "#array"), "1, 2, 3");

    let list = list_at(&engine, "/list");
    assert_eq!(list.push(4), 4);
    assert_eq!(text_of(&doc, "#array"), "1, 2, 3, 4");

    assert_eq!(list.pop(), Some(Value::from(4)));
    assert_eq!(text_of(&doc, "#array"), "1, 2, 3");
}

#[test]
fn positional_write() {
    let doc = fixture(r#"<div id="array"></div>"#);
    let engine = engine_on(&doc, json!({"list": [1, 2, 3]}));
    engine
        .bind_map("#array", |data| join(&data.get("list").unwrap_or_default(), ", "))
        .unwrap();

    list_at(&engine, "/list").set(1, 4);
    assert_eq!(text_of(&doc, "#array"), "1, 4, 3");
}

#[test]
fn splice_removes_a_range() {
    let doc = fixture(r#"<div id="splice"></div>"#);
    let engine = engine_on(&doc, json!({"list": [1, 2, 3, 4, 5]}));
    engine
        .bind_map("#splice", |data| join(&data.get("list").unwrap_or_default(), ", "))
        .unwrap();

    let removed = list_at(&engine, "/list").splice(1, 2, Vec::<Value>::new());
    assert_eq!(removed, vec![Value::from(2), Value::from(3)]);
    assert_eq!(text_of(&doc, "#splice"), "1, 4, 5");
}

#[test]
fn shift_removes_the_first_element() {
    let doc = fixture(r#"<div id="shift"></div>"#);
    let engine = engine_on(&doc, json!({"list": [1, 2, 3]}));
    engine
        .bind_map("#shift", |data| join(&data.get("list").unwrap_or_default(), ", "))
        .unwrap();

    assert_eq!(list_at(&engine, "/list").shift(), Some(Value::from(1)));
    assert_eq!(text_of(&doc, "#shift"), "2, 3");
}

#[test]
fn unshift_inserts_in_order() {
    let doc = fixture(r#"<div id="out"></div>"#);
    let engine = engine_on(&doc, json!({"list": [3]}));
    engine
        .bind_map("#out", |data| join(&data.get("list").unwrap_or_default(), ""))
        .unwrap();

    assert_eq!(list_at(&engine, "/list").unshift([1, 2]), 3);
    assert_eq!(text_of(&doc, "#out"), "123");
}

// ============================================================================
// Attributes
// ============================================================================

#[test]
fn attribute_follows_writes() {
    let doc = fixture(r#"<div id="attr-simple" data-test="initial"></div>"#);
    let engine = engine_on(&doc, json!({"value": "initial"}));

    engine
        .bind_field(BindTarget::attribute("#attr-simple", "data-test"), "value")
        .unwrap();
    assert_eq!(
        attr_of(&doc, "#attr-simple", "data-test").as_deref(),
        Some("initial")
    );

    map_at(&engine, "").set("value", "updated");
    assert_eq!(
        attr_of(&doc, "#attr-simple", "data-test").as_deref(),
        Some("updated")
    );
}

#[test]
fn null_removes_the_attribute_and_a_value_restores_it() {
    let doc = fixture(r#"<div id="remove-attr" data-test="initial"></div>"#);
    let engine = engine_on(&doc, json!({"value": "initial"}));
    engine
        .bind_field(BindTarget::attribute("#remove-attr", "data-test"), "value")
        .unwrap();

    let root = map_at(&engine, "");
    root.set("value", Value::Null);
    assert_eq!(attr_of(&doc, "#remove-attr", "data-test"), None);

    root.set("value", 2.0);
    assert_eq!(
        attr_of(&doc, "#remove-attr", "data-test").as_deref(),
        Some("2")
    );
}

#[test]
fn input_value_attribute() {
    let doc = fixture(r#"<input id="input-value" value="initial" />"#);
    let engine = engine_on(&doc, json!({"inputValue": "initial"}));
    engine
        .bind_field(BindTarget::attribute("#input-value", "value"), "inputValue")
        .unwrap();
    assert_eq!(
        attr_of(&doc, "#input-value", "value").as_deref(),
        Some("initial")
    );

    map_at(&engine, "").set("inputValue", "updated");
    assert_eq!(
        attr_of(&doc, "#input-value", "value").as_deref(),
        Some("updated")
    );
}

#[test]
fn class_attribute() {
    let doc = fixture(r#"<div id="class-change" class="initialClass"></div>"#);
    let engine = engine_on(&doc, json!({"className": "initialClass"}));
    engine
        .bind_field(BindTarget::attribute("#class-change", "class"), "className")
        .unwrap();

    map_at(&engine, "").set("className", "updatedClass");
    let el = doc.get_element_by_id("class-change").unwrap();
    assert_eq!(el.class_list(), vec!["updatedClass"]);
}

// ============================================================================
// Scopes and handles
// ============================================================================

#[test]
fn element_as_scope_root() {
    let doc = fixture(r#"<div id="custom-root"><div id="custom-root-value"></div></div>"#);
    let custom_root = doc.query_selector("#custom-root").unwrap().unwrap();
    let engine = Engine::with_config(
        json!({"value": "initial"}),
        EngineConfig::default().with_scope(custom_root.clone()),
    );

    engine.bind_field("#custom-root-value", "value").unwrap();
    map_at(&engine, "").set("value", "updated");

    let inner = custom_root
        .query_selector("#custom-root-value")
        .unwrap()
        .unwrap();
    assert_eq!(inner.text_content(), "updated");
}

#[test]
fn element_scope_ignores_matches_outside_it() {
    let doc = fixture(r#"<p class="v"></p><div id="root"><p class="v"></p></div>"#);
    let root = doc.get_element_by_id("root").unwrap();
    let engine = Engine::with_config(
        json!({"value": "x"}),
        EngineConfig::default().with_scope(root),
    );
    engine.bind_field(".v", "value").unwrap();

    let all = doc.query_selector_all(".v").unwrap();
    assert_eq!(all.get(0).unwrap().text_content(), "");
    assert_eq!(all.get(1).unwrap().text_content(), "x");
}

#[test]
fn shadow_root_as_scope() {
    let doc = fixture(r#"<div id="shadow-root"></div>"#);
    let shadow = doc
        .query_selector("#shadow-root")
        .unwrap()
        .unwrap()
        .attach_shadow();
    shadow.append_child(&doc.create_element("span")).unwrap();

    let engine = Engine::with_config(
        json!({"value": "initial"}),
        EngineConfig::default().with_scope(shadow.clone()),
    );
    engine.bind_field("span", "value").unwrap();
    map_at(&engine, "").set("value", "updated");

    assert_eq!(shadow.first_child().unwrap().text_content(), "updated");
    assert!(doc.query_selector("span").unwrap().is_none());
}

#[test]
fn single_element_handle() {
    let doc = fixture(r#"<div id="native-element"></div>"#);
    let engine = Engine::new(json!({"value": "initial"}));

    let el = doc.query_selector("#native-element").unwrap().unwrap();
    engine.bind_field(el, "value").unwrap();
    assert_eq!(text_of(&doc, "#native-element"), "initial");

    map_at(&engine, "").set("value", "updated");
    assert_eq!(text_of(&doc, "#native-element"), "updated");
}

#[test]
fn node_list_handles() {
    let doc = fixture(r#"<div class="native-element"></div><div class="native-element"></div>"#);
    let engine = Engine::new(json!({"value": "initial"}));

    engine
        .bind_field(doc.query_selector_all(".native-element").unwrap(), "value")
        .unwrap();
    for el in &doc.query_selector_all(".native-element").unwrap() {
        assert_eq!(el.text_content(), "initial");
    }

    map_at(&engine, "").set("value", "updated");
    for el in &doc.query_selector_all(".native-element").unwrap() {
        assert_eq!(el.text_content(), "updated");
    }
}

#[test]
fn binding_registered_before_its_markup_exists() {
    let doc = Document::new();
    let engine = engine_on(&doc, json!({"value": "early"}));
    engine.bind_field("#late", "value").unwrap();

    doc.body()
        .set_inner_html(r#"<span id="late"></span>"#)
        .unwrap();
    assert_eq!(text_of(&doc, "#late"), "");

    map_at(&engine, "").set("value", "now");
    assert_eq!(text_of(&doc, "#late"), "now");
}

#[test]
fn malformed_query_is_rejected_at_registration() {
    let doc = fixture("<p></p>");
    let engine = engine_on(&doc, json!({"value": 1}));
    let err = engine.bind_field("p[", "value").unwrap_err();
    assert!(err.to_string().contains("'p['"), "{err}");
    assert_eq!(engine.binding_count(), 0);
}

// ============================================================================
// Structural replacement
// ============================================================================

#[test]
fn replaced_substructure_stays_observed() {
    let doc = fixture(r#"<div id="out"></div>"#);
    let engine = engine_on(&doc, json!({"nested": {"list": [1]}}));
    engine
        .bind_map("#out", |data| {
            join(&data.pointer("/nested/list").unwrap_or_default(), ",")
        })
        .unwrap();

    map_at(&engine, "").set("nested", json!({"list": [7, 8]}));
    assert_eq!(text_of(&doc, "#out"), "7,8");

    list_at(&engine, "/nested/list").push(9);
    assert_eq!(text_of(&doc, "#out"), "7,8,9");
}

#[test]
fn replace_data_swaps_the_root() {
    let doc = fixture(r#"<div id="out"></div>"#);
    let engine = engine_on(&doc, json!({"value": "a"}));
    engine.bind_field("#out", "value").unwrap();
    let old_root = map_at(&engine, "");

    engine.replace_data(json!({"value": "b"}));
    assert_eq!(text_of(&doc, "#out"), "b");

    old_root.set("value", "stale");
    assert_eq!(text_of(&doc, "#out"), "b");
}

#[test]
fn numbers_render_canonically() {
    let doc = fixture(r#"<i id="a"></i><i id="b"></i>"#);
    let engine = engine_on(&doc, json!({"a": 3.0, "b": 2.5}));
    engine.bind_field("#a", "a").unwrap();
    engine.bind_field("#b", "b").unwrap();
    assert_eq!(text_of(&doc, "#a"), "3");
    assert_eq!(text_of(&doc, "#b"), "2.5");
}

#[test]
fn list_field_renders_comma_joined() {
    let doc = fixture(r#"<p id="t"></p><p id="a"></p>"#);
    let engine = engine_on(&doc, json!({"list": [1, 2, 3]}));
    engine.bind_field("#t", "list").unwrap();
    engine
        .register(BindTarget::attribute("#a", "data-x"), "list")
        .unwrap();
    assert_eq!(text_of(&doc, "#t"), "1,2,3");
    assert_eq!(attr_of(&doc, "#a", "data-x").as_deref(), Some("1,2,3"));

    list_at(&engine, "/list").push(json!([4, null, 5]));
    assert_eq!(text_of(&doc, "#t"), "1,2,3,4,,5");
    assert_eq!(attr_of(&doc, "#a", "data-x").as_deref(), Some("1,2,3,4,,5"));
}

#[test]
fn extreme_floats_render_in_exponent_form() {
    let doc = fixture(r#"<i id="big"></i><i id="small"></i>"#);
    let engine = engine_on(&doc, json!({"big": 1e21, "small": 1e-7}));
    engine.bind_field("#big", "big").unwrap();
    engine.bind_field("#small", "small").unwrap();
    assert_eq!(text_of(&doc, "#big"), "1e+21");
    assert_eq!(text_of(&doc, "#small"), "1e-7");
}

#[test]
fn subtree_borrowed_by_another_engine_leaves_both_views_live() {
    let doc = fixture(r#"<p id="a"></p><p id="b"></p>"#);
    let a = engine_on(&doc, json!({"inner": {"list": [1]}}));
    let b = engine_on(&doc, json!({}));
    a.bind_map("#a", |data| join(&data.pointer("/inner/list").unwrap_or_default(), ","))
        .unwrap();
    b.bind_map("#b", |data| join(&data.pointer("/borrowed/list").unwrap_or_default(), ","))
        .unwrap();

    map_at(&b, "").set("borrowed", map_at(&a, "/inner"));
    assert_eq!(text_of(&doc, "#b"), "1");

    list_at(&a, "/inner/list").push(2);
    assert_eq!(text_of(&doc, "#a"), "1,2");
    assert_eq!(a.version(), 1);

    list_at(&b, "/borrowed/list").push(3);
    assert_eq!(text_of(&doc, "#b"), "1,3");
    assert_eq!(text_of(&doc, "#a"), "1,2");
}
