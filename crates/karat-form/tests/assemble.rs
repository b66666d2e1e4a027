use std::collections::BTreeMap;

use karat_form::{
    AssembleError, FieldDefinition, FieldValue, FormSchema, FormStep, LocalIds, RepeatingItem,
    SemanticRole, ValueType, assemble_flat, assemble_items, reconstruct_items, resolved_role,
};
use serde_json::json;
use time::macros::date;

fn field(id: u64, label: &str, kind: ValueType) -> FieldDefinition {
    FieldDefinition {
        id,
        label: label.into(),
        value_type: kind,
        max_length: 0,
        required: false,
        options: vec![],
        semantic_role: SemanticRole::None,
    }
}

fn follow_up_schema() -> FormSchema {
    FormSchema::new(vec![FormStep {
        step_number: 1,
        step_name: "Follow Up".into(),
        default_step: true,
        repeating: false,
        fields: vec![
            field(1, "Judul", ValueType::Text),
            field(2, "Tanggal", ValueType::Date),
            field(3, "Catatan", ValueType::Text),
        ],
    }])
}

fn follow_up_values() -> BTreeMap<u64, FieldValue> {
    BTreeMap::from([
        (1, FieldValue::Text("Follow up A".into())),
        (2, FieldValue::Date(Some(date!(2024 - 05 - 01)))),
        (3, FieldValue::Text("called customer".into())),
    ])
}

#[test]
fn root_attributes_are_hoisted_from_well_known_labels() {
    let payload = assemble_flat(&follow_up_schema(), &follow_up_values()).unwrap();
    assert_eq!(payload.name, "Follow up A");
    assert_eq!(payload.date, "2024-05-01");
    assert_eq!(payload.description.as_deref(), Some("called customer"));

    assert_eq!(payload.detail.len(), 3);
    assert_eq!(payload.detail[0].label, "Judul");
    assert_eq!(payload.detail[0].value[0].value, "Follow up A");
    assert_eq!(payload.detail[1].value[0].value, "2024-05-01");
    assert_eq!(payload.detail[2].value[0].value, "called customer");
}

#[test]
fn missing_title_blocks_assembly() {
    let mut values = follow_up_values();
    values.insert(1, FieldValue::Text("  ".into()));
    let error = assemble_flat(&follow_up_schema(), &values).unwrap_err();
    assert!(matches!(error, AssembleError::MissingTitle));
    assert_eq!(error.to_string(), "Judul diperlukan");
}

#[test]
fn missing_date_blocks_assembly() {
    let mut values = follow_up_values();
    values.insert(2, FieldValue::Date(None));
    let error = assemble_flat(&follow_up_schema(), &values).unwrap_err();
    assert!(matches!(error, AssembleError::MissingDate));
}

#[test]
fn birth_dates_never_become_the_record_date() {
    let birth = field(9, "Tanggal Lahir", ValueType::Date);
    assert_eq!(resolved_role(&birth), SemanticRole::None);

    let record_date = field(10, "Tanggal", ValueType::Date);
    assert_eq!(resolved_role(&record_date), SemanticRole::Date);
}

#[test]
fn explicit_semantic_role_beats_label_keywords() {
    let mut tagged = field(11, "Ringkasan Kunjungan", ValueType::Text);
    tagged.semantic_role = SemanticRole::Title;
    assert_eq!(resolved_role(&tagged), SemanticRole::Title);
}

#[test]
fn detail_entries_serialize_with_wire_field_names() {
    let payload = assemble_flat(&follow_up_schema(), &follow_up_values()).unwrap();
    let wire = serde_json::to_value(&payload).unwrap();
    assert_eq!(wire["detail"][0]["stepName"], "Follow Up");
    assert_eq!(wire["detail"][0]["fieldId"], 1);
    assert_eq!(wire["detail"][0]["step"], 1);
    assert_eq!(wire["detail"][0]["value"][0]["optionValueId"], 0);
    assert_eq!(wire["name"], "Follow up A");
}

#[test]
fn item_submission_carries_backrefs_only_when_editing() {
    let step = FormStep {
        step_number: 2,
        step_name: "Items".into(),
        default_step: false,
        repeating: true,
        fields: vec![
            field(1, "Jenis Barang", ValueType::Text),
            field(2, "Berat", ValueType::Number),
        ],
    };
    let recorded = vec![
        vec!["cincin".to_string(), "gelang".to_string()],
        vec!["5".to_string(), "12".to_string()],
    ];
    let mut ids = LocalIds::default();
    let edited = reconstruct_items(&step, &recorded, Some(&[100, 101]), &mut ids).unwrap();
    let submission = assemble_items(&step, &edited).unwrap();
    let wire = serde_json::to_value(&submission).unwrap();
    assert_eq!(wire["items"][0]["order_item_id"], 100);
    assert_eq!(wire["items"][1]["order_item_id"], 101);
    assert_eq!(wire["items"][1]["detail"][1]["value"], json!([{ "optionValueId": 0, "value": "12" }]));

    let appended = reconstruct_items(&step, &recorded, None, &mut ids).unwrap();
    let submission = assemble_items(&step, &appended).unwrap();
    let wire = serde_json::to_value(&submission).unwrap();
    assert!(wire["items"][0].get("order_item_id").is_none());
}

#[test]
fn item_value_count_mismatch_is_refused() {
    let step = FormStep {
        step_number: 2,
        step_name: "Items".into(),
        default_step: false,
        repeating: true,
        fields: vec![
            field(1, "Jenis Barang", ValueType::Text),
            field(2, "Berat", ValueType::Number),
        ],
    };
    // A row built for a step with fewer fields must not silently drop fields.
    let items = vec![RepeatingItem {
        local_id: 1,
        backref_id: None,
        values: vec![FieldValue::Text("cincin".into())],
    }];
    let error = assemble_items(&step, &items).unwrap_err();
    assert!(matches!(
        error,
        AssembleError::ItemShape {
            local_id: 1,
            expected: 2,
            got: 1,
        }
    ));
}
