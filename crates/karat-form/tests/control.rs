use karat_form::{
    Control, FieldDefinition, FieldOption, FieldValue, MonthCursor, OptionChoice, SemanticRole,
    ValueType, number_display, render_control,
};
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

const TODAY: time::Date = date!(2024 - 06 - 15);

#[test]
fn text_cap_is_advisory_and_zero_means_unlimited() {
    let mut name = field(1, "Nama", ValueType::Text);
    name.max_length = 40;
    assert_eq!(
        render_control(&name, &FieldValue::Text(String::new()), TODAY),
        Control::TextInput {
            max_length: Some(40)
        }
    );

    let note = field(2, "Catatan", ValueType::Text);
    assert_eq!(
        render_control(&note, &FieldValue::Text(String::new()), TODAY),
        Control::TextInput { max_length: None }
    );
}

#[test]
fn phone_labels_skip_thousands_grouping() {
    let phone = field(3, "No Telepon", ValueType::Number);
    assert_eq!(
        render_control(&phone, &FieldValue::Number(None), TODAY),
        Control::NumberInput { grouped: false }
    );

    let weight = field(4, "Berat", ValueType::Number);
    assert_eq!(
        render_control(&weight, &FieldValue::Number(None), TODAY),
        Control::NumberInput { grouped: true }
    );
}

#[test]
fn number_display_filters_then_regroups_per_keystroke() {
    assert_eq!(number_display("12a3,,4", true), "1.234");
    assert_eq!(number_display("1.2345", true), "12.345");
    assert_eq!(number_display("0812x345", false), "0812345");
    assert_eq!(number_display("abc", true), "");
}

#[test]
fn select_multiplicity_follows_the_current_value_shape() {
    let mut interests = field(5, "Minat", ValueType::Option);
    interests.options = vec![FieldOption {
        option_id: 1,
        text: "emas".into(),
    }];

    let multi = render_control(&interests, &FieldValue::Multi(vec![]), TODAY);
    assert!(matches!(multi, Control::Select { multiple: true, .. }));

    // An empty initial value renders single-select.
    let empty = render_control(&interests, &FieldValue::Single(None), TODAY);
    match empty {
        Control::Select {
            multiple,
            options,
            allow_create,
        } => {
            assert!(!multiple);
            assert!(allow_create);
            assert_eq!(options.len(), 1);
        }
        other => panic!("expected select, got {other:?}"),
    }

    let single = render_control(
        &interests,
        &FieldValue::Single(Some(OptionChoice::freeform("emas"))),
        TODAY,
    );
    assert!(matches!(single, Control::Select { multiple: false, .. }));
}

#[test]
fn date_picker_cursor_seeds_from_value_else_today() {
    let born = field(6, "Tanggal Lahir", ValueType::Date);
    let seeded = render_control(&born, &FieldValue::Date(Some(date!(1990 - 01 - 20))), TODAY);
    assert_eq!(
        seeded,
        Control::DatePicker {
            month_cursor: MonthCursor {
                year: 1990,
                month: 1
            }
        }
    );

    let blank = render_control(&born, &FieldValue::Date(None), TODAY);
    assert_eq!(
        blank,
        Control::DatePicker {
            month_cursor: MonthCursor {
                year: 2024,
                month: 6
            }
        }
    );
}
