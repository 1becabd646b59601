//! Property tests: whatever fits under the template's multiplicities survives
//! a write followed by a read.

mod common;

use common::model_from;
use metaform_codec::{Codec, Template};
use metaform_model::{Property, Scalar, Value};
use proptest::prelude::*;

const SCHEMA: &str = r#"
    [types.Document.properties]
    title = "text"
    pages = "integer"
    keywords = { type = "text", collection = true }
"#;

const TEMPLATE: &str = r#"{
    "content":[{
        "path":"title",
        "value":null
    },{
        "path":"pages",
        "value":null
    },{
        "path":"keywords",
        "multiplicity":8,
        "value":null
    }
    ]
}"#;

fn keyword() -> impl Strategy<Value = String> {
    // Printable text including the characters the writer has to escape
    proptest::string::string_regex("[a-zA-Z0-9 \"\\\\{}\\[\\],.\n\t-]{1,16}").unwrap()
}

fn texts(property: Property<metaform_dynamic::Record>) -> Vec<String> {
    property
        .into_values()
        .into_iter()
        .filter_map(|value| match value {
            Value::Scalar(Scalar::Text(text)) => Some(text),
            _ => None,
        })
        .collect()
}

proptest! {
    #[test]
    fn prop_keywords_survive_round_trip(
        title in keyword(),
        pages in any::<i64>(),
        keywords in prop::collection::vec(keyword(), 0..8),
    ) {
        let model = model_from(SCHEMA);
        let template: Template = TEMPLATE.parse().unwrap();
        let codec = Codec::new(&template, &model);

        let doc = model.create("Document").unwrap();
        doc.set_scalar("title", Scalar::text(title.clone()));
        doc.set_scalar("pages", Scalar::Integer(pages));
        doc.set_scalars("keywords", keywords.iter().cloned().map(Scalar::text));
        let form = codec.write_to_string(&doc, true).unwrap();

        let restored = model.create("Document").unwrap();
        codec.read(form.lines(), &restored, false).unwrap();
        prop_assert_eq!(restored.scalar("title"), Some(Scalar::text(title)));
        prop_assert_eq!(restored.scalar("pages"), Some(Scalar::Integer(pages)));
        prop_assert_eq!(texts(restored.get("keywords")), keywords);
    }

    #[test]
    fn prop_excess_keywords_are_capped(
        keywords in prop::collection::vec(keyword(), 9..20),
    ) {
        let model = model_from(SCHEMA);
        let template: Template = TEMPLATE.parse().unwrap();
        let codec = Codec::new(&template, &model);

        let doc = model.create("Document").unwrap();
        doc.set_scalars("keywords", keywords.iter().cloned().map(Scalar::text));
        let form = codec.write_to_string(&doc, true).unwrap();

        let restored = model.create("Document").unwrap();
        codec.read(form.lines(), &restored, true).unwrap();
        prop_assert_eq!(texts(restored.get("keywords")), keywords[..8].to_vec());
    }
}
