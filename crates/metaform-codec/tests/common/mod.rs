//! Shared fixtures for the codec integration tests.

#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use metaform_codec::{Codec, CodecResult, Template};
use metaform_dynamic::{DynamicModel, Record, Schema};
use metaform_model::{Scalar, Specializations};

pub const SCHEMA: &str = include_str!("../fixtures/schema.toml");
pub const METADATA_TEMPLATE: &str = include_str!("../fixtures/metadata.tpl");

pub fn model() -> DynamicModel {
    let schema: Schema = SCHEMA.parse().expect("fixture schema is valid");
    DynamicModel::new(schema)
}

pub fn model_from(schema: &str) -> DynamicModel {
    DynamicModel::new(schema.parse().expect("test schema is valid"))
}

pub fn template() -> Template {
    METADATA_TEMPLATE.parse().expect("fixture template is valid")
}

pub fn specializations() -> Specializations {
    Specializations::new()
        .with("Party", "Individual")
        .with("Identification", "DataIdentification")
}

pub fn individual(model: &DynamicModel, name: &str) -> Record {
    let party = model.create("Individual").expect("concrete type");
    party.set_scalar("name", Scalar::text(name));
    party
}

pub fn responsibility(model: &DynamicModel, role: &str, parties: Vec<Record>) -> Record {
    let responsibility = model.create("Responsibility").expect("concrete type");
    responsibility.set_scalar("role", Scalar::code("CI_RoleCode", role));
    responsibility.set_many("party", parties);
    responsibility
}

/// Metadata record with a value at every path of the fixture template
pub fn sample(model: &DynamicModel) -> Record {
    let citation = model.create("Citation").expect("concrete type");
    citation.set_scalar("title", Scalar::text("Ocean Survey"));
    citation.set_scalar("date", Scalar::Date(Utc.with_ymd_and_hms(2023, 11, 2, 0, 0, 0).unwrap()));

    let identification = model.create("DataIdentification").expect("concrete type");
    identification.set_object("citation", citation);
    identification.set_scalar("abstract", Scalar::text("Salinity \"profiles\"\nof the north basin"));
    identification.set_scalars(
        "keywords",
        ["sea", "survey", "salinity"].map(Scalar::text),
    );
    identification.set_scalar("scale", Scalar::Integer(50_000));
    identification.set_scalar("westBound", Scalar::Angle(-12.5));

    let metadata = model.create("Metadata").expect("concrete type");
    metadata.set_scalar("identifier", Scalar::text("urn:ocean:42"));
    metadata.set_scalar("language", Scalar::Locale("fra".into()));
    metadata.set_scalar("dateStamp", Scalar::Date(Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap()));
    metadata.set_many(
        "contact",
        vec![
            responsibility(model, "author", vec![individual(model, "Ada"), individual(model, "Grace")]),
            responsibility(model, "publisher", vec![individual(model, "Hydrographic Office")]),
        ],
    );
    metadata.set_many("identificationInfo", vec![identification]);
    metadata
}

pub fn write(template: &Template, model: &DynamicModel, object: &Record, prune: bool) -> String {
    Codec::new(template, model)
        .write_to_string(object, prune)
        .expect("write succeeds")
}

pub fn read(template: &Template, model: &DynamicModel, form: &str, destination: &Record, skip_nulls: bool) -> CodecResult<()> {
    Codec::new(template, model)
        .with_specializations(specializations())
        .read(form.lines(), destination, skip_nulls)
}

/// Lines of `form` that set a value, with their path
pub fn values(form: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    let mut path = String::new();
    for line in form.lines().map(str::trim) {
        if let Some(rest) = line.strip_prefix("\"path\":") {
            path = rest.trim_end_matches(',').trim_matches('"').to_string();
        } else if let Some(rest) = line.strip_prefix("\"value\":") {
            out.push((path.clone(), rest.to_string()));
        }
    }
    out
}
