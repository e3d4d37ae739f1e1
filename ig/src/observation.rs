//! Structural decode and in-place normalization of FHIR R4 Observation
//! resources. Deliberately loose typing (`serde_json::Value`): IG's contract
//! is "replace vendor codings, pass everything else through byte-identical",
//! not full resource validation (explicitly out of scope, §1).

use serde_json::Value;

use crate::normalization::{classification_label_for, standard_coding_for, VENDOR_SYSTEM};

/// Normalize one FHIR Observation in place: walks `code.coding`,
/// `category[].coding`, and `component[].code.coding`, replacing any
/// coding whose `system` is the vendor system with its standard-system
/// equivalent when one is mapped. Empty coding arrays become absent.
pub fn normalize_observation(observation: &mut Value) {
    if let Some(obj) = observation.as_object_mut() {
        normalize_codeable_concept(obj.get_mut("code"));
        normalize_category_array(obj.get_mut("category"));
        normalize_components(obj.get_mut("component"));
    }
}

fn normalize_category_array(category: Option<&mut Value>) {
    let Some(Value::Array(entries)) = category else { return };
    for entry in entries.iter_mut() {
        normalize_codeable_concept(Some(entry));
    }
}

fn normalize_components(components: Option<&mut Value>) {
    let Some(Value::Array(entries)) = components else { return };
    for entry in entries.iter_mut() {
        let Some(obj) = entry.as_object_mut() else { continue };
        let matched_classification = normalize_codeable_concept_and_report(obj.get_mut("code"));
        if matched_classification {
            if let Some(Value::String(raw)) = obj.get("valueString").cloned() {
                if let Some(label) = classification_label_for(&raw) {
                    obj.insert("valueString".into(), Value::String(label.to_string()));
                }
            }
        }
    }
}

fn normalize_codeable_concept(codeable_concept: Option<&mut Value>) {
    normalize_codeable_concept_and_report(codeable_concept);
}

/// Returns whether the concept's vendor code was the ECG classification
/// concept, so the caller can also translate a sibling `valueString`.
fn normalize_codeable_concept_and_report(codeable_concept: Option<&mut Value>) -> bool {
    let Some(obj) = codeable_concept.and_then(|v| v.as_object_mut()) else { return false };
    let Some(Value::Array(codings)) = obj.get_mut("coding") else { return false };

    let mut matched_classification = false;
    for coding in codings.iter_mut() {
        let Some(coding_obj) = coding.as_object_mut() else { continue };
        let is_vendor = coding_obj.get("system").and_then(Value::as_str) == Some(VENDOR_SYSTEM);
        if !is_vendor {
            continue;
        }
        let Some(vendor_code) = coding_obj.get("code").and_then(Value::as_str).map(str::to_string) else {
            continue;
        };
        if vendor_code == "HKElectrocardiogramClassification" {
            matched_classification = true;
        }
        if let Some(standard) = standard_coding_for(&vendor_code) {
            coding_obj.insert("system".into(), Value::String(standard.system.to_string()));
            coding_obj.insert("code".into(), Value::String(standard.code.to_string()));
            coding_obj.insert("display".into(), Value::String(standard.display.to_string()));
        }
    }

    if codings.is_empty() {
        obj.remove("coding");
    }
    matched_classification
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn replaces_vendor_ecg_study_coding() {
        let mut observation = json!({
            "resourceType": "Observation",
            "code": { "coding": [{ "system": VENDOR_SYSTEM, "code": "HKElectrocardiogram" }] }
        });
        normalize_observation(&mut observation);
        let coding = &observation["code"]["coding"][0];
        assert_eq!(coding["system"], "http://loinc.org");
        assert_eq!(coding["code"], "11524-6");
    }

    #[test]
    fn unmapped_vendor_code_is_preserved_verbatim() {
        let mut observation = json!({
            "code": { "coding": [{ "system": VENDOR_SYSTEM, "code": "HKUnmappedThing" }] }
        });
        let before = observation.clone();
        normalize_observation(&mut observation);
        assert_eq!(observation, before);
    }

    #[test]
    fn non_vendor_coding_passes_through_unchanged() {
        let mut observation = json!({
            "code": { "coding": [{ "system": "http://loinc.org", "code": "1234-5" }] }
        });
        let before = observation.clone();
        normalize_observation(&mut observation);
        assert_eq!(observation, before);
    }

    #[test]
    fn empty_coding_array_becomes_absent() {
        let mut observation = json!({ "code": { "coding": [] } });
        normalize_observation(&mut observation);
        assert!(observation["code"].get("coding").is_none());
    }

    #[test]
    fn classification_component_value_string_is_translated() {
        let mut observation = json!({
            "component": [{
                "code": { "coding": [{ "system": VENDOR_SYSTEM, "code": "HKElectrocardiogramClassification" }] },
                "valueString": "sinusRhythm"
            }]
        });
        normalize_observation(&mut observation);
        assert_eq!(observation["component"][0]["valueString"], "Sinus Rhythm");
        assert_eq!(observation["component"][0]["code"]["coding"][0]["system"], "http://loinc.org");
    }

    #[test]
    fn category_codings_undergo_the_same_pass() {
        let mut observation = json!({
            "category": [{ "coding": [{ "system": VENDOR_SYSTEM, "code": "HKElectrocardiogram" }] }]
        });
        normalize_observation(&mut observation);
        assert_eq!(observation["category"][0]["coding"][0]["code"], "11524-6");
    }
}
