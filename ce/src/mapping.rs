//! FHIR Observation → GDT field mapping (§4.3).

use serde_json::Value;

use crate::model::Demographics;

/// If the observation carries no `subject` reference, synthesize one from
/// the caller-supplied patient identifier and demographics.
pub fn ensure_subject(observation: &mut Value, patient_id: &str, demographics: Option<&Demographics>) {
    if observation.get("subject").is_some() {
        return;
    }
    let display = demographics
        .map(|d| {
            format!(
                "{}, {}",
                d.family_name.clone().unwrap_or_default(),
                d.given_name.clone().unwrap_or_default()
            )
        })
        .unwrap_or_default();
    observation["subject"] = serde_json::json!({
        "reference": format!("Patient/{patient_id}"),
        "display": display,
    });
}

/// Map one FHIR Observation into its GDT content fields (everything after
/// the fixed header block), plus any non-fatal warnings.
pub fn map_observation(observation: &Value) -> (Vec<(&'static str, String)>, Vec<String>) {
    let mut fields: Vec<(&'static str, String)> = Vec::new();
    let mut warnings = Vec::new();

    map_subject(observation, &mut fields, &mut warnings);
    map_effective_time(observation, &mut fields, &mut warnings);
    map_code(observation, &mut fields);
    map_value(observation, &mut fields);
    map_reference_range(observation, &mut fields);
    map_status(observation, &mut fields);
    map_interpretation(observation, &mut fields);
    map_components(observation, &mut fields);

    (fields, warnings)
}

fn map_subject(observation: &Value, fields: &mut Vec<(&'static str, String)>, warnings: &mut Vec<String>) {
    if let Some(reference) = observation.pointer("/subject/reference").and_then(Value::as_str) {
        if let Some(tail) = reference.rsplit('/').next() {
            fields.push(("3000", tail.to_string()));
        }
    }
    if let Some(display) = observation.pointer("/subject/display").and_then(Value::as_str) {
        match display.split_once(", ") {
            Some((family, given)) => {
                fields.push(("3101", family.trim().to_string()));
                fields.push(("3102", given.trim().to_string()));
            }
            None if !display.is_empty() => {
                warnings.push("subject.display is not in 'family, given' form".to_string());
            }
            None => {}
        }
    }
}

fn map_effective_time(observation: &Value, fields: &mut Vec<(&'static str, String)>, warnings: &mut Vec<String>) {
    let raw = observation
        .get("effectiveDateTime")
        .and_then(Value::as_str)
        .or_else(|| observation.pointer("/effectivePeriod/start").and_then(Value::as_str))
        .or_else(|| observation.get("effectiveInstant").and_then(Value::as_str));

    let Some(raw) = raw else {
        warnings.push("no effective date/time found".to_string());
        return;
    };
    match chrono::DateTime::parse_from_rfc3339(raw) {
        Ok(parsed) => {
            fields.push(("6200", parsed.format("%d%m%Y").to_string()));
            fields.push(("6201", parsed.format("%H%M%S").to_string()));
        }
        Err(_) => warnings.push(format!("unparseable effective date/time: {raw}")),
    }
}

fn map_code(observation: &Value, fields: &mut Vec<(&'static str, String)>) {
    let first_coding = observation.pointer("/code/coding/0");
    if let Some(code) = first_coding.and_then(|c| c.get("code")).and_then(Value::as_str) {
        fields.push(("8402", code.to_string()));
    }
    match first_coding.and_then(|c| c.get("display")).and_then(Value::as_str) {
        Some(display) => {
            fields.push(("8410", truncate_chars(display, 20)));
            fields.push(("8411", display.to_string()));
        }
        None => {
            if let Some(text) = observation.pointer("/code/text").and_then(Value::as_str) {
                fields.push(("8411", text.to_string()));
            }
        }
    }
}

fn map_value(observation: &Value, fields: &mut Vec<(&'static str, String)>) {
    if let Some(quantity) = observation.get("valueQuantity") {
        if let Some(value) = quantity.get("value").and_then(Value::as_f64) {
            fields.push(("8420", format!("{value:.2}")));
        }
        let unit = quantity
            .get("unit")
            .and_then(Value::as_str)
            .or_else(|| quantity.get("code").and_then(Value::as_str));
        if let Some(unit) = unit {
            fields.push(("8421", unit.to_string()));
        }
        return;
    }
    if let Some(rendered) = render_generic_value(observation) {
        fields.push(("8460", rendered));
    }
}

fn render_generic_value(observation: &Value) -> Option<String> {
    if let Some(s) = observation.get("valueString").and_then(Value::as_str) {
        return Some(s.to_string());
    }
    if let Some(text) = observation.pointer("/valueCodeableConcept/text").and_then(Value::as_str) {
        return Some(text.to_string());
    }
    if let Some(b) = observation.get("valueBoolean").and_then(Value::as_bool) {
        return Some(if b { "Positiv".to_string() } else { "Negativ".to_string() });
    }
    if let Some(i) = observation.get("valueInteger").and_then(Value::as_i64) {
        return Some(i.to_string());
    }
    if let Some(range) = observation.get("valueRange") {
        let low = range.pointer("/low/value").and_then(Value::as_f64);
        let high = range.pointer("/high/value").and_then(Value::as_f64);
        if let (Some(low), Some(high)) = (low, high) {
            return Some(format!("{low:.2} - {high:.2}"));
        }
    }
    if let Some(ratio) = observation.get("valueRatio") {
        let numerator = ratio.pointer("/numerator/value").and_then(Value::as_f64);
        let denominator = ratio.pointer("/denominator/value").and_then(Value::as_f64);
        if let (Some(n), Some(d)) = (numerator, denominator) {
            return Some(format!("{n:.2}/{d:.2}"));
        }
    }
    if let Some(period) = observation.get("valuePeriod") {
        let start = period.get("start").and_then(Value::as_str);
        let end = period.get("end").and_then(Value::as_str);
        if let (Some(start), Some(end)) = (start, end) {
            return Some(format!("{start} - {end}"));
        }
    }
    None
}

fn map_reference_range(observation: &Value, fields: &mut Vec<(&'static str, String)>) {
    let Some(range) = observation.pointer("/referenceRange/0") else { return };
    let low = range.pointer("/low/value").and_then(Value::as_f64);
    let high = range.pointer("/high/value").and_then(Value::as_f64);
    if let Some(low) = low {
        fields.push(("8431", format!("{low:.2}")));
    }
    if let Some(high) = high {
        fields.push(("8432", format!("{high:.2}")));
    }
    if let (Some(low), Some(high)) = (low, high) {
        fields.push(("8430", format!("{low:.2} - {high:.2}")));
    }
}

fn map_status(observation: &Value, fields: &mut Vec<(&'static str, String)>) {
    if let Some(status) = observation.get("status").and_then(Value::as_str) {
        fields.push(("8418", status.to_string()));
    }
}

fn map_interpretation(observation: &Value, fields: &mut Vec<(&'static str, String)>) {
    let Some(interpretation) = observation.pointer("/interpretation/0") else { return };
    if let Some(text) = interpretation.get("text").and_then(Value::as_str) {
        fields.push(("8480", text.to_string()));
        return;
    }
    if let Some(code) = interpretation.pointer("/coding/0/code").and_then(Value::as_str) {
        fields.push(("8480", german_interpretation_label(code).to_string()));
    }
}

fn german_interpretation_label(code: &str) -> &'static str {
    match code {
        "N" => "Normal",
        "H" => "Hoch",
        "L" => "Niedrig",
        "HH" => "Kritisch hoch",
        "LL" => "Kritisch niedrig",
        "A" => "Auffällig",
        "AA" => "Stark auffällig",
        _ => "Unbekannt",
    }
}

fn map_components(observation: &Value, fields: &mut Vec<(&'static str, String)>) {
    let Some(components) = observation.get("component").and_then(Value::as_array) else { return };
    for component in components {
        let code = component.pointer("/code/coding/0/code").and_then(Value::as_str).unwrap_or("");
        let display = component
            .pointer("/code/coding/0/display")
            .and_then(Value::as_str)
            .or_else(|| component.pointer("/code/text").and_then(Value::as_str))
            .unwrap_or("Component");

        if code == "8867-4" || code == "76282-3" {
            if let Some(value) = component.pointer("/valueQuantity/value").and_then(Value::as_f64) {
                fields.push(("8501", format!("{value:.0}")));
            }
            continue;
        }

        if code == "8601-7" || display.to_ascii_lowercase().contains("classification") {
            if let Some(text) = component.get("valueString").and_then(Value::as_str) {
                fields.push(("8520", text.to_string()));
            }
            continue;
        }

        if let Some(value) = component.pointer("/valueQuantity/value").and_then(Value::as_f64) {
            let unit = component.pointer("/valueQuantity/unit").and_then(Value::as_str).unwrap_or("");
            fields.push(("6228", format!("{display}: {value} {unit}").trim_end().to_string()));
        }
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
