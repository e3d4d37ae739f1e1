//! Vendor-coding normalization: replaces HealthKit-specific code systems
//! with their LOINC/MDC/SNOMED-CT equivalents via compile-time maps.

pub const VENDOR_SYSTEM: &str = "http://developer.apple.com/documentation/healthkit";

pub const LOINC: &str = "http://loinc.org";
pub const MDC: &str = "urn:iso:std:iso11073:10101";
pub const SNOMED_CT: &str = "http://snomed.info/sct";

pub struct StandardCoding {
    pub system: &'static str,
    pub code: &'static str,
    pub display: &'static str,
}

/// Vendor code → standard-system coding. Codes outside this map are
/// preserved verbatim, per spec.
pub fn standard_coding_for(vendor_code: &str) -> Option<StandardCoding> {
    match vendor_code {
        "HKElectrocardiogram" => Some(StandardCoding { system: LOINC, code: "11524-6", display: "EKG study" }),
        "HKElectrocardiogramClassification" => {
            Some(StandardCoding { system: LOINC, code: "8601-7", display: "EKG impression" })
        }
        "HKElectrocardiogramVoltageMeasurementsCount" => {
            Some(StandardCoding { system: MDC, code: "131328", display: "ECG voltage measurement count" })
        }
        "HKElectrocardiogramSamplingFrequency" => {
            Some(StandardCoding { system: MDC, code: "131329", display: "ECG sampling frequency" })
        }
        "HKElectrocardiogramSymptomFinding" => {
            Some(StandardCoding { system: SNOMED_CT, code: "404684003", display: "Clinical finding" })
        }
        _ => None,
    }
}

/// Vendor classification raw string → human-readable label.
pub fn classification_label_for(raw: &str) -> Option<&'static str> {
    match raw {
        "sinusRhythm" => Some("Sinus Rhythm"),
        "atrialFibrillation" => Some("Atrial Fibrillation"),
        "inconclusiveLowHeartRate" => Some("Inconclusive: Low Heart Rate"),
        "inconclusiveHighHeartRate" => Some("Inconclusive: High Heart Rate"),
        "inconclusivePoorReading" => Some("Inconclusive: Poor Reading"),
        "inconclusiveOther" => Some("Inconclusive: Other"),
        "unrecognized" => Some("Unrecognized"),
        "notSet" => Some("Not Set"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vendor_code_resolves_to_loinc() {
        let coding = standard_coding_for("HKElectrocardiogram").unwrap();
        assert_eq!(coding.system, LOINC);
        assert_eq!(coding.code, "11524-6");
    }

    #[test]
    fn unknown_vendor_code_is_none() {
        assert!(standard_coding_for("HKSomethingElse").is_none());
    }

    #[test]
    fn classification_label_round_trip_for_known_values() {
        assert_eq!(classification_label_for("sinusRhythm"), Some("Sinus Rhythm"));
        assert_eq!(classification_label_for("atrialFibrillation"), Some("Atrial Fibrillation"));
    }

    #[test]
    fn unknown_classification_is_none() {
        assert!(classification_label_for("madeUpValue").is_none());
    }
}
