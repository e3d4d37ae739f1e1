use pghd_ce::config::Config;
use pghd_ce::server;
use rocket::http::{ContentType, Status};
use rocket::local::blocking::Client;
use serde_json::json;

fn test_config(dir: &std::path::Path) -> Config {
    let storage_dir = dir.join("storage");
    let output_path = dir.join("exchange");
    std::fs::create_dir_all(&storage_dir).unwrap();
    std::fs::create_dir_all(&output_path).unwrap();
    Config {
        port: 8082,
        storage_dir,
        output_path,
        sender_id: "pghd-ce".to_string(),
        receiver_id: "pms".to_string(),
        tls_cert_path: None,
        tls_key_path: None,
    }
}

#[test]
fn processing_an_ecg_observation_emits_a_gdt_file_matching_the_known_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let output_path = config.output_path.clone();
    let client = Client::tracked(server::build_rocket(config).unwrap()).unwrap();

    let body = json!({
        "patientId": "1",
        "patientFirstName": "Max",
        "patientLastName": "Mustermann",
        "observations": [{
            "resourceType": "Observation",
            "status": "final",
            "effectiveDateTime": "2023-01-14T22:51:12+01:00",
            "code": { "coding": [{ "system": "http://loinc.org", "code": "11524-6", "display": "EKG study" }] },
            "component": [{
                "code": { "coding": [{ "code": "8867-4", "display": "Heart rate" }] },
                "valueQuantity": { "value": 68.0, "unit": "/min" }
            }]
        }]
    });

    let response = client
        .post("/api/v1/process")
        .header(ContentType::JSON)
        .body(body.to_string())
        .dispatch();

    assert_eq!(response.status(), Status::Ok);
    let result: serde_json::Value = response.into_json().unwrap();
    assert_eq!(result["status"], "success");
    assert_eq!(result["successful"], 1);
    assert_eq!(result["failed"], 0);

    let file_name = result["results"][0]["gdtFileName"].as_str().unwrap();
    let written = std::fs::read(output_path.join(file_name)).unwrap();
    let text = String::from_utf8(written).unwrap();

    let mut lines = text.split_terminator("\r\n");
    assert_eq!(lines.next().unwrap(), "01380006310");
    assert!(text.contains("14012023"));
    assert!(text.contains("225112"));
    assert!(text.contains("02.10"));
    assert!(text.contains("Mustermann"));
    assert!(text.contains("68"));
}

#[test]
fn status_before_any_transfer_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let client = Client::tracked(server::build_rocket(config).unwrap()).unwrap();

    let response = client.get("/api/v1/status/unknown-patient").dispatch();
    assert_eq!(response.status(), Status::NotFound);
}

#[test]
fn status_after_a_successful_transfer_reflects_it() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let client = Client::tracked(server::build_rocket(config).unwrap()).unwrap();

    let body = json!({
        "patientId": "7",
        "observations": [{
            "resourceType": "Observation",
            "status": "final",
            "valueBoolean": true
        }]
    });
    let response = client.post("/api/v1/process").header(ContentType::JSON).body(body.to_string()).dispatch();
    assert_eq!(response.status(), Status::Ok);

    let status_response = client.get("/api/v1/status/7").dispatch();
    assert_eq!(status_response.status(), Status::Ok);
    let status: serde_json::Value = status_response.into_json().unwrap();
    assert_eq!(status["hasSuccessfulTransfer"], true);
    assert_eq!(status["pendingCount"], 0);
}

#[test]
fn empty_observation_list_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let client = Client::tracked(server::build_rocket(config).unwrap()).unwrap();

    let body = json!({ "patientId": "1", "observations": [] });
    let response = client.post("/api/v1/process").header(ContentType::JSON).body(body.to_string()).dispatch();
    assert_eq!(response.status(), Status::BadRequest);
}
