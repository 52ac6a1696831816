fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use chunkup_protocol::{
        AbortRequest, CompleteRequest, CompletedPart, InitiateRequest, InitiateResponse,
        PartResponse, SessionRef, UploadStatus,
    };

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    /// Loads a fixture JSON file and returns it as a `serde_json::Value`.
    fn load_fixture(name: &str) -> serde_json::Value {
        let path = fixtures_dir().join(name);
        let data = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()));
        serde_json::from_str(&data)
            .unwrap_or_else(|e| panic!("failed to parse fixture {}: {e}", path.display()))
    }

    /// Deserializes a fixture into a Rust type, re-serializes it, and compares
    /// the JSON values (key order independent).
    fn roundtrip_test<T>(name: &str) -> T
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));
        assert_eq!(
            fixture, reserialized,
            "roundtrip mismatch for {name}:\n  fixture: {fixture}\n  rust:    {reserialized}"
        );
        parsed
    }

    #[test]
    fn fixture_initiate_request() {
        let req: InitiateRequest = roundtrip_test("initiate_request.json");
        assert_eq!(req.file_name, "quarterly report.pdf");
        assert_eq!(req.folder.as_deref(), Some("reports/2026"));
    }

    #[test]
    fn fixture_initiate_request_without_folder() {
        let req: InitiateRequest = roundtrip_test("initiate_request_no_folder.json");
        assert!(req.folder.is_none());
    }

    #[test]
    fn fixture_initiate_response() {
        let resp: InitiateResponse = roundtrip_test("initiate_response.json");
        let session: SessionRef = resp.into();
        assert_eq!(session.upload_id, "2~fJx1eTq9a8c");
    }

    #[test]
    fn fixture_part_response() {
        let resp: PartResponse = roundtrip_test("part_response.json");
        // ETags keep their surrounding quotes.
        assert!(resp.etag.starts_with('"') && resp.etag.ends_with('"'));
    }

    #[test]
    fn fixture_complete_request() {
        let req: CompleteRequest = roundtrip_test("complete_request.json");
        let numbers: Vec<u32> = req.parts.iter().map(|p| p.part_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn fixture_abort_request() {
        roundtrip_test::<AbortRequest>("abort_request.json");
    }

    #[test]
    fn fixture_upload_status() {
        let statuses: Vec<UploadStatus> = roundtrip_test("upload_status.json");
        assert_eq!(statuses.len(), 5);
        assert!(statuses[2].is_terminal());
    }

    #[test]
    fn built_complete_request_matches_fixture() {
        let fixture = load_fixture("complete_request.json");
        let session = SessionRef::new("2~fJx1eTq9a8c", "reports/2026/quarterly report.pdf");
        let parts = fixture["parts"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| CompletedPart {
                part_number: p["partNumber"].as_u64().unwrap() as u32,
                etag: p["etag"].as_str().unwrap().to_string(),
            })
            .collect();

        let built = serde_json::to_value(CompleteRequest::new(&session, parts)).unwrap();
        assert_eq!(built, fixture);
    }

    #[test]
    fn abort_request_mirrors_initiate_response() {
        let resp: InitiateResponse =
            serde_json::from_value(load_fixture("initiate_response.json")).unwrap();
        let session: SessionRef = resp.into();
        let abort = serde_json::to_value(AbortRequest::from(&session)).unwrap();
        assert_eq!(abort, load_fixture("abort_request.json"));
    }

    #[test]
    fn initiate_response_ignores_extra_fields() {
        let mut raw = load_fixture("initiate_response.json");
        raw["expiresAt"] = serde_json::json!("2026-10-20T00:00:00Z");
        let resp: InitiateResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(resp.key, "reports/2026/quarterly report.pdf");
    }
}
