use eduledger_core::db::open_state_db_in_memory;
use eduledger_core::{
    Evaluation, LedgerGateway, MemoryLedger, RecordKind, RecordStore, Selector, SqliteLedger,
    StoreError,
};
use serde_json::json;

#[test]
fn open_scan_counter_tracks_cursor_lifetime() {
    let ledger = MemoryLedger::new();
    ledger
        .put("Evaluation-e1", evaluation_doc("e1", "u1").as_bytes())
        .unwrap();
    ledger
        .put("Evaluation-e2", evaluation_doc("e2", "u2").as_bytes())
        .unwrap();

    let mut scan = ledger
        .query(&Selector::for_kind(RecordKind::Evaluation))
        .unwrap();
    assert_eq!(ledger.open_scans(), 1);

    // Draining the scan does not release the cursor; dropping it does.
    while scan.next().is_some() {}
    assert_eq!(ledger.open_scans(), 1);

    drop(scan);
    assert_eq!(ledger.open_scans(), 0);
}

#[test]
fn undrained_scan_releases_its_cursor_on_drop() {
    let ledger = MemoryLedger::new();
    ledger
        .put("Evaluation-e1", evaluation_doc("e1", "u1").as_bytes())
        .unwrap();
    ledger
        .put("Evaluation-e2", evaluation_doc("e2", "u1").as_bytes())
        .unwrap();

    let mut scan = ledger
        .query(&Selector::for_kind(RecordKind::Evaluation))
        .unwrap();
    let first = scan.next();
    assert!(first.is_some());
    drop(scan);

    assert_eq!(ledger.open_scans(), 0);
}

#[test]
fn error_mid_listing_still_releases_the_cursor() {
    let ledger = MemoryLedger::new();
    let store = RecordStore::new(ledger.clone());
    store
        .create(Evaluation::new("e1", "u1", "A", ""))
        .unwrap();
    // Matches the kind selector but fails the typed decode.
    ledger
        .put(
            "Evaluation-broken",
            br#"{"docType":"Evaluation","Evaluation_ID":"broken","User_ID":17}"#,
        )
        .unwrap();

    let err = store.list_all::<Evaluation>().unwrap_err();
    assert!(matches!(err, StoreError::Deserialization(_)));
    assert_eq!(ledger.open_scans(), 0);
}

#[test]
fn scan_skips_values_that_are_not_json() {
    let ledger = MemoryLedger::new();
    ledger.put("junk", b"not json at all").unwrap();
    ledger
        .put("Evaluation-e1", evaluation_doc("e1", "u1").as_bytes())
        .unwrap();

    let scan = ledger
        .query(&Selector::for_kind(RecordKind::Evaluation))
        .unwrap();
    let items: Vec<_> = scan.collect();
    assert_eq!(items.len(), 1);
}

#[test]
fn empty_ledger_scans_yield_no_items() {
    let ledger = MemoryLedger::new();

    let mut scan = ledger
        .query(&Selector::owned_by(RecordKind::Judgement, "u1"))
        .unwrap();
    assert!(scan.next().is_none());
}

#[test]
fn clone_handles_share_entries_and_scan_accounting() {
    let ledger = MemoryLedger::new();
    let handle = ledger.clone();

    handle
        .put("Evaluation-e1", evaluation_doc("e1", "u1").as_bytes())
        .unwrap();
    assert_eq!(ledger.len(), 1);

    let scan = handle
        .query(&Selector::for_kind(RecordKind::Evaluation))
        .unwrap();
    assert_eq!(ledger.open_scans(), 1);
    drop(scan);
    assert_eq!(ledger.open_scans(), 0);
}

#[test]
fn sqlite_query_filters_by_kind_and_owner() {
    let conn = open_state_db_in_memory().unwrap();
    let ledger = SqliteLedger::try_new(&conn).unwrap();

    ledger
        .put("Evaluation-e1", evaluation_doc("e1", "u1").as_bytes())
        .unwrap();
    ledger
        .put("Evaluation-e2", evaluation_doc("e2", "u2").as_bytes())
        .unwrap();
    ledger
        .put(
            "TestResult-t1",
            json!({ "docType": "TestResult", "Test_ID": "t1", "User_ID": "u1" })
                .to_string()
                .as_bytes(),
        )
        .unwrap();

    let by_kind = ledger
        .query(&Selector::for_kind(RecordKind::Evaluation))
        .unwrap();
    let values: Vec<Vec<u8>> = by_kind.collect::<Result<_, _>>().unwrap();
    assert_eq!(values.len(), 2);
    for value in &values {
        let doc: serde_json::Value = serde_json::from_slice(value).unwrap();
        assert_eq!(doc["docType"], "Evaluation");
    }

    let by_owner = ledger
        .query(&Selector::owned_by(RecordKind::Evaluation, "u2"))
        .unwrap();
    let values: Vec<Vec<u8>> = by_owner.collect::<Result<_, _>>().unwrap();
    assert_eq!(values.len(), 1);
    let doc: serde_json::Value = serde_json::from_slice(&values[0]).unwrap();
    assert_eq!(doc["Evaluation_ID"], "e2");
}

#[test]
fn sqlite_scan_with_no_matches_is_empty() {
    let conn = open_state_db_in_memory().unwrap();
    let ledger = SqliteLedger::try_new(&conn).unwrap();
    ledger
        .put("Evaluation-e1", evaluation_doc("e1", "u1").as_bytes())
        .unwrap();

    let mut scan = ledger
        .query(&Selector::owned_by(RecordKind::Evaluation, "nobody"))
        .unwrap();
    assert!(scan.next().is_none());
}

fn evaluation_doc(id: &str, owner: &str) -> String {
    json!({
        "docType": "Evaluation",
        "Evaluation_ID": id,
        "User_ID": owner,
        "Points_Degree": "A",
        "Feedback": ""
    })
    .to_string()
}
