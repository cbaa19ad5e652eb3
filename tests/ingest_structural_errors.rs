mod test_support;

use serde_json::json;
use test_support::{request_err, request_ok, spawn_sidecar, spawn_with_workspace, temp_dir};

#[test]
fn missing_register_column_fails_whole_call_and_names_found_columns() {
    let (_child, mut stdin, mut reader) = spawn_with_workspace("eduaid-missing-reg");

    let error = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "upload-cat1",
        json!({ "csv": "S.No,Name,CO1\n1,Asha,25\n" }),
        "missing_column",
    );
    let message = error.get("message").and_then(|v| v.as_str()).expect("message");
    assert!(message.contains("Register Number"), "message: {}", message);
    assert!(message.contains("S.No"), "message: {}", message);
    assert!(message.contains("CO1"), "message: {}", message);

    // Nothing was processed: the store still reports no data.
    let _ = request_err(
        &mut stdin,
        &mut reader,
        "2",
        "marks/deep-analytics",
        json!({}),
        "no_data",
    );
}

#[test]
fn unreadable_file_is_a_structural_failure() {
    let (_child, mut stdin, mut reader) = spawn_with_workspace("eduaid-unreadable");
    let missing = temp_dir("eduaid-unreadable-dir").join("no-such-sheet.csv");

    let _ = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "upload-cat1",
        json!({ "path": missing.to_string_lossy() }),
        "parse_failed",
    );
}

#[test]
fn empty_sheet_is_a_structural_failure() {
    let (_child, mut stdin, mut reader) = spawn_with_workspace("eduaid-empty-sheet");
    let _ = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "upload-cat2",
        json!({ "csv": "" }),
        "parse_failed",
    );
}

#[test]
fn calls_require_a_workspace_and_params() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "upload-cat1",
        json!({ "csv": "REG,CO1\nA1,10\n" }),
        "no_workspace",
    );
    let _ = request_err(
        &mut stdin,
        &mut reader,
        "2",
        "workspace.select",
        json!({}),
        "bad_params",
    );
    let _ = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "does.not.exist",
        json!({}),
        "not_implemented",
    );

    let workspace = temp_dir("eduaid-params");
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let _ = request_err(
        &mut stdin,
        &mut reader,
        "5",
        "upload-cat1",
        json!({}),
        "bad_params",
    );
}
