//! Diffing executed notebooks end to end.

use notebook_diff::{diff_notebooks, pair_notebooks, DEFAULT_CONTEXT};
use serde_json::json;
use test_utils::{display_data, execute_result, stream_output, NotebookBuilder};

fn tracking_notebook(feature_count: &str, png: &str) -> NotebookBuilder {
    NotebookBuilder::new()
        .markdown("# OLR tracking")
        .code("import tobac", vec![])
        .code(
            "features = tobac.feature_detection_multithreshold(...)",
            vec![stream_output("Feature detection done\n")],
        )
        .code(
            "len(features)",
            vec![execute_result(json!({
                "text/plain": [feature_count],
                "text/html": ["<b>", feature_count, "</b>"],
            }))],
        )
        .code(
            "plot(features)",
            vec![display_data(json!({
                "image/png": png,
                "text/plain": ["<Figure size 640x480 with 1 Axes>"],
            }))],
        )
}

#[test]
fn test_same_outputs_give_empty_diff() {
    let dir = tempfile::tempdir().unwrap();
    let a = tracking_notebook("42", "iVBORw0").write(&dir.path().join("a/nb.ipynb"));
    let b = tracking_notebook("42", "iVBORw0").write(&dir.path().join("b/nb.ipynb"));

    let result = diff_notebooks(&a, &b, DEFAULT_CONTEXT).unwrap();
    assert!(result.is_identical());
}

#[test]
fn test_html_only_change_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let a = tracking_notebook("42", "iVBORw0").write(&dir.path().join("a/nb.ipynb"));
    let b_builder = NotebookBuilder::new()
        .markdown("# OLR tracking")
        .code("import tobac", vec![])
        .code(
            "features = tobac.feature_detection_multithreshold(...)",
            vec![stream_output("Feature detection done\n")],
        )
        .code(
            "len(features)",
            vec![execute_result(json!({
                "text/plain": ["42"],
                "text/html": ["<i>42</i>"],
            }))],
        )
        .code(
            "plot(features)",
            vec![display_data(json!({
                "image/png": "iVBORw0",
                "text/plain": ["<Figure size 640x480 with 1 Axes>"],
            }))],
        );
    let b = b_builder.write(&dir.path().join("b/nb.ipynb"));

    assert!(diff_notebooks(&a, &b, DEFAULT_CONTEXT).unwrap().is_identical());
}

#[test]
fn test_changed_result_shows_in_diff() {
    let dir = tempfile::tempdir().unwrap();
    let a = tracking_notebook("42", "iVBORw0").write(&dir.path().join("a/nb.ipynb"));
    let b = tracking_notebook("43", "iVBORw1").write(&dir.path().join("b/nb.ipynb"));

    let result = diff_notebooks(&a, &b, DEFAULT_CONTEXT).unwrap();
    assert!(result.diff.starts_with(&format!("--- {}\n+++ {}\n", a.display(), b.display())));
    assert!(result.diff.contains("-        \"text/plain\": \"42\""));
    assert!(result.diff.contains("+        \"text/plain\": \"43\""));
    assert!(result.diff.contains("-        \"image/png\": \"iVBORw0\""));
    assert!(!result.diff.contains("<b>"));
}

#[test]
fn test_missing_notebook_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let a = tracking_notebook("1", "x").write(&dir.path().join("a.ipynb"));
    let err = diff_notebooks(&a, &dir.path().join("missing.ipynb"), 3).unwrap_err();
    assert!(matches!(err, notebook_diff::NotebookError::Io { .. }));
}

#[test]
fn test_pairing_by_file_name() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("v1.5.0");
    let tgt = dir.path().join("v1.6.0");
    for name in ["Example_A.ipynb", "Example_B.ipynb"] {
        NotebookBuilder::new().write(&src.join(name));
    }
    for name in ["Example_B.ipynb", "Example_C.ipynb"] {
        NotebookBuilder::new().write(&tgt.join(name));
    }
    std::fs::write(src.join("notes.txt"), "not a notebook").unwrap();

    let pairing = pair_notebooks(&src, &tgt).unwrap();
    assert_eq!(
        pairing.pairs,
        vec![(src.join("Example_B.ipynb"), tgt.join("Example_B.ipynb"))]
    );
    assert_eq!(pairing.source_only, vec!["Example_A.ipynb".to_string()]);
    assert_eq!(pairing.target_only, vec!["Example_C.ipynb".to_string()]);
}
