//! End-to-end tests for the function filter.
//!
//! Each test substitutes a direct host command for the container
//! runtime to exercise the full scope → envelope → run → decode →
//! merge path without docker.

use fnrun::constants::{INDEX_ANNOTATION, PATH_ANNOTATION};
use fnrun::{ByteReader, ByteWriter, Document, ExecRuntime, FunctionFilter, FunctionRuntime};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

// =============================================================================
// Test Helpers
// =============================================================================

const INPUT: &str = r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: deployment-foo
---
apiVersion: v1
kind: Service
metadata:
  name: service-foo
"#;

const INPUT_WITH_PATHS: &str = r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: deployment-foo
  annotations:
    config.kubernetes.io/path: foo/bar/d.yaml
---
apiVersion: v1
kind: Service
metadata:
  name: service-foo
  annotations:
    config.kubernetes.io/path: foo/bar/s.yaml
"#;

const WRAPPED_OUTPUT: &str = r#"
apiVersion: config.kubernetes.io/v1alpha1
kind: ResourceList
items:
- apiVersion: apps/v1
  kind: Deployment
  metadata:
    name: deployment-foo
- apiVersion: v1
  kind: Service
  metadata:
    name: service-foo
"#;

const WRAPPED_OUTPUT_WITH_RESULTS: &str = r#"
apiVersion: config.kubernetes.io/v1alpha1
kind: ResourceList
items:
- apiVersion: apps/v1
  kind: Deployment
  metadata:
    name: deployment-foo
- apiVersion: v1
  kind: Service
  metadata:
    name: service-foo
results:
- apiVersion: config.k8s.io/v1alpha1
  kind: ObjectError
  name: "some-validator"
  items:
  - type: error
    message: "some message"
    resourceRef:
      apiVersion: apps/v1
      kind: Deployment
      name: foo
      namespace: bar
    file:
      path: deploy.yaml
      index: 0
    field:
      path: "spec.template.spec.containers[3].resources.limits.cpu"
      currentValue: "200"
      suggestedValue: "2"
"#;

const EXPECTED_RESULTS: &str = r#"
- apiVersion: config.k8s.io/v1alpha1
  kind: ObjectError
  name: "some-validator"
  items:
  - type: error
    message: "some message"
    resourceRef:
      apiVersion: apps/v1
      kind: Deployment
      name: foo
      namespace: bar
    file:
      path: deploy.yaml
      index: 0
    field:
      path: "spec.template.spec.containers[3].resources.limits.cpu"
      currentValue: "200"
      suggestedValue: "2"
"#;

fn exec(argv: &[&str]) -> Option<Box<dyn FunctionRuntime>> {
    Some(Box::new(ExecRuntime {
        argv: argv.iter().map(|s| s.to_string()).collect(),
    }))
}

fn sed() -> Option<Box<dyn FunctionRuntime>> {
    exec(&["sed", "s/Deployment/StatefulSet/g"])
}

fn read(text: &str) -> Vec<Document> {
    ByteReader::new(text.as_bytes()).read().unwrap()
}

fn write(docs: &[Document], keep_reader_annotations: bool) -> String {
    let mut out = Vec::new();
    let mut writer = ByteWriter::new(&mut out);
    writer.keep_reader_annotations = keep_reader_annotations;
    writer.write(docs).unwrap();
    String::from_utf8(out).unwrap()
}

fn config(text: &str) -> Document {
    Document::parse(text).unwrap()
}

fn plain_config() -> Document {
    config("apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: foo\n")
}

fn config_at(path: &str) -> Document {
    config(&format!(
        "apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: foo\n  annotations:\n    config.kubernetes.io/path: {path}\n"
    ))
}

fn yaml_value(text: &str) -> serde_yaml::Value {
    serde_yaml::from_str(text).unwrap()
}

// =============================================================================
// Path Defaulting
// =============================================================================

#[tokio::test]
async fn test_add_path_annotation() {
    let mut filter = FunctionFilter {
        runtime: exec(&["echo", WRAPPED_OUTPUT]),
        ..Default::default()
    };
    let output = filter.filter(Vec::new()).await.unwrap();

    assert_eq!(output.len(), 2);
    assert_eq!(
        output[0].to_yaml().unwrap(),
        r#"apiVersion: apps/v1
kind: Deployment
metadata:
  name: deployment-foo
  annotations:
    config.kubernetes.io/path: deployment_deployment-foo.yaml
"#
    );
    assert_eq!(
        output[1].to_yaml().unwrap(),
        r#"apiVersion: v1
kind: Service
metadata:
  name: service-foo
  annotations:
    config.kubernetes.io/path: service_service-foo.yaml
"#
    );
}

#[tokio::test]
async fn test_default_naming() {
    // a generator: no inputs, the function produces a bare stream
    let called = Arc::new(AtomicBool::new(false));
    let called_flag = called.clone();
    let mut filter = FunctionFilter {
        config: Some(config_at("foo/bar.yaml")),
        set_flow_style_for_config: true,
        runtime: exec(&[
            "echo",
            "apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: deployment-foo\n---\napiVersion: v1\nkind: Service\nmetadata:\n  name: service-foo\n",
        ]),
        check_input: Some(Box::new(move |s| {
            called_flag.store(true, Ordering::SeqCst);
            assert_eq!(
                s,
                r#"apiVersion: config.kubernetes.io/v1alpha1
kind: ResourceList
items: []
functionConfig: {apiVersion: apps/v1, kind: Deployment, metadata: {name: foo, annotations: {config.kubernetes.io/path: foo/bar.yaml}}}
"#
            );
        })),
        ..Default::default()
    };
    let output = filter.filter(Vec::new()).await.unwrap();
    assert!(called.load(Ordering::SeqCst));

    assert_eq!(
        write(&output, true),
        r#"apiVersion: apps/v1
kind: Deployment
metadata:
  name: deployment-foo
  annotations:
    config.kubernetes.io/index: '0'
    config.kubernetes.io/path: foo/deployment_deployment-foo.yaml
---
apiVersion: v1
kind: Service
metadata:
  name: service-foo
  annotations:
    config.kubernetes.io/index: '1'
    config.kubernetes.io/path: foo/service_service-foo.yaml
"#
    );
}

#[tokio::test]
async fn test_default_naming_functions_dir() {
    // a config under functions/ scopes (and defaults) to the parent dir
    let mut filter = FunctionFilter {
        config: Some(config_at("foo/functions/bar.yaml")),
        runtime: exec(&[
            "echo",
            "apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: deployment-foo\n",
        ]),
        ..Default::default()
    };
    let output = filter.filter(Vec::new()).await.unwrap();
    assert_eq!(
        output[0].annotation(PATH_ANNOTATION),
        Some("foo/deployment_deployment-foo.yaml")
    );
}

// =============================================================================
// Results
// =============================================================================

#[tokio::test]
async fn test_write_results() {
    let dir = tempfile::TempDir::new().unwrap();
    let results_path = dir.path().join("results.yaml");
    let mut filter = FunctionFilter {
        results_file: Some(results_path.clone()),
        runtime: exec(&["echo", WRAPPED_OUTPUT_WITH_RESULTS]),
        ..Default::default()
    };
    let output = filter.filter(Vec::new()).await.unwrap();
    assert_eq!(output.len(), 2);

    // the in-memory handle and the file carry the same sequence
    assert_eq!(filter.results.len(), 1);
    assert_eq!(filter.results[0].kind(), Some("ObjectError"));
    let written = std::fs::read_to_string(&results_path).unwrap();
    assert_eq!(written.trim(), filter.results_yaml().unwrap().trim());
    assert_eq!(yaml_value(&written), yaml_value(EXPECTED_RESULTS));
}

#[tokio::test]
async fn test_write_results_non_zero_exit() {
    let dir = tempfile::TempDir::new().unwrap();
    let results_path = dir.path().join("results.yaml");
    let mut filter = FunctionFilter {
        results_file: Some(results_path.clone()),
        runtime: exec(&[
            "sh",
            "-c",
            &format!("echo '{WRAPPED_OUTPUT_WITH_RESULTS}' && exit 1"),
        ]),
        ..Default::default()
    };
    let err = filter.filter(Vec::new()).await.unwrap_err();
    assert_eq!(err.to_string(), "exit status 1");

    // results are still written and still on the handle
    let written = std::fs::read_to_string(&results_path).unwrap();
    assert_eq!(yaml_value(&written), yaml_value(EXPECTED_RESULTS));
    assert_eq!(filter.results.len(), 1);
}

#[tokio::test]
async fn test_missing_results_file() {
    let mut filter = FunctionFilter {
        results_file: Some("/not/real/file".into()),
        runtime: exec(&[
            "sh",
            "-c",
            &format!("echo '{WRAPPED_OUTPUT_WITH_RESULTS}' && exit 1"),
        ]),
        ..Default::default()
    };
    let err = filter.filter(Vec::new()).await.unwrap_err();
    // the file-open error supersedes the exit error
    assert!(err.to_string().starts_with("open /not/real/file:"));
}

// =============================================================================
// Transform Round Trips
// =============================================================================

#[tokio::test]
async fn test_transform() {
    let called = Arc::new(AtomicBool::new(false));
    let called_flag = called.clone();
    let mut filter = FunctionFilter {
        config: Some(plain_config()),
        set_flow_style_for_config: true,
        runtime: sed(),
        check_input: Some(Box::new(move |s| {
            called_flag.store(true, Ordering::SeqCst);
            assert_eq!(
                s,
                r#"apiVersion: config.kubernetes.io/v1alpha1
kind: ResourceList
items:
- apiVersion: apps/v1
  kind: Deployment
  metadata:
    name: deployment-foo
    annotations:
      config.kubernetes.io/index: '0'
- apiVersion: v1
  kind: Service
  metadata:
    name: service-foo
    annotations:
      config.kubernetes.io/index: '1'
functionConfig: {apiVersion: apps/v1, kind: Deployment, metadata: {name: foo}}
"#
            );
        })),
        ..Default::default()
    };
    let output = filter.filter(read(INPUT)).await.unwrap();
    assert!(called.load(Ordering::SeqCst));

    assert_eq!(
        write(&output, true),
        r#"apiVersion: apps/v1
kind: StatefulSet
metadata:
  name: deployment-foo
  annotations:
    config.kubernetes.io/index: '0'
    config.kubernetes.io/path: statefulset_deployment-foo.yaml
---
apiVersion: v1
kind: Service
metadata:
  name: service-foo
  annotations:
    config.kubernetes.io/index: '1'
    config.kubernetes.io/path: service_service-foo.yaml
"#
    );
}

#[tokio::test]
async fn test_transform_no_change() {
    let mut filter = FunctionFilter {
        config: Some(plain_config()),
        runtime: exec(&["sh", "-c", "cat <&0"]),
        ..Default::default()
    };
    let output = filter.filter(read(INPUT)).await.unwrap();

    assert_eq!(
        write(&output, true),
        r#"apiVersion: apps/v1
kind: Deployment
metadata:
  name: deployment-foo
  annotations:
    config.kubernetes.io/index: '0'
    config.kubernetes.io/path: deployment_deployment-foo.yaml
---
apiVersion: v1
kind: Service
metadata:
  name: service-foo
  annotations:
    config.kubernetes.io/index: '1'
    config.kubernetes.io/path: service_service-foo.yaml
"#
    );
}

// =============================================================================
// Scoping
// =============================================================================

#[tokio::test]
async fn test_scope_missing() {
    // config scoped to foo/, inputs carry no paths: nothing in scope
    let called = Arc::new(AtomicBool::new(false));
    let called_flag = called.clone();
    let mut filter = FunctionFilter {
        config: Some(config_at("foo/bar.yaml")),
        set_flow_style_for_config: true,
        runtime: sed(),
        check_input: Some(Box::new(move |s| {
            called_flag.store(true, Ordering::SeqCst);
            assert_eq!(
                s,
                r#"apiVersion: config.kubernetes.io/v1alpha1
kind: ResourceList
items: []
functionConfig: {apiVersion: apps/v1, kind: Deployment, metadata: {name: foo, annotations: {config.kubernetes.io/path: foo/bar.yaml}}}
"#
            );
        })),
        ..Default::default()
    };
    let output = filter.filter(read(INPUT)).await.unwrap();
    assert!(called.load(Ordering::SeqCst));

    // originals come back untouched, with only the index annotation added
    assert_eq!(
        write(&output, true),
        r#"apiVersion: apps/v1
kind: Deployment
metadata:
  name: deployment-foo
  annotations:
    config.kubernetes.io/index: '0'
---
apiVersion: v1
kind: Service
metadata:
  name: service-foo
  annotations:
    config.kubernetes.io/index: '1'
"#
    );
    // stripped emission restores the original documents exactly
    assert_eq!(write(&output, false), INPUT.trim_start().to_string());
}

#[tokio::test]
async fn test_global_scope() {
    let mut filter = FunctionFilter {
        config: Some(config_at("foo/bar.yaml")),
        global_scope: true,
        runtime: sed(),
        ..Default::default()
    };
    let output = filter.filter(read(INPUT)).await.unwrap();

    assert_eq!(
        write(&output, true),
        r#"apiVersion: apps/v1
kind: StatefulSet
metadata:
  name: deployment-foo
  annotations:
    config.kubernetes.io/index: '0'
    config.kubernetes.io/path: foo/statefulset_deployment-foo.yaml
---
apiVersion: v1
kind: Service
metadata:
  name: service-foo
  annotations:
    config.kubernetes.io/index: '1'
    config.kubernetes.io/path: foo/service_service-foo.yaml
"#
    );
}

#[tokio::test]
async fn test_scope_functions_dir() {
    // the functions/ segment is stripped: scope is foo/, both inputs match
    let mut filter = FunctionFilter {
        config: Some(config_at("foo/functions/bar.yaml")),
        runtime: sed(),
        ..Default::default()
    };
    let output = filter.filter(read(INPUT_WITH_PATHS)).await.unwrap();

    // content rewritten, original paths preserved
    assert_eq!(
        write(&output, true),
        r#"apiVersion: apps/v1
kind: StatefulSet
metadata:
  name: deployment-foo
  annotations:
    config.kubernetes.io/path: foo/bar/d.yaml
    config.kubernetes.io/index: '0'
---
apiVersion: v1
kind: Service
metadata:
  name: service-foo
  annotations:
    config.kubernetes.io/path: foo/bar/s.yaml
    config.kubernetes.io/index: '1'
"#
    );
}

#[tokio::test]
async fn test_scope_root_config_sees_nested_resources() {
    let mut filter = FunctionFilter {
        config: Some(config_at("baz.yaml")),
        runtime: sed(),
        ..Default::default()
    };
    let output = filter.filter(read(INPUT_WITH_PATHS)).await.unwrap();

    assert_eq!(output[0].kind(), Some("StatefulSet"));
    assert_eq!(output[0].annotation(PATH_ANNOTATION), Some("foo/bar/d.yaml"));
    assert_eq!(output[1].kind(), Some("Service"));
}

#[tokio::test]
async fn test_out_of_scope_untouched_in_merge() {
    let input = read(
        r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: deployment-foo
  annotations:
    config.kubernetes.io/path: foo/d.yaml
---
apiVersion: v1
kind: Service
metadata:
  name: service-foo
  annotations:
    config.kubernetes.io/path: other/s.yaml
"#,
    );
    let mut filter = FunctionFilter {
        config: Some(config_at("foo/bar.yaml")),
        runtime: sed(),
        ..Default::default()
    };
    let output = filter.filter(input).await.unwrap();

    // transformed items first, then the documents the function never saw
    assert_eq!(output.len(), 2);
    assert_eq!(output[0].kind(), Some("StatefulSet"));
    assert_eq!(output[0].annotation(PATH_ANNOTATION), Some("foo/d.yaml"));
    assert_eq!(output[1].kind(), Some("Service"));
    assert_eq!(output[1].annotation(PATH_ANNOTATION), Some("other/s.yaml"));
    assert_eq!(output[1].annotation(INDEX_ANNOTATION), Some("1"));
}

// =============================================================================
// Construction
// =============================================================================

#[test]
fn test_from_config() {
    let filter = FunctionFilter::from_config(config(
        "apiVersion: v1beta1\nkind: Example\nmetadata:\n  annotations:\n    config.kubernetes.io/function: |-\n      container:\n        image: foo:v1.0.0\n        mounts:\n        - type: bind\n          src: /mount/path\n          dst: /local/\n",
    ))
    .unwrap();
    assert_eq!(filter.image, "foo:v1.0.0");
    assert_eq!(filter.storage_mounts.len(), 1);
    assert!(filter.config.is_some());
}

#[test]
fn test_from_config_without_spec() {
    let err = FunctionFilter::from_config(config(
        "apiVersion: v1\nkind: Service\nmetadata:\n  name: svc\n",
    ))
    .unwrap_err();
    assert!(matches!(err, fnrun::Error::Spec { .. }));
}
