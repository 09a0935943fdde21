//! End-to-end dispatch through a built `ProcessHost`
//!
//! These tests drive every operation family by name, the way an external
//! caller would, and check what the downstream processes receive.

mod common;

use common::{TABLES, host, recording_runtime, request};
use std::collections::HashMap;
use std::sync::Arc;
use table_process::prelude::*;

// =============================================================================
// Registry
// =============================================================================

mod registry_tests {
    use super::*;

    #[tokio::test]
    async fn test_unregistered_name_is_not_found() {
        let (runtime, calls) = recording_runtime();
        let err = host(runtime)
            .dispatch("xyz", request(vec![json!("pet")]))
            .await
            .unwrap_err();
        assert_eq!(err.status_code().as_u16(), 404);
        assert!(matches!(err, ProcessError::Process(_)));
        assert!(calls.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn test_names_are_case_sensitive() {
        let (runtime, _) = recording_runtime();
        let err = host(runtime)
            .dispatch("Search", request(vec![json!("pet")]))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "PROCESS_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_namespaced_registration() {
        let (runtime, calls) = recording_runtime();
        let mut config = TablesConfig::from_yaml_str(TABLES).expect("valid fixture");
        config.namespace = Some("widgets.table".to_string());
        let host = ServerBuilder::new()
            .with_config(config)
            .with_runtime(runtime)
            .with_claims_validator(common::validator())
            .build_host()
            .expect("host builds");

        host.dispatch("widgets.table.find", request(vec![json!("pet"), json!(1)]))
            .await
            .expect("namespaced find succeeds");
        assert_eq!(calls.lock().expect("lock")[0].0, "models.pet.Find");

        let err = host
            .dispatch("find", request(vec![json!("pet"), json!(1)]))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "PROCESS_NOT_FOUND");
    }
}

// =============================================================================
// Table resolution
// =============================================================================

mod table_resolution_tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_table_is_not_found_for_every_operation() {
        let (runtime, calls) = recording_runtime();
        let host = host(runtime);
        for operation in TableOperation::ALL {
            let last = match operation {
                TableOperation::Component => json!({}),
                _ => json!("c.png"),
            };
            let args = vec![json!("ghost"), json!("a"), json!("b"), last];
            let err = host
                .dispatch(operation.as_str(), request(args))
                .await
                .unwrap_err();
            assert_eq!(
                err.error_code(),
                "TABLE_NOT_FOUND",
                "operation {} should fail table resolution",
                operation
            );
        }
        assert!(calls.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn test_missing_table_argument() {
        let (runtime, _) = recording_runtime();
        let err = host(runtime)
            .dispatch("search", ProcessRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.status_code().as_u16(), 400);
        assert_eq!(err.error_code(), "ARGUMENT_COUNT");
    }

    #[tokio::test]
    async fn test_non_string_table_argument() {
        let (runtime, _) = recording_runtime();
        let err = host(runtime)
            .dispatch("search", request(vec![json!(42)]))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_ARGUMENT");
    }
}

// =============================================================================
// Pass-through actions
// =============================================================================

mod action_tests {
    use super::*;

    #[tokio::test]
    async fn test_crud_operations_forward_unchanged() {
        let (runtime, calls) = recording_runtime();
        let host = host(runtime);

        let cases = [
            ("search", "models.pet.Paginate"),
            ("find", "models.pet.Find"),
        ];
        for (operation, process) in cases {
            let req = request(vec![json!("pet"), json!({"withs": {}}), json!(2)]);
            host.dispatch(operation, req.clone())
                .await
                .expect("action succeeds");
            let calls = calls.lock().expect("lock");
            let (name, received) = calls.last().expect("one call");
            assert_eq!(name, process);
            assert_eq!(received, &req);
        }
    }

    #[tokio::test]
    async fn test_action_result_is_returned_verbatim() {
        let runtime = ProcessTable::new().with_fn("models.pet.Find", |_| {
            Ok(json!({"id": 1, "name": "Rex"}))
        });
        let result = host(runtime)
            .dispatch("find", request(vec![json!("pet"), json!(1)]))
            .await
            .expect("find succeeds");
        assert_eq!(result, json!({"id": 1, "name": "Rex"}));
    }

    #[tokio::test]
    async fn test_setting_appends_table_id() {
        let (runtime, calls) = recording_runtime();
        let result = host(runtime)
            .dispatch("setting", request(vec![json!("pet")]))
            .await
            .expect("setting succeeds");
        assert_eq!(result["args"], json!(["pet", "pet"]));
        assert_eq!(calls.lock().expect("lock")[0].0, "scripts.pet.Setting");
    }

    #[tokio::test]
    async fn test_action_failure_is_500() {
        let runtime = ProcessTable::new().with_fn("models.pet.Paginate", |_| {
            Err(anyhow::anyhow!("connection refused"))
        });
        let err = host(runtime)
            .dispatch("search", request(vec![json!("pet")]))
            .await
            .unwrap_err();
        assert_eq!(err.status_code().as_u16(), 500);
        assert_eq!(err.to_string(), "connection refused");
    }

    #[tokio::test]
    async fn test_typed_error_from_process_passes_through() {
        let runtime = ProcessTable::new().with_fn("models.pet.Find", |_| {
            Err(ProcessError::from(TableError::NotFound {
                table: "owner".to_string(),
            })
            .into())
        });
        let err = host(runtime)
            .dispatch("find", request(vec![json!("pet"), json!(1)]))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "TABLE_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_unresolvable_action_process_is_400() {
        let (runtime, _) = recording_runtime();
        // scripts.invoice.DeleteIn is configured but never registered
        let err = host(runtime)
            .dispatch("deletein", request(vec![json!("invoice"), json!("A1,A2")]))
            .await
            .unwrap_err();
        assert_eq!(err.status_code().as_u16(), 400);
        assert_eq!(err.error_code(), "PROCESS_REFERENCE");
    }

    #[tokio::test]
    async fn test_xgen_returns_layout() {
        let (runtime, _) = recording_runtime();
        let setting = host(runtime)
            .dispatch("xgen", request(vec![json!("pet")]))
            .await
            .expect("xgen succeeds");
        assert_eq!(setting["primary"], "id");
        assert_eq!(setting["layout"]["table"]["columns"][0]["name"], "Name");
    }
}

// =============================================================================
// Identifier lists
// =============================================================================

mod id_list_tests {
    use super::*;

    #[tokio::test]
    async fn test_update_in_builds_in_predicate() {
        let (runtime, calls) = recording_runtime();
        host(runtime)
            .dispatch(
                "updatein",
                request(vec![json!("pet"), json!("1,2,3"), json!({"status": "x"})]),
            )
            .await
            .expect("updatein succeeds");

        let calls = calls.lock().expect("lock");
        let (name, received) = &calls[0];
        assert_eq!(name, "models.pet.UpdateWhere");
        assert_eq!(
            received.args[1],
            Arg::Query(QueryParam {
                wheres: vec![QueryWhere {
                    column: "id".to_string(),
                    op: "in".to_string(),
                    value: json!(["1", "2", "3"]),
                }],
            })
        );
        assert_eq!(received.args[2], Arg::from(json!({"status": "x"})));
    }

    #[tokio::test]
    async fn test_delete_in_single_and_empty_ids() {
        let (runtime, calls) = recording_runtime();
        let host = host(runtime);

        let cases = [
            ("7", json!(["7"])),
            ("", json!([""])),
            ("1,,2", json!(["1", "", "2"])),
        ];
        for (ids, expected) in cases {
            host.dispatch("deletein", request(vec![json!("pet"), json!(ids)]))
                .await
                .expect("deletein succeeds");
            let calls = calls.lock().expect("lock");
            match &calls.last().expect("one call").1.args[1] {
                Arg::Query(query) => assert_eq!(query.wheres[0].value, expected),
                other => panic!("Expected query argument, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_non_string_ids_rejected() {
        let (runtime, calls) = recording_runtime();
        let err = host(runtime)
            .dispatch("deletein", request(vec![json!("pet"), json!([1, 2])]))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_ARGUMENT");
        assert!(calls.lock().expect("lock").is_empty());
    }
}

// =============================================================================
// Cloud properties
// =============================================================================

mod cloud_property_tests {
    use super::*;

    #[tokio::test]
    async fn test_component_round_trip() {
        let (runtime, calls) = recording_runtime();
        let result = host(runtime)
            .dispatch(
                "component",
                request(vec![
                    json!("pet"),
                    json!("fields.filter.status.edit.props"),
                    json!("search"),
                    json!({"keywords": "av"}),
                ]),
            )
            .await
            .expect("component succeeds");
        assert_eq!(result["args"], json!([{"keywords": "av"}]));
        assert_eq!(calls.lock().expect("lock")[0].0, "models.status.Get");
    }

    #[tokio::test]
    async fn test_component_unknown_key() {
        let (runtime, _) = recording_runtime();
        let err = host(runtime)
            .dispatch(
                "component",
                request(vec![json!("pet"), json!("fields.x"), json!("search")]),
            )
            .await
            .unwrap_err();
        assert_eq!(err.status_code().as_u16(), 400);
        assert_eq!(err.to_string(), "fields.x.$search does not exist");
    }

    #[tokio::test]
    async fn test_upload_with_file() {
        let (runtime, calls) = recording_runtime();
        let file = UploadFile {
            name: "rex.png".to_string(),
            temp_file: "/tmp/u-1".to_string(),
            size: 2048,
            header: HashMap::new(),
        };
        host(runtime)
            .dispatch(
                "upload",
                ProcessRequest::new(vec![
                    Arg::from("pet"),
                    Arg::from("fields.form.photo.edit.props"),
                    Arg::from("upload"),
                    Arg::File(file.clone()),
                ]),
            )
            .await
            .expect("upload succeeds");
        let calls = calls.lock().expect("lock");
        assert_eq!(calls[0].0, "fs.data.Upload");
        assert_eq!(calls[0].1.args, vec![Arg::File(file)]);
    }

    #[tokio::test]
    async fn test_upload_without_file() {
        let (runtime, _) = recording_runtime();
        let err = host(runtime)
            .dispatch(
                "upload",
                request(vec![
                    json!("pet"),
                    json!("fields.form.photo.edit.props"),
                    json!("upload"),
                    json!("not-a-file"),
                ]),
            )
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "PARAMETERS_ERROR");
    }
}

// =============================================================================
// Downloads
// =============================================================================

mod download_tests {
    use super::*;

    #[tokio::test]
    async fn test_download_with_valid_token() {
        let (runtime, calls) = recording_runtime();
        host(runtime)
            .dispatch(
                "download",
                request(vec![
                    json!("pet"),
                    json!("photo"),
                    json!("/p/rex.png"),
                    json!("Bearer good-token"),
                ]),
            )
            .await
            .expect("download succeeds");
        let calls = calls.lock().expect("lock");
        assert_eq!(calls[0].0, "fs.system.Download");
        assert_eq!(calls[0].1.args, vec![Arg::from("/p/rex.png")]);
        assert_eq!(calls[0].1.sid.as_deref(), Some("sid-42"));
    }

    #[tokio::test]
    async fn test_download_table_process_overrides_default() {
        let (runtime, calls) = recording_runtime();
        host(runtime)
            .dispatch(
                "download",
                request(vec![
                    json!("invoice"),
                    json!("file"),
                    json!("inv-7.pdf"),
                    json!("good-token"),
                ]),
            )
            .await
            .expect("download succeeds");
        assert_eq!(calls.lock().expect("lock")[0].0, "scripts.invoice.Download");
    }

    #[tokio::test]
    async fn test_disallowed_extension_wins_over_missing_token() {
        let (runtime, calls) = recording_runtime();
        let err = host(runtime)
            .dispatch(
                "download",
                request(vec![json!("pet"), json!("photo"), json!("x.exe"), json!("")]),
            )
            .await
            .unwrap_err();
        assert_eq!(err.status_code().as_u16(), 403);
        assert_eq!(err.error_code(), "EXTENSION_DENIED");
        assert!(calls.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn test_missing_token_no_permission() {
        let (runtime, _) = recording_runtime();
        let err = host(runtime)
            .dispatch(
                "download",
                request(vec![json!("pet"), json!("photo"), json!("x.png"), json!("Bearer ")]),
            )
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "NO_PERMISSION");
    }

    #[tokio::test]
    async fn test_null_token_no_permission() {
        let (runtime, calls) = recording_runtime();
        let err = host(runtime)
            .dispatch(
                "download",
                request(vec![json!("pet"), json!("photo"), json!("x.png"), json!(null)]),
            )
            .await
            .unwrap_err();
        assert_eq!(err.status_code().as_u16(), 403);
        assert_eq!(err.error_code(), "NO_PERMISSION");
        assert!(calls.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn test_null_token_checks_extension_first() {
        let (runtime, calls) = recording_runtime();
        let err = host(runtime)
            .dispatch(
                "download",
                request(vec![json!("pet"), json!("photo"), json!("x.exe"), json!(null)]),
            )
            .await
            .unwrap_err();
        assert_eq!(err.status_code().as_u16(), 403);
        assert_eq!(err.error_code(), "EXTENSION_DENIED");
        assert!(calls.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn test_file_without_extension_denied() {
        let (runtime, _) = recording_runtime();
        let err = host(runtime)
            .dispatch(
                "download",
                request(vec![
                    json!("pet"),
                    json!("photo"),
                    json!("/etc/passwd"),
                    json!("good-token"),
                ]),
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "pet.photo . file does not allow");
    }
}

// =============================================================================
// Concurrency
// =============================================================================

mod concurrency_tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_dispatch() {
        let (runtime, calls) = recording_runtime();
        let host = Arc::new(host(runtime));

        let mut handles = Vec::new();
        for i in 0..32 {
            let host = host.clone();
            handles.push(tokio::spawn(async move {
                let ids = format!("{},{}", i, i + 1);
                host.dispatch("deletein", request(vec![json!("pet"), json!(ids)]))
                    .await
            }));
        }

        for handle in handles {
            handle
                .await
                .expect("task completes")
                .expect("deletein succeeds");
        }
        assert_eq!(calls.lock().expect("lock").len(), 32);
    }
}
