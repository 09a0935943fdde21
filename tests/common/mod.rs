//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use table_process::prelude::*;

pub const TABLES: &str = r#"
download:
  allowed_extensions: [png, pdf]
  default_process: fs.system.Download
tables:
  - id: pet
    bind: pet
    layout:
      primary: id
      table: { columns: [{ name: Name }] }
    action:
      setting: { process: scripts.pet.Setting }
    cloud_props:
      - { xpath: fields.filter.status.edit.props, method: search, type: Select, process: models.status.Get }
      - { xpath: fields.form.photo.edit.props, method: upload, type: Upload, process: fs.data.Upload }
  - id: invoice
    layout: { primary: sn }
    action:
      delete_in: { process: scripts.invoice.DeleteIn }
      download: { process: scripts.invoice.Download }
"#;

pub type Calls = Arc<Mutex<Vec<(String, ProcessRequest)>>>;

/// Names of every downstream process the fixture tables reference
pub const PROCESSES: [&str; 9] = [
    "models.pet.Paginate",
    "models.pet.Find",
    "models.pet.UpdateWhere",
    "models.pet.DeleteWhere",
    "scripts.pet.Setting",
    "models.status.Get",
    "fs.data.Upload",
    "fs.system.Download",
    "scripts.invoice.Download",
];

/// Runtime whose processes record `(name, request)` and echo the arguments
pub fn recording_runtime() -> (ProcessTable, Calls) {
    let calls: Calls = Arc::new(Mutex::new(Vec::new()));
    let mut runtime = ProcessTable::new();
    for name in PROCESSES {
        let sink = calls.clone();
        runtime.register_fn(name, move |req: ProcessRequest| {
            let args: Vec<Value> = req.args.iter().map(Arg::to_json).collect();
            sink.lock()
                .expect("lock")
                .push((name.to_string(), req));
            Ok(json!({"process": name, "args": args}))
        });
    }
    (runtime, calls)
}

pub fn validator() -> StaticClaimsValidator {
    StaticClaimsValidator::new().with_token("good-token", AuthClaims::new("sid-42"))
}

pub fn builder(runtime: ProcessTable) -> ServerBuilder {
    ServerBuilder::new()
        .with_config(TablesConfig::from_yaml_str(TABLES).expect("valid fixture"))
        .with_runtime(runtime)
        .with_claims_validator(validator())
}

pub fn host(runtime: ProcessTable) -> ProcessHost {
    builder(runtime).build_host().expect("host builds")
}

pub fn request(args: Vec<Value>) -> ProcessRequest {
    ProcessRequest::new(args.into_iter().map(Arg::from).collect())
}
