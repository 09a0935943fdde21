//! Table process server with an in-memory runtime
//!
//! Loads `tables.yaml` (namespace `widgets.table`), backs every referenced
//! process with a small in-memory implementation and serves the REST
//! exposure on 127.0.0.1:3000.
//!
//! ```text
//! curl -X POST localhost:3000/processes/widgets.table.search \
//!      -H 'content-type: application/json' -d '{"args": ["pet", {}, 1, 10]}'
//! curl -X POST localhost:3000/processes/widgets.table.deletein \
//!      -H 'content-type: application/json' -d '{"args": ["pet", "1,2"]}'
//! curl -X POST localhost:3000/processes/widgets.table.download \
//!      -H 'content-type: application/json' \
//!      -d '{"args": ["invoice", "file", "/2024/inv-7.pdf", "Bearer demo-token"]}'
//! ```

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use table_process::prelude::*;
use tracing_subscriber::EnvFilter;

const CONFIG: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/demos/table_server/tables.yaml");

type Rows = Arc<RwLock<BTreeMap<String, Value>>>;

fn seed() -> Rows {
    let mut rows = BTreeMap::new();
    for (id, name, status) in [
        ("1", "Rex", "available"),
        ("2", "Tom", "sold"),
        ("3", "Kiki", "pending"),
    ] {
        rows.insert(
            id.to_string(),
            json!({"id": id, "name": name, "status": status}),
        );
    }
    Arc::new(RwLock::new(rows))
}

/// Ids named by the `primary in [...]` condition of a rewritten request
fn ids_in(arg: Option<&Arg>) -> Vec<String> {
    let Some(Arg::Query(query)) = arg else {
        return Vec::new();
    };
    query
        .wheres
        .iter()
        .filter(|w| w.op == "in")
        .filter_map(|w| w.value.as_array())
        .flatten()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect()
}

fn runtime(rows: Rows) -> ProcessTable {
    let paginate = rows.clone();
    let find = rows.clone();
    let delete = rows.clone();
    let update = rows;

    ProcessTable::new()
        .with_fn("models.pet.Paginate", move |_req| {
            let rows = paginate
                .read()
                .map_err(|_| anyhow::anyhow!("pet store poisoned"))?;
            let data: Vec<&Value> = rows.values().collect();
            Ok(json!({"data": data, "total": data.len(), "page": 1}))
        })
        .with_fn("models.pet.Find", move |req| {
            let id = req.args.get(1).map(|a| a.to_string()).unwrap_or_default();
            let rows = find
                .read()
                .map_err(|_| anyhow::anyhow!("pet store poisoned"))?;
            rows.get(&id)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("pet {} not found", id))
        })
        .with_fn("models.pet.DeleteWhere", move |req| {
            let mut rows = delete
                .write()
                .map_err(|_| anyhow::anyhow!("pet store poisoned"))?;
            let removed = ids_in(req.args.get(1))
                .iter()
                .filter(|id| rows.remove(*id).is_some())
                .count();
            Ok(json!(removed))
        })
        .with_fn("models.pet.UpdateWhere", move |req| {
            let patch = req.args.get(2).map(Arg::to_json).unwrap_or(Value::Null);
            let mut rows = update
                .write()
                .map_err(|_| anyhow::anyhow!("pet store poisoned"))?;
            let mut updated = 0;
            for id in ids_in(req.args.get(1)) {
                if let (Some(Value::Object(row)), Value::Object(fields)) =
                    (rows.get_mut(&id), &patch)
                {
                    row.extend(fields.clone());
                    updated += 1;
                }
            }
            Ok(json!(updated))
        })
        .with_fn("scripts.pet.Setting", |req| {
            Ok(json!({"table": req.args.last().map(|a| a.to_string())}))
        })
        .with_fn("models.status.Get", |req| {
            let filter = req.args.first().map(Arg::to_json).unwrap_or(Value::Null);
            Ok(json!({
                "filter": filter,
                "options": ["available", "pending", "sold"],
            }))
        })
        .with_fn("fs.data.Upload", |req| match req.args.first() {
            Some(Arg::File(file)) => Ok(json!({"path": format!("/uploads/{}", file.name)})),
            _ => Err(anyhow::anyhow!("no file")),
        })
        .with_fn("scripts.invoice.Download", |req| {
            Ok(json!({
                "path": req.args.first().map(|a| a.to_string()),
                "sid": req.sid,
            }))
        })
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,table_process=debug")),
        )
        .init();

    let claims = StaticClaimsValidator::new().with_token("demo-token", AuthClaims::new("demo-sid"));

    ServerBuilder::new()
        .with_config_file(CONFIG)?
        .with_runtime(runtime(seed()))
        .with_claims_validator(claims)
        .with_cors()
        .serve("127.0.0.1:3000")
        .await
}
