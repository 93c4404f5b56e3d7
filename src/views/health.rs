use poem::{handler, web::Json};
use serde_json::{json, Value};

#[handler]
pub fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
