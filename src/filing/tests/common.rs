use std::sync::Arc;

use axum::response::Response;
use serde_json::Value;

use crate::filing::domain::{ClassificationTag, Entity, FilingFlag};
use crate::filing::engine::{FilingEngine, Verdict};
use crate::filing::service::FilingService;

pub(super) fn engine() -> FilingEngine {
    FilingEngine::default()
}

pub(super) fn person(id: &str) -> Entity {
    Entity::new(id).with_name(format!("Taxpayer {id}"))
}

pub(super) fn with_flags(mut entity: Entity, flags: &[FilingFlag]) -> Entity {
    for flag in flags {
        entity.flags.insert(*flag);
    }
    entity
}

pub(super) fn tags(verdict: &Verdict) -> Vec<ClassificationTag> {
    verdict.tags.iter().copied().collect()
}

pub(super) fn assert_exclusive(verdict: &Verdict) {
    let set = [
        verdict.must_file(),
        verdict.optional_filing(),
        verdict.no_filing_required(),
    ]
    .iter()
    .filter(|value| **value)
    .count();
    assert_eq!(set, 1, "exactly one filing boolean must hold: {verdict:?}");
}

pub(super) fn shared_service() -> Arc<FilingService> {
    Arc::new(FilingService::default())
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
