/// Handler for `GET /healthz`, a liveness check. Answers 200 with a
/// plain-text `ok` body.
pub async fn healthz() -> &'static str {
    "ok"
}

/// Handler for `GET /readyz`, a readiness check. Returns 200 once the
/// process is serving; services that need a dependency probe mount
/// their own handler instead.
pub async fn readyz() -> &'static str {
    "ok"
}
