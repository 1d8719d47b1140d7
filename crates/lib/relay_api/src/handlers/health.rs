//! Liveness probe.

/// `GET /healthz` — reports that the process is serving. Never calls the
/// provider.
pub async fn healthz() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn healthz_returns_ok() {
        assert_eq!(healthz().await, "ok");
    }
}
