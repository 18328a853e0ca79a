use tracing::warn;

use crate::ExternalOrderView;

/// Fire-and-forget outbound mirror of a freshly ingested order to the
/// external system's callback URL.
///
/// Best-effort by contract: the POST runs on a detached task, failures are
/// logged and never surface to the creation request. This is the one place
/// in the system allowed to swallow a dependency failure.
pub fn spawn_mirror(client: reqwest::Client, url: String, view: ExternalOrderView) {
    tokio::spawn(async move {
        match client.post(&url).json(&view).send().await {
            Ok(resp) if resp.status().is_success() => {}
            Ok(resp) => {
                warn!(
                    status = %resp.status(),
                    external_id = %view.external_id,
                    "order mirror rejected by upstream"
                );
            }
            Err(err) => {
                warn!(
                    error = %err,
                    external_id = %view.external_id,
                    "order mirror failed"
                );
            }
        }
    });
}
