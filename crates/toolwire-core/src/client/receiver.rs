//! Background receiver: drains worker responses and resolves pending calls

use super::PendingCalls;
use crate::codec;
use crate::error::WireError;
use crate::protocol::{CallId, Envelope};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::AsyncBufRead;
use tracing::{debug, warn};

/// Single reader of the worker's output stream
///
/// Resolves each response against the pending-call table by correlation id.
/// Responses with no pending entry (timed out, or never requested) are logged
/// and discarded. Stream closure or corruption fails every outstanding call
/// with `ProtocolViolation` and ends the task.
pub(super) async fn read_responses<R>(mut reader: R, pending: PendingCalls, running: Arc<AtomicBool>)
where
    R: AsyncBufRead + Unpin,
{
    loop {
        match codec::read_envelope(&mut reader).await {
            Ok(Some(Envelope::Response(response))) => {
                let id = response.id;
                match pending.remove(&id) {
                    Some((_, sender)) => {
                        let outcome = response.into_result().map_err(WireError::Remote);
                        if sender.send(outcome).is_err() {
                            // The caller timed out between our remove and send.
                            debug!(id, "discarding response for a call that already gave up");
                        }
                    }
                    None => {
                        warn!(id, "discarding response with no pending call");
                    }
                }
            }
            Ok(Some(Envelope::Request(request))) => {
                warn!(id = request.id, "ignoring request envelope from the worker");
            }
            Ok(None) => {
                if running.load(Ordering::SeqCst) {
                    warn!("worker closed its output stream");
                }
                drain(&pending, "worker closed its output stream");
                break;
            }
            Err(e) => {
                warn!(error = %e, "response stream corrupted");
                drain(&pending, format!("response stream corrupted: {e}"));
                break;
            }
        }
    }
    running.store(false, Ordering::SeqCst);
}

// Fail every outstanding call; a caller that already timed out finds its
// entry gone and is untouched.
fn drain(pending: &PendingCalls, reason: impl Into<String>) {
    let reason = reason.into();
    let ids: Vec<CallId> = pending.iter().map(|entry| *entry.key()).collect();
    for id in ids {
        if let Some((_, sender)) = pending.remove(&id) {
            let _ = sender.send(Err(WireError::protocol_violation(reason.clone())));
        }
    }
}
