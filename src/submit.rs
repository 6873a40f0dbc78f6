//! Client-side submission flow
//!
//! Validation resolves entirely client-side before any network call; an
//! invalid draft never costs an upload. Exactly one submission may be in
//! flight per draft; the guard below backs the disabled submit button. A
//! transport failure surfaces as one retry-able error and always leaves
//! the draft intact; only an acknowledged success clears it.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bytes::Bytes;

use crate::assemble;
use crate::capabilities::{CaptchaTokenProvider, IdentityTokenProvider};
use crate::draft::DraftStore;
use crate::error::RegistryError;
use crate::evidence::EvidenceBundle;
use crate::gateway::IntakeResponse;
use crate::validate;

/// One-at-a-time submission guard.
///
/// Client-side only: it disables re-submission while a request is
/// outstanding, it is not a server-side idempotency guarantee.
#[derive(Debug, Default)]
pub struct SubmissionGuard {
    in_flight: AtomicBool,
}

impl SubmissionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the permit, or None if a submission is already in flight
    pub fn begin(&self) -> Option<SubmissionPermit<'_>> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            Some(SubmissionPermit { guard: self })
        } else {
            None
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }
}

/// Held for the duration of one submission attempt
pub struct SubmissionPermit<'a> {
    guard: &'a SubmissionGuard,
}

impl Drop for SubmissionPermit<'_> {
    fn drop(&mut self) {
        self.guard.in_flight.store(false, Ordering::SeqCst);
    }
}

/// A fully prepared intake request
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    pub content_type: String,
    pub body: Bytes,
    pub captcha_token: String,
    pub identity_token: Option<String>,
}

/// Transport to the intake endpoint. The production implementation posts
/// over the network; tests drive the gateway in-process.
#[async_trait]
pub trait IntakeTransport: Send + Sync {
    async fn send(&self, request: SubmissionRequest) -> Result<IntakeResponse, RegistryError>;
}

/// Validate, assemble and send the active draft.
///
/// On acknowledged success the active draft is cleared and the new record
/// id returned. On any failure the draft is left exactly as it was; the
/// caller surfaces the error banner and offers a manual retry.
pub async fn submit_active_draft(
    store: &mut DraftStore,
    bundle: &EvidenceBundle,
    guard: &SubmissionGuard,
    transport: &dyn IntakeTransport,
    captcha: &dyn CaptchaTokenProvider,
    identity: &dyn IdentityTokenProvider,
) -> Result<String, RegistryError> {
    let _permit = guard.begin().ok_or_else(|| {
        RegistryError::InvalidInput("A submission is already in flight".into())
    })?;

    let draft = store.active_draft();
    let errors = validate::validate(&draft, bundle);
    if !errors.is_empty() {
        let (key, message) = errors
            .first_error(validate::field_order(&draft))
            .unwrap_or(("form", "Invalid submission"));
        return Err(RegistryError::InvalidInput(format!("{}: {}", key, message)));
    }

    let payload = assemble::assemble(&draft, bundle);
    let request = SubmissionRequest {
        content_type: payload.content_type(),
        body: payload.to_bytes(),
        captcha_token: captcha.token().await?,
        identity_token: identity.token().await?,
    };

    let reply = transport.send(request).await?;
    match (reply.success, reply.id) {
        (true, Some(id)) => {
            store.clear_active();
            Ok(id)
        }
        _ => Err(RegistryError::Transport(
            reply
                .error
                .unwrap_or_else(|| "Submission was not accepted".into()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob_store::BlobStore;
    use crate::capabilities::fixed::{Anonymous, FixedCaptcha};
    use crate::db::RegistryDb;
    use crate::draft::{LocalDraft, Variant};
    use crate::fixtures;
    use crate::gateway::Gateway;
    use std::sync::Arc;
    use tempfile::TempDir;

    /// In-process transport that drives the gateway directly
    struct GatewayTransport {
        gateway: Gateway,
    }

    #[async_trait]
    impl IntakeTransport for GatewayTransport {
        async fn send(
            &self,
            request: SubmissionRequest,
        ) -> Result<IntakeResponse, RegistryError> {
            match self.gateway.accept(&request.content_type, &request.body).await {
                Ok(id) => Ok(IntakeResponse::accepted(id)),
                Err(e) => Ok(IntakeResponse::rejected(e.to_string())),
            }
        }
    }

    /// Transport that always fails at the network layer
    struct DeadTransport;

    #[async_trait]
    impl IntakeTransport for DeadTransport {
        async fn send(
            &self,
            _request: SubmissionRequest,
        ) -> Result<IntakeResponse, RegistryError> {
            Err(RegistryError::Transport("connection refused".into()))
        }
    }

    async fn gateway_transport() -> (GatewayTransport, TempDir) {
        let db = Arc::new(RegistryDb::open_in_memory().unwrap());
        let dir = TempDir::new().unwrap();
        let blobs = Arc::new(BlobStore::new(dir.path()).await.unwrap());
        (
            GatewayTransport {
                gateway: Gateway::new(db, blobs),
            },
            dir,
        )
    }

    fn local_store() -> DraftStore {
        let mut store = DraftStore::new();
        store.set_active(Variant::Local);
        store.local = fixtures::clean_local_draft();
        store
    }

    #[tokio::test]
    async fn test_successful_submission_clears_draft() {
        let (transport, _dir) = gateway_transport().await;
        let mut store = local_store();
        let guard = SubmissionGuard::new();

        let id = submit_active_draft(
            &mut store,
            &fixtures::clean_local_bundle(),
            &guard,
            &transport,
            &FixedCaptcha("tok".into()),
            &Anonymous,
        )
        .await
        .unwrap();

        assert!(!id.is_empty());
        assert_eq!(store.local, LocalDraft::default());
        assert!(!guard.is_in_flight());
    }

    #[tokio::test]
    async fn test_invalid_draft_never_reaches_transport() {
        let (transport, _dir) = gateway_transport().await;
        let mut store = local_store();
        store.update_local(|d| d.phone = "123".into());
        let guard = SubmissionGuard::new();

        let result = submit_active_draft(
            &mut store,
            &fixtures::clean_local_bundle(),
            &guard,
            &transport,
            &FixedCaptcha("tok".into()),
            &Anonymous,
        )
        .await;

        assert!(matches!(result, Err(RegistryError::InvalidInput(_))));
        // Nothing was uploaded.
        assert_eq!(transport.gateway.db_stats().unwrap().project_count, 0);
        // Draft kept for fixing.
        assert_eq!(store.local.owner_name, "Asha Nair");
    }

    #[tokio::test]
    async fn test_transport_failure_preserves_draft_for_retry() {
        let mut store = local_store();
        let guard = SubmissionGuard::new();

        let result = submit_active_draft(
            &mut store,
            &fixtures::clean_local_bundle(),
            &guard,
            &DeadTransport,
            &FixedCaptcha("tok".into()),
            &Anonymous,
        )
        .await;

        assert!(matches!(result, Err(RegistryError::Transport(_))));
        assert_eq!(store.local, fixtures::clean_local_draft());

        // The guard released; a manual retry can begin.
        assert!(!guard.is_in_flight());
        let (transport, _dir) = gateway_transport().await;
        let id = submit_active_draft(
            &mut store,
            &fixtures::clean_local_bundle(),
            &guard,
            &transport,
            &FixedCaptcha("tok".into()),
            &Anonymous,
        )
        .await
        .unwrap();
        assert!(!id.is_empty());
    }

    #[tokio::test]
    async fn test_guard_blocks_second_submission_in_flight() {
        let guard = SubmissionGuard::new();
        let permit = guard.begin().unwrap();
        assert!(guard.is_in_flight());
        assert!(guard.begin().is_none());

        drop(permit);
        assert!(!guard.is_in_flight());
        assert!(guard.begin().is_some());
    }

    #[tokio::test]
    async fn test_rejected_reply_surfaces_error_and_keeps_draft() {
        let (transport, _dir) = gateway_transport().await;
        let store = local_store();
        let guard = SubmissionGuard::new();

        // Server-side rejection path: strip the bundle so the gateway's own
        // rule engine refuses it. Client validation is bypassed by sending
        // an empty bundle draft straight through a hand-built request.
        let draft = store.active_draft();
        let payload = crate::assemble::assemble(&draft, &EvidenceBundle::new());
        let reply = transport
            .send(SubmissionRequest {
                content_type: payload.content_type(),
                body: payload.to_bytes(),
                captcha_token: "tok".into(),
                identity_token: None,
            })
            .await
            .unwrap();

        assert!(!reply.success);
        assert!(reply.error.unwrap().contains("photos"));
        assert_eq!(store.local, fixtures::clean_local_draft());
        assert!(!guard.is_in_flight());
    }
}
