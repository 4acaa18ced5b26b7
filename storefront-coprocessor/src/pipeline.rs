//! Per-stage processing.

use std::sync::Arc;

use storefront_auth::bearer_token;
use storefront_auth::verify;
use storefront_auth::JwksCache;
use storefront_auth::JwksError;

use crate::stages::Control;
use crate::stages::PipelineStage;
use crate::stages::StagePayload;

const AUTHORIZATION_HEADER: &str = "authorization";

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Verification keys could not be obtained, so the auth gate can neither
    /// admit nor reject the request.
    #[error("could not load verification keys")]
    KeysUnavailable(#[from] JwksError),
}

/// Stage dispatch. Stateless apart from the shared JWKS cache, so a single
/// instance serves all connections.
pub struct Pipeline {
    jwks: Option<Arc<JwksCache>>,
}

impl Pipeline {
    /// When `jwks` is `None` the `RouterRequest` auth gate is disabled and
    /// that stage passes through like any other.
    pub fn new(jwks: Option<Arc<JwksCache>>) -> Self {
        Self { jwks }
    }

    pub async fn handle(&self, mut payload: StagePayload) -> Result<StagePayload, PipelineError> {
        match payload.stage {
            PipelineStage::SubgraphRequest => {
                payload
                    .headers
                    .get_or_insert_default()
                    .insert("source".to_string(), vec!["coprocessor".to_string()]);
                Ok(payload)
            }
            PipelineStage::RouterRequest => match &self.jwks {
                Some(jwks) => self.gate(jwks, payload).await,
                None => Ok(payload),
            },
            // All remaining stages are identity transforms. Listed out so a
            // new stage variant forces a decision here.
            PipelineStage::RouterResponse
            | PipelineStage::SupergraphRequest
            | PipelineStage::SupergraphResponse
            | PipelineStage::ExecutionRequest
            | PipelineStage::ExecutionResponse
            | PipelineStage::SubgraphResponse => Ok(payload),
        }
    }

    /// Reject unauthenticated traffic before it reaches the supergraph.
    ///
    /// A missing or invalid token breaks with 401; only a failure to obtain
    /// verification keys at all is an error.
    async fn gate(
        &self,
        jwks: &JwksCache,
        mut payload: StagePayload,
    ) -> Result<StagePayload, PipelineError> {
        let token = payload
            .header(AUTHORIZATION_HEADER)
            .and_then(bearer_token)
            .map(str::to_owned);
        let Some(token) = token else {
            tracing::debug!("rejecting request without a bearer token");
            payload.control = Some(Control::Break(401));
            return Ok(payload);
        };

        let keys = jwks.get().await?;
        match verify(&token, &keys) {
            Ok(identity) => {
                tracing::debug!(sub = %identity.sub, "admitted authenticated request");
                payload.control = Some(Control::Continue);
                Ok(payload)
            }
            Err(error) => {
                tracing::debug!(%error, "rejecting request with an unverifiable token");
                payload.control = Some(Control::Break(401));
                Ok(payload)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::method;
    use wiremock::matchers::path;
    use wiremock::Mock;
    use wiremock::MockServer;
    use wiremock::ResponseTemplate;

    use super::*;

    fn payload(value: serde_json::Value) -> StagePayload {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn subgraph_requests_are_stamped_and_otherwise_untouched() {
        let pipeline = Pipeline::new(None);
        let input = payload(json!({
            "version": 1,
            "stage": "SubgraphRequest",
            "headers": { "accept": ["application/json"] },
            "body": { "query": "{ __typename }" },
            "serviceName": "products"
        }));

        let output = pipeline.handle(input.clone()).await.unwrap();
        assert_eq!(
            output.headers.as_ref().unwrap()["source"],
            vec!["coprocessor".to_string()]
        );

        let mut expected = input;
        expected
            .headers
            .as_mut()
            .unwrap()
            .insert("source".to_string(), vec!["coprocessor".to_string()]);
        assert_eq!(output, expected);
    }

    #[tokio::test]
    async fn stamping_is_idempotent() {
        let pipeline = Pipeline::new(None);
        let input = payload(json!({ "version": 1, "stage": "SubgraphRequest" }));

        let once = pipeline.handle(input.clone()).await.unwrap();
        let twice = pipeline.handle(once.clone()).await.unwrap();
        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn other_stages_pass_through_unchanged() {
        let pipeline = Pipeline::new(None);
        for stage in [
            "RouterRequest",
            "RouterResponse",
            "SupergraphRequest",
            "SupergraphResponse",
            "ExecutionRequest",
            "ExecutionResponse",
            "SubgraphResponse",
        ] {
            let input = payload(json!({
                "version": 1,
                "stage": stage,
                "headers": { "authorization": ["Bearer not-checked"] },
                "body": { "data": { "me": null } },
                "sdl": "type Query { me: User }"
            }));
            let output = pipeline.handle(input.clone()).await.unwrap();
            assert_eq!(output, input, "{stage} must be an identity transform");
        }
    }

    async fn gated_pipeline() -> (Pipeline, storefront_auth::TokenIssuer, MockServer) {
        let issuer = storefront_auth::TokenIssuer::new(storefront_auth::KeyMaterial::ephemeral());
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jwks.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(issuer.keys().jwks()))
            .mount(&server)
            .await;
        let jwks = JwksCache::new(format!("{}/jwks.json", server.uri()).parse().unwrap());
        (Pipeline::new(Some(Arc::new(jwks))), issuer, server)
    }

    #[tokio::test]
    async fn router_requests_without_a_token_break_with_401() {
        let (pipeline, _issuer, _server) = gated_pipeline().await;
        let input = payload(json!({
            "version": 1,
            "stage": "RouterRequest",
            "headers": { "accept": ["application/json"] },
            "body": { "query": "{ me { id } }" }
        }));

        let output = pipeline.handle(input.clone()).await.unwrap();
        assert_eq!(output.control, Some(Control::Break(401)));
        // the payload itself is returned as-is
        assert_eq!(output.headers, input.headers);
        assert_eq!(output.body, input.body);
    }

    #[tokio::test]
    async fn router_requests_with_a_garbage_token_break_with_401() {
        let (pipeline, _issuer, _server) = gated_pipeline().await;
        let output = pipeline
            .handle(payload(json!({
                "version": 1,
                "stage": "RouterRequest",
                "headers": { "authorization": ["Bearer not.a.token"] }
            })))
            .await
            .unwrap();
        assert_eq!(output.control, Some(Control::Break(401)));
    }

    #[tokio::test]
    async fn router_requests_with_a_valid_token_continue() {
        let (pipeline, issuer, _server) = gated_pipeline().await;
        let token = issuer.issue("user:1", "user1", &[]).unwrap();
        let output = pipeline
            .handle(payload(json!({
                "version": 1,
                "stage": "RouterRequest",
                "headers": { "Authorization": [format!("Bearer {token}")] }
            })))
            .await
            .unwrap();
        assert_eq!(output.control, Some(Control::Continue));
    }

    #[tokio::test]
    async fn an_unreachable_key_set_is_an_error_not_a_401() {
        let jwks = JwksCache::new("http://127.0.0.1:9/jwks.json".parse().unwrap());
        let pipeline = Pipeline::new(Some(Arc::new(jwks)));
        let result = pipeline
            .handle(payload(json!({
                "version": 1,
                "stage": "RouterRequest",
                "headers": { "authorization": ["Bearer not.a.token"] }
            })))
            .await;
        assert!(matches!(result, Err(PipelineError::KeysUnavailable(_))));
    }
}
