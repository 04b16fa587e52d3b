// src/api/types.rs

use serde::{Deserialize, Serialize};

use crate::core::advisor::Backend;
use crate::core::orchestrator::SubmitRequest;

/// Request body for `POST /optimize`.
#[derive(Debug, Clone, Deserialize)]
pub struct OptimizeRequest {
    /// Missing code is rejected by submission validation, not by the decoder.
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub iterations: Option<u32>,
    #[serde(default)]
    pub runs: Option<u32>,
    #[serde(default, alias = "use_claude")]
    pub use_hosted_backend: bool,
    /// Bearer credential for the hosted backend. Never echoed back.
    #[serde(default, alias = "api_key")]
    pub credential: Option<String>,
}

impl From<OptimizeRequest> for SubmitRequest {
    fn from(body: OptimizeRequest) -> Self {
        SubmitRequest {
            code: body.code,
            iterations: body.iterations,
            runs: body.runs,
            backend: Backend::from_submission(body.use_hosted_backend, body.credential),
        }
    }
}

/// Response for task submission.
#[derive(Debug, Serialize, Deserialize)]
pub struct OptimizeResponse {
    pub task_id: String,
}

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
