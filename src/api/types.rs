//! JSON bodies exchanged between the client and the service.

use crate::libs::task::{TaskList, TaskRecord, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct AuthStatusResponse {
    pub authenticated: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CsrfTokenResponse {
    pub csrf_token: String,
}

/// `GET /api/tasks` response.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TasksSnapshot {
    pub items: TaskList,
    pub last_saved: Option<Timestamp>,
}

/// `PUT /api/tasks` request, as sent by the client.
#[derive(Serialize, Clone, Copy, Debug)]
pub struct SaveRequest<'a> {
    pub items: &'a [TaskRecord],
}

/// `PUT /api/tasks` response.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SaveReceipt {
    pub success: bool,
    pub last_saved: Timestamp,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: Timestamp,
}

/// Name of the session cookie set by `POST /api/login`.
pub const SESSION_COOKIE: &str = "taskvault.sid";

/// Header that carries the CSRF token on `PUT /api/tasks`.
pub const CSRF_HEADER: &str = "x-csrf-token";
