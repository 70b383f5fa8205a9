use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{
    auth::Session,
    capability::{Capability, Role},
};

/// SessionView
///
/// Response of `GET /api/session`. The dashboard uses it to decide which controls to render
/// (role-gated buttons, the rollup wizard entry point) without parsing the cookie itself.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq, Default)]
#[ts(export)]
pub struct SessionView {
    /// A non-empty session cookie was sent.
    pub authenticated: bool,
    /// The cookie was verified against the configured session secret.
    pub verified: bool,
    pub user_id: Option<String>,
    pub role: Option<Role>,
    /// Capabilities granted by `role`; empty when the session is not verified.
    pub capabilities: Vec<Capability>,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        match session {
            Session::Anonymous => SessionView::default(),
            Session::Opaque => SessionView {
                authenticated: true,
                ..SessionView::default()
            },
            Session::Verified(user) => SessionView {
                authenticated: true,
                verified: true,
                user_id: Some(user.id.clone()),
                role: Some(user.role),
                capabilities: user.subject().capabilities().collect(),
            },
        }
    }
}
