pub(crate) mod access;
pub(crate) mod admin;
pub(crate) mod builder;
pub(crate) mod edit;
pub(crate) mod session;
pub(crate) mod view;

use crate::auth::{AuthPhase, Authorization};
use crate::errors::LabbcatError;
use crate::types::LabbcatUrl;
use access::{Access, AdminAccess, EditAccess, ViewAccess};
use session::Session;
use std::marker::PhantomData;
use std::sync::Arc;

/// _LaBB-CAT_ client with read-only access.
pub type LabbcatView = LabbcatClient<ViewAccess>;

/// _LaBB-CAT_ client which may also edit transcripts.
pub type LabbcatEdit = LabbcatClient<EditAccess>;

/// _LaBB-CAT_ client with administrator access.
pub type LabbcatAdmin = LabbcatClient<AdminAccess>;

/// _LaBB-CAT_ client. Cloning is cheap: clones share their connection pool and
/// negotiated authorization.
pub struct LabbcatClient<A: Access> {
    pub(crate) session: Arc<Session>,
    phantom: PhantomData<A>,
}

impl<A: Access> LabbcatClient<A> {
    pub(crate) fn new(session: Arc<Session>) -> Self {
        Self {
            session,
            phantom: Default::default(),
        }
    }

    /// Get the LaBB-CAT base URL.
    pub fn url(&self) -> &LabbcatUrl {
        self.session.url()
    }

    /// Get the cached authorization, negotiating it if it is not known yet.
    /// `None` means the server does not require authorization.
    pub async fn authorization(&self) -> Result<Option<Authorization>, LabbcatError> {
        self.session.authorization().await
    }

    pub async fn auth_phase(&self) -> AuthPhase {
        self.session.auth_phase().await
    }

    /// Give up the ability to edit or administer.
    pub fn into_view(self) -> LabbcatView {
        LabbcatClient::new(self.session)
    }
}

impl<A: Access> Clone for LabbcatClient<A> {
    fn clone(&self) -> Self {
        Self::new(Arc::clone(&self.session))
    }
}

impl<A: Access> std::fmt::Debug for LabbcatClient<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LabbcatClient")
            .field("url", self.url())
            .finish_non_exhaustive()
    }
}
