use std::sync::Arc;

use crate::models::Session;
use crate::policy::AccessPolicy;

/// Which of the three console regions is shown
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleMode {
    LoggedOut,
    Authorized(Session),
    Denied(Session),
}

impl ConsoleMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsoleMode::LoggedOut => "logged_out",
            ConsoleMode::Authorized(_) => "authorized",
            ConsoleMode::Denied(_) => "denied",
        }
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            ConsoleMode::LoggedOut => None,
            ConsoleMode::Authorized(s) | ConsoleMode::Denied(s) => Some(s),
        }
    }

    pub fn visibility(&self) -> Visibility {
        match self {
            ConsoleMode::LoggedOut => Visibility {
                login: true,
                manage: false,
                denied: false,
                logout_button: false,
            },
            ConsoleMode::Authorized(_) => Visibility {
                login: false,
                manage: true,
                denied: false,
                logout_button: true,
            },
            ConsoleMode::Denied(_) => Visibility {
                login: false,
                manage: false,
                denied: true,
                logout_button: false,
            },
        }
    }
}

/// Region visibility; exactly one of `login`, `manage`, `denied` is set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visibility {
    pub login: bool,
    pub manage: bool,
    pub denied: bool,
    pub logout_button: bool,
}

/// Session changes reported by the auth layer
#[derive(Debug, Clone)]
pub enum AuthEvent {
    /// Session present when the console is first shown
    InitialSession(Option<Session>),
    SignedIn(Session),
    SignedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub changed: bool,
    /// Entered `Authorized`; the image list must be loaded
    pub reload_required: bool,
}

impl Transition {
    fn unchanged() -> Self {
        Self {
            changed: false,
            reload_required: false,
        }
    }
}

/// Drives the console mode from auth events
pub struct SessionController {
    policy: Arc<dyn AccessPolicy>,
    mode: ConsoleMode,
}

impl SessionController {
    pub fn new(policy: Arc<dyn AccessPolicy>) -> Self {
        Self {
            policy,
            mode: ConsoleMode::LoggedOut,
        }
    }

    pub fn mode(&self) -> &ConsoleMode {
        &self.mode
    }

    pub fn into_mode(self) -> ConsoleMode {
        self.mode
    }

    pub fn apply(&mut self, event: AuthEvent) -> Transition {
        match event {
            AuthEvent::InitialSession(None) | AuthEvent::SignedOut => self.sign_out(),
            AuthEvent::InitialSession(Some(session)) | AuthEvent::SignedIn(session) => {
                self.sign_in(session)
            }
        }
    }

    fn sign_out(&mut self) -> Transition {
        if self.mode == ConsoleMode::LoggedOut {
            return Transition::unchanged();
        }
        tracing::debug!("Console {} -> logged_out", self.mode.as_str());
        self.mode = ConsoleMode::LoggedOut;
        Transition {
            changed: true,
            reload_required: false,
        }
    }

    fn sign_in(&mut self, session: Session) -> Transition {
        let same_identity = self
            .mode
            .session()
            .is_some_and(|current| current.user_id == session.user_id);
        if same_identity {
            // Only session details can differ
            if let ConsoleMode::Authorized(current) | ConsoleMode::Denied(current) = &mut self.mode {
                *current = session;
            }
            return Transition::unchanged();
        }
        self.sign_out();

        let allowed = self.policy.is_allowed(&session.email);
        self.mode = if allowed {
            ConsoleMode::Authorized(session)
        } else {
            ConsoleMode::Denied(session)
        };
        tracing::debug!("Console logged_out -> {}", self.mode.as_str());

        Transition {
            changed: true,
            reload_required: allowed,
        }
    }
}
