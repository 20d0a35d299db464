//! Redirect responses produced while normalizing a request.

use serde::Serialize;

/// Why a redirect was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectReason {
    /// Over-encoded `;` in an emailed activation link.
    ActivationLink,
    /// Bare `msg=N` resolved to its topic.
    MessageToTopic,
    /// Requested slug differs from the canonical one.
    CanonicalSlug,
}

impl RedirectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedirectReason::ActivationLink => "activation_link",
            RedirectReason::MessageToTopic => "message_to_topic",
            RedirectReason::CanonicalSlug => "canonical_slug",
        }
    }
}

/// A terminal redirect: emit it and stop processing the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Redirect {
    /// Absolute target in flat-query form.
    pub location: String,
    pub permanent: bool,
    pub reason: RedirectReason,
}

impl Redirect {
    pub fn permanent(location: impl Into<String>, reason: RedirectReason) -> Self {
        Self {
            location: location.into(),
            permanent: true,
            reason,
        }
    }

    pub fn temporary(location: impl Into<String>, reason: RedirectReason) -> Self {
        Self {
            location: location.into(),
            permanent: false,
            reason,
        }
    }

    /// 301 or 302.
    pub fn status_code(&self) -> u16 {
        if self.permanent {
            301
        } else {
            302
        }
    }
}
