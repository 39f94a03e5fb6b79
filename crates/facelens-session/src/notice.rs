//! User-visible notices raised by the controller

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeKind {
    /// Camera permission was refused; offers to ask again
    PermissionRequired,
    /// License validation failed; transient
    InvalidLicense,
    /// Idle timeout reached; the session is about to end
    IdleTimeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeAction {
    Allow,
    Deny,
    Ok,
}

impl fmt::Display for NoticeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NoticeAction::Allow => "ALLOW",
            NoticeAction::Deny => "DENY",
            NoticeAction::Ok => "OK",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub message: String,
    pub actions: Vec<NoticeAction>,
    /// Can be dismissed without choosing an action
    pub cancelable: bool,
    /// Toast-style, goes away on its own
    pub transient: bool,
}

impl Notice {
    pub const PERMISSION_MESSAGE: &'static str = "If you reject permission, you can not use this service\n\nPlease turn on permissions at [Setting] > [Permission]";

    pub fn permission_required() -> Self {
        Notice {
            kind: NoticeKind::PermissionRequired,
            title: "Permission".to_string(),
            message: Self::PERMISSION_MESSAGE.to_string(),
            actions: vec![NoticeAction::Allow, NoticeAction::Deny],
            cancelable: false,
            transient: false,
        }
    }

    pub fn invalid_license() -> Self {
        Notice {
            kind: NoticeKind::InvalidLicense,
            title: String::new(),
            message: "Invalid license".to_string(),
            actions: Vec::new(),
            cancelable: true,
            transient: true,
        }
    }

    pub fn idle_timeout(message: impl Into<String>) -> Self {
        Notice {
            kind: NoticeKind::IdleTimeout,
            title: "Alert".to_string(),
            message: message.into(),
            actions: vec![NoticeAction::Ok],
            cancelable: true,
            transient: false,
        }
    }

    pub fn offers(&self, action: NoticeAction) -> bool {
        self.actions.contains(&action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_notice_is_blocking() {
        let notice = Notice::permission_required();
        assert!(!notice.cancelable);
        assert!(notice.offers(NoticeAction::Allow));
        assert!(notice.offers(NoticeAction::Deny));
        assert!(!notice.offers(NoticeAction::Ok));
    }

    #[test]
    fn test_idle_notice() {
        let notice = Notice::idle_timeout("bye");
        assert_eq!(notice.kind, NoticeKind::IdleTimeout);
        assert_eq!(notice.actions, vec![NoticeAction::Ok]);
        assert_eq!(notice.message, "bye");
    }

    #[test]
    fn test_action_labels() {
        assert_eq!(NoticeAction::Allow.to_string(), "ALLOW");
        assert_eq!(NoticeAction::Ok.to_string(), "OK");
    }
}
