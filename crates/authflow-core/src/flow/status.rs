use serde::{Deserialize, Serialize};

/// Last success or failure text shown alongside the current view.
///
/// At most one of the two is populated at any time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusLine {
    status: Option<String>,
    error: Option<String>,
}

impl StatusLine {
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.error.is_none()
    }

    pub(crate) fn clear(&mut self) {
        self.status = None;
        self.error = None;
    }

    pub(crate) fn succeed(&mut self, message: impl Into<String>) {
        self.error = None;
        self.status = Some(message.into());
    }

    pub(crate) fn fail(&mut self, message: impl Into<String>) {
        self.status = None;
        self.error = Some(message.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_replaces_error() {
        let mut line = StatusLine::default();
        line.fail("boom");
        line.succeed("ok");
        assert_eq!(line.status(), Some("ok"));
        assert_eq!(line.error(), None);
    }

    #[test]
    fn failure_replaces_status() {
        let mut line = StatusLine::default();
        line.succeed("ok");
        line.fail("boom");
        assert_eq!(line.status(), None);
        assert_eq!(line.error(), Some("boom"));
    }

    #[test]
    fn clear_empties_both() {
        let mut line = StatusLine::default();
        line.succeed("ok");
        line.clear();
        assert!(line.is_empty());
    }
}
