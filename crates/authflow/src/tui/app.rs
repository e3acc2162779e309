use authflow_core::flow::{
    AuthFlowController, Dispatched, FlowError, FlowSnapshot, FlowState, Intent,
};
use tokio::sync::watch;
use tracing::debug;

const SPINNER_FRAMES: [char; 4] = ['-', '\\', '|', '/'];
const DEMO_EMAIL: &str = "test@user.com";
const DEMO_PASSWORD: &str = "password123";

/// Editable inputs across all views.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Field {
    Email,
    Password,
    Code,
    RegisterEmail,
    RegisterPassword,
    ResetEmail,
}

impl Field {
    pub fn label(self) -> &'static str {
        match self {
            Field::Email | Field::RegisterEmail | Field::ResetEmail => "Email Address",
            Field::Password => "Password",
            Field::RegisterPassword => "Create Password",
            Field::Code => "Verification Code",
        }
    }

    pub fn is_secret(self) -> bool {
        matches!(self, Field::Password | Field::RegisterPassword)
    }

    fn for_state(state: FlowState) -> &'static [Field] {
        match state {
            FlowState::LoggedOut => &[Field::Email, Field::Password],
            FlowState::Registering => &[Field::RegisterEmail, Field::RegisterPassword],
            FlowState::ResettingPassword => &[Field::ResetEmail],
            FlowState::AwaitingSecondFactor => &[Field::Code],
            FlowState::Authenticated => &[],
        }
    }
}

#[derive(Default)]
struct Forms {
    email: String,
    password: String,
    code: String,
    register_email: String,
    register_password: String,
    reset_email: String,
}

impl Forms {
    fn prefilled() -> Self {
        Self {
            email: DEMO_EMAIL.into(),
            password: DEMO_PASSWORD.into(),
            ..Self::default()
        }
    }

    fn value(&self, field: Field) -> &str {
        match field {
            Field::Email => &self.email,
            Field::Password => &self.password,
            Field::Code => &self.code,
            Field::RegisterEmail => &self.register_email,
            Field::RegisterPassword => &self.register_password,
            Field::ResetEmail => &self.reset_email,
        }
    }

    fn value_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Email => &mut self.email,
            Field::Password => &mut self.password,
            Field::Code => &mut self.code,
            Field::RegisterEmail => &mut self.register_email,
            Field::RegisterPassword => &mut self.register_password,
            Field::ResetEmail => &mut self.reset_email,
        }
    }
}

pub struct App {
    controller: AuthFlowController,
    app_id: String,
    snapshots: watch::Receiver<FlowSnapshot>,
    snapshot: FlowSnapshot,
    forms: Forms,
    focus: usize,
    notice: Option<String>,
    spinner_index: usize,
    show_help_overlay: bool,
}

impl App {
    pub(crate) fn new(controller: AuthFlowController, app_id: impl Into<String>) -> Self {
        let snapshots = controller.subscribe();
        let snapshot = controller.snapshot();
        Self {
            controller,
            app_id: app_id.into(),
            snapshots,
            snapshot,
            forms: Forms::prefilled(),
            focus: 0,
            notice: None,
            spinner_index: 0,
            show_help_overlay: false,
        }
    }

    pub(crate) fn snapshot(&self) -> &FlowSnapshot {
        &self.snapshot
    }

    pub(crate) fn app_id(&self) -> &str {
        &self.app_id
    }

    pub(crate) fn code_length(&self) -> usize {
        self.controller.code_length()
    }

    pub(crate) fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub(crate) fn show_help_overlay(&self) -> bool {
        self.show_help_overlay
    }

    pub(crate) fn toggle_help_overlay(&mut self) {
        self.show_help_overlay = !self.show_help_overlay;
    }

    pub(crate) fn spinner_frame(&self) -> char {
        SPINNER_FRAMES[self.spinner_index % SPINNER_FRAMES.len()]
    }

    /// Fields of the current view with their values and focus flag.
    pub(crate) fn fields(&self) -> Vec<(Field, &str, bool)> {
        Field::for_state(self.snapshot.state)
            .iter()
            .enumerate()
            .map(|(index, field)| (*field, self.forms.value(*field), index == self.focus))
            .collect()
    }

    pub(crate) fn has_fields(&self) -> bool {
        !Field::for_state(self.snapshot.state).is_empty()
    }

    fn focused_field(&self) -> Option<Field> {
        Field::for_state(self.snapshot.state).get(self.focus).copied()
    }

    pub(crate) fn move_focus(&mut self, delta: isize) {
        let len = Field::for_state(self.snapshot.state).len() as isize;
        if len == 0 {
            return;
        }
        self.focus = (self.focus as isize + delta).rem_euclid(len) as usize;
    }

    pub(crate) fn push_char(&mut self, c: char) {
        let code_length = self.code_length();
        if let Some(field) = self.focused_field() {
            let value = self.forms.value_mut(field);
            if field == Field::Code && value.chars().count() >= code_length {
                return;
            }
            value.push(c);
        }
    }

    pub(crate) fn pop_char(&mut self) {
        if let Some(field) = self.focused_field() {
            self.forms.value_mut(field).pop();
        }
    }

    /// Submit the form of the current view; on the dashboard this signs out.
    pub(crate) fn submit(&mut self) {
        let intent = match self.controller.state() {
            FlowState::LoggedOut => {
                Intent::credentials(self.forms.email.clone(), self.forms.password.clone())
            }
            FlowState::Registering => Intent::registration(
                self.forms.register_email.clone(),
                self.forms.register_password.clone(),
            ),
            FlowState::ResettingPassword => Intent::reset_request(self.forms.reset_email.clone()),
            FlowState::AwaitingSecondFactor => Intent::code(self.forms.code.clone()),
            FlowState::Authenticated => Intent::SignOut,
        };
        self.dispatch(intent);
    }

    pub(crate) fn dispatch(&mut self, intent: Intent) {
        self.notice = None;
        match self.controller.dispatch(intent) {
            Ok(Dispatched::Applied(_)) => {}
            Ok(Dispatched::Pending(_)) => self.spinner_index = 0,
            // Shown through the controller's error message.
            Err(FlowError::Validation(_)) => {}
            Err(err) => self.notice = Some(err.to_string()),
        }
        self.sync_snapshot();
    }

    /// Apply finished operations; advance the spinner while one is still running.
    pub(crate) fn poll_pending(&mut self) {
        while let Some(resolution) = self.controller.poll() {
            if let Err(err) = resolution {
                debug!(error = %err, "operation finished with an error");
            }
        }
        if self.controller.is_pending() {
            self.spinner_index = (self.spinner_index + 1) % SPINNER_FRAMES.len();
        }
        self.sync_snapshot();
    }

    /// Pull the latest published snapshot; resets view-local input on state changes.
    pub(crate) fn sync_snapshot(&mut self) {
        if !self.snapshots.has_changed().unwrap_or(false) {
            return;
        }
        let snapshot = self.snapshots.borrow_and_update().clone();
        if snapshot.state != self.snapshot.state {
            self.focus = 0;
            self.forms.code.clear();
            if snapshot.state == FlowState::LoggedOut {
                self.forms.register_password.clear();
            }
        }
        self.snapshot = snapshot;
    }
}
