mod controller;
mod error;
mod intent;
mod state;
mod status;
mod ticket;

pub use controller::{AuthFlowController, Dispatched, FlowSnapshot, PendingOperation, Resolution};
pub use error::{FlowError, ValidationError};
pub use intent::{Intent, IntentKind, IntentParseError};
pub use state::{FlowState, Transition};
pub use status::StatusLine;
pub use ticket::{OperationId, OperationTicket};
