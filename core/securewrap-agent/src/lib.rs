//! SecureWrap agent.
//!
//! The agent is the logic every package executes: it checks the device with
//! the Authority, asks for the password, verifies it, and restores the
//! plaintext. Denial, unreachable Authority or a corrupted payload destroy
//! the package; cancelling the prompt leaves it untouched.
//!
//! All collaborators are injected, so the protocol runs unchanged against a
//! remote Authority and real interfaces, or against in-process fakes.

mod agent;
mod console;
mod destroy;
mod error;
mod state;

pub use agent::{Agent, MSG_CORRUPTED, MSG_DEVICE_DENIED, MSG_FINGERPRINT, MSG_UNREACHABLE};
pub use console::{Console, TerminalConsole};
pub use destroy::{DESTROY_EXIT_CODE, Destroyer, GRACE_DELAY_SECS, SelfDestruct, deletion_script};
pub use error::{AgentError, AgentResult, Stage};
pub use state::{AgentState, Outcome};
