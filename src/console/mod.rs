//! Operator console for a single Smartbike.
//!
//! The console reads a menu selection and a value from the operator, turns
//! them into a payload for the selected channel and publishes it. The flow is
//! strictly one way:
//!
//! ```text
//! operator text ─► validator ─► Value ─► dispatcher ─► encoder ─► Transport::publish
//! ```
//!
//! 1. [`validator`] - re-prompts until text parses as the expected kind
//! 2. [`commands`] - the fixed table of menu keys, channels and value kinds
//! 3. [`encoder`] - per-channel payload framing
//! 4. [`dispatcher`] - one menu round trip
//! 5. [`feedback`] - subscriptions registered once at startup
//! 6. [`control_loop`] - subscriptions, then dispatch until interrupted
//!
//! Inbound feedback never passes through here; it is read by the MQTT event
//! loop task (see [`crate::mqtt::mqtt_handler`]).

pub mod commands;
pub mod control_loop;
pub mod dispatcher;
pub mod encoder;
pub mod error;
pub mod feedback;
pub mod operator;
pub mod validator;

#[cfg(test)]
pub(crate) mod testing;
