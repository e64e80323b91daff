pub mod request_gate;

pub use request_gate::{
    authenticated_user, AuthenticatedUser, RequestGate, RequestGateLayer, PUBLIC_METHODS,
};
