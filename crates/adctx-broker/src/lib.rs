//! Correlates server-initiated requests with replies from a single external
//! duplex peer.

pub mod broker;
pub mod wire;

pub use broker::{CorrelationBroker, EscrowChannel, Exchange, PeerId};
pub use wire::{
    ClientMessage, OperationResultPayload, RequestKind, ServerMessage, decrypt_payload,
    escrow_payload,
};
