//! UCI engine client: wire codec, conversation state machine, transports
//! and reconnection supervision.

pub mod continuation;
pub mod link;
pub mod protocol;
pub mod supervisor;
pub mod transport;
pub mod uci;

pub use continuation::ContinuationQueue;
pub use link::{EngineLink, LinkEvent};
pub use protocol::{BestMoveOutcome, EngineProtocol, ProtocolError, ProtocolState, StopAck};
pub use supervisor::{ReconnectPolicy, RetryDecision, Supervisor};
pub use transport::{
    in_process, transport_for, ChannelTransport, Endpoint, InProcessListener, ProcessTransport,
    TcpTransport, Transport, TransportError, TransportEvent, WorkerConnection,
};
pub use uci::{
    parse_uci_message, EngineCommand, EngineInfo, EngineOption, GoParams, UciError, UciMessage,
};
