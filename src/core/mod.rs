pub mod context;
pub mod identity;
pub mod instance;
pub mod label_codec;
pub mod pipeline;
pub mod router_chain;

pub use context::{LabelSet, RoutingContext};
pub use identity::{LocalIdentity, Location};
pub use instance::{DEFAULT_WEIGHT, ServiceInstanceRecord, ServiceInstanceSnapshot, ServiceKey};
pub use label_codec::{LabelDecodeError, Labels, decode_labels, encode_labels};
pub use pipeline::{DEFAULT_LABEL_HEADER, InboundRequest, RoutingError, RoutingPipeline};
pub use router_chain::{
    RouterChain, RouterFlags, RouterInvocationRequest, RouterInvocationResult, RouterKind,
    RouterMetadataBag, SourceService,
};
