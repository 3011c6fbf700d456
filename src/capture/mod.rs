pub mod decode;
pub mod queue;
pub mod record;

pub use config::{capture, Config};
pub use decode::{decode, Event, Network, Transport};
pub use queue::{Queue, Work};
pub use record::{Fingerprint, FlowRecord, Ports};
pub use source::Source;

mod config;
mod source;
