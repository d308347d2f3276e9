mod descriptor;
mod payload;
mod sample;

pub use descriptor::TrackDescriptor;
pub use payload::{PayloadDescriptor, PayloadIndex};
pub use sample::Payload;
