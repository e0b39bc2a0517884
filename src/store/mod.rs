//! Packed profile documents: model, wire format and accessors.

pub mod decode;
pub mod document;
pub mod encode;
pub mod model;

pub use decode::decode_document;
pub use document::Document;
pub use encode::encode_document;
pub use model::{Flavor, FunctionProfile, Profile, Thread, ThreadKey, UserEventProfile};
