//! Model serialization and deserialization.
//!
//! - [`native`]: 24-byte header + Postcard payload container
//! - [`payload`]: versioned payload structures
//! - [`load_model`] / [`save_model`] / [`save_booster`]: file-level entry points

mod load;
pub mod native;
pub mod payload;

pub use load::{
    LoadError, PersistedModel, decode, encode_booster, encode_model, load_model, save_booster,
    save_model,
};
pub use native::{
    CURRENT_VERSION_MAJOR, CURRENT_VERSION_MINOR, DeserializeError, FormatHeader, HEADER_SIZE,
    MAGIC, ModelType, NativeCodec, SerializeError,
};
pub use payload::{ConfigPayload, ForestPayload, ModelMetadata, Payload, PayloadV1, TreePayload};
