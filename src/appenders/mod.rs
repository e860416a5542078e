//! Concrete adapters

pub mod encoder;

#[cfg(feature = "console")]
pub mod console;
#[cfg(feature = "console")]
pub mod style;

pub use encoder::{
    Encoder, EncoderAdapter, JsonEncoder, LogfmtEncoder, ENCODE_ERROR_MARKER, SHADOWED_KEY_PREFIX,
};

#[cfg(feature = "console")]
pub use console::ConsoleAdapter;
#[cfg(feature = "console")]
pub use style::{render, Style};
