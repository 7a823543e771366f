//! Low-level SMTP client: stream handling, transparency codec, line I/O

mod codec;
mod inner;
pub mod mock;
pub mod net;

pub use self::codec::*;
pub use self::inner::*;
