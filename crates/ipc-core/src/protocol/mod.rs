//! Protocol module containing digest math, the MULTITRANS text codec, and
//! the binary interleave framing.

pub mod codec;
pub mod digest;
pub mod interleave;
pub mod multitrans;

pub use codec::ProtocolError;
pub use digest::{login_digest, DigestChallenge, DigestCredentials};
pub use interleave::{InterleaveFrame, INTERLEAVE_MARKER, TALK_CHANNEL_ID};
pub use multitrans::{MultitransRequest, MultitransResponse};
