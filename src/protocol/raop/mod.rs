//! RAOP (`AirPlay` 1) sender

pub mod identity;
pub mod jack;
mod key_exchange;
pub mod packet;
pub mod session;


pub use identity::{CHALLENGE_SIZE, SessionIdentity};
pub use jack::{JackConnection, JackStatus, JackType};
pub use key_exchange::{AES_IV_SIZE, AES_KEY_SIZE, RaopSessionKeys};
pub use packet::PacketBuffer;
pub use session::{RaopSession, RaopSessionState};
