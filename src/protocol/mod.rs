//! Protocol module

pub mod crypto;
pub mod raop;
pub mod rtsp;
pub mod sdp;
