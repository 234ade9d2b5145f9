//! Test support: an in-process RAOP receiver

pub mod mock_receiver;

pub use mock_receiver::{
    MOCK_JACK_STATUS, MOCK_SESSION, MockReceiver, MockReceiverConfig, MockReceiverError,
    MockReceiverState, decrypt_packet,
};
