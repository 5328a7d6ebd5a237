mod frame_control;
mod mac_address;
mod security;

pub use frame_control::FrameControl;
pub use mac_address::*;
pub use security::Security;
