//! Signal codec: CAN frames to physical values and back.

pub mod decode;
pub mod encode;
pub mod frame;
pub mod register;
