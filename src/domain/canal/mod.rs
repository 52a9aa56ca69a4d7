pub mod codec;
pub mod gate;
pub mod link;
pub mod protocol;
