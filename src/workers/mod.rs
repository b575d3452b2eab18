pub mod encoder;
pub mod master;
pub mod pipeline;
pub mod probe;
pub mod renditions;
