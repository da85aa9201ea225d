pub mod filtering;
pub mod motion;
pub mod pipeline;
pub mod shared;
pub mod video;
