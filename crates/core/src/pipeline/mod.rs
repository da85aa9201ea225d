pub mod frame_processor;
pub mod pacer;
pub mod pipeline_logger;
