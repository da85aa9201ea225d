mod border;
pub mod box_filter;
pub mod color;
pub mod gaussian;
pub mod median;
pub mod morphology;
pub mod passthrough;
pub mod threshold;
