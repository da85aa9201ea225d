pub mod contour;
pub mod motion_extractor;
pub mod running_average;
