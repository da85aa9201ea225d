pub mod contour_drawer;
pub mod motion_extraction;
