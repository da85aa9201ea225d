pub mod frame_transform;
