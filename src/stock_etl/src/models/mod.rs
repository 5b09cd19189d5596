pub mod artifact;
pub mod bar;
pub mod dataset;
pub mod raw_frame;
pub mod symbol_history;
pub mod window;
