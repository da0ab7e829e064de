pub mod history;
pub mod model;
pub mod predict;
pub mod train;
