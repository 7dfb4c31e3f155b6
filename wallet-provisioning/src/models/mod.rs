pub mod challenge;
pub mod completion_material;
pub mod options;
pub mod session;
