pub mod linalg;
pub mod periodic;
