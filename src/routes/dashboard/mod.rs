mod handler;

pub use handler::{dashboard, home};
