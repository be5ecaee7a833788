mod feedback;
mod row;

pub use feedback::*;
pub use row::*;
