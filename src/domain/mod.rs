pub mod level;
pub mod unlock;
