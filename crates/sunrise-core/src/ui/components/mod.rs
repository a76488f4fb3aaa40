pub mod button;
pub mod text;
