pub mod combinations;
pub mod text;
