//! Decision log entities and the queries mined from them

pub mod entities;
pub mod patterns;
pub mod similarity;
