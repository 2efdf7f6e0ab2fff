//! Conversations domain layer: entities and validation rules

pub mod entities;
