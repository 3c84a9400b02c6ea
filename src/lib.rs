// src/lib.rs

pub mod boundary;
pub mod config;
pub mod field;
pub mod grid;
pub mod relax;
pub mod solver;
pub mod transfer;
