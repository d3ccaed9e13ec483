pub mod common;
mod integration;
