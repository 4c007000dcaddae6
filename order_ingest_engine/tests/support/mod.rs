#![allow(dead_code)]

pub mod faults;
pub mod prepare_env;
