// src/lib.rs

//! Postboard: event, job and internship postings from feeds to ranked answers.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
