#![allow(dead_code)]

pub mod mock_sink;
pub mod workbook_builder;
