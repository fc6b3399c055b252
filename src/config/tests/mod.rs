//! Configuration tests, split by concern.

mod helpers;
mod loading;
mod operation_mode;
