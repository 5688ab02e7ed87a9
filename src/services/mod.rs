//! Service layer for I/O operations

pub mod io;

pub use io::ImageIoService;
