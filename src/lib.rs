extern crate byteorder;
#[macro_use]
extern crate log;

pub mod disk;
mod error;
pub mod fs;
pub mod part;

pub use error::*;

#[cfg(test)]
extern crate better_panic;

#[cfg(test)]
pub(crate) fn tests_init() {
    better_panic::install();
}
