use std::error::Error;

use derive_more::{Display, Error};

pub trait Panic: Error {
    fn panic(&self) -> ! {
        panic!("{}", self)
    }
}

#[derive(Debug, Display, Error)]
#[display("stdio stream corruption")]
pub struct BadStreamPanic;
impl Panic for BadStreamPanic {}
