//! Bridges to the [`std::io`] traits, so a [`FileStream`] composes with `write!`, `BufReader`,
//! `io::copy` and friends. Errors are recorded on the stream as with every other operation.

use std::io::{self, Read, Seek, SeekFrom, Write};

use super::stream::{Direction, readable, writable};
use super::{Element, FileStream, Origin};
use crate::fs::{ShortTransferError, StreamError};

impl<C: Element> FileStream<C> {
    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        if self.end_of_file || buf.is_empty() {
            readable(&mut self.state, false, None)?;
            return Ok(0);
        }
        let state = readable(&mut self.state, false, None)?;
        state.switch_to(Direction::Reading)?;
        let read = state.raw.read_bytes(buf);
        state.position = None;
        self.end_of_file |= state.at_end();
        read
    }

    fn write_bytes(&mut self, buf: &[u8]) -> Result<usize, StreamError> {
        let state = writable(&mut self.state, None)?;
        state.switch_to(Direction::Writing)?;
        let written = state.raw.write_from(buf);
        state.wrote();
        self.end_of_file |= state.at_end();
        match written? {
            0 if !buf.is_empty() => Err(ShortTransferError.into()),
            count => Ok(count),
        }
    }
}

impl<C: Element> Read for FileStream<C> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let result = self.read_bytes(buf);
        Ok(self.record(result)?)
    }
}

impl<C: Element> Write for FileStream<C> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let result = self.write_bytes(buf);
        Ok(self.record(result)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        let result = match writable(&mut self.state, None) {
            Ok(state) => state.raw.flush(),
            Err(error) => Err(error),
        };
        Ok(self.record(result)?)
    }
}

impl<C: Element> Seek for FileStream<C> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let (offset, origin) = match pos {
            SeekFrom::Start(offset) => {
                let offset = i64::try_from(offset).map_err(|_| io::ErrorKind::InvalidInput)?;
                (offset, Origin::Start)
            },
            SeekFrom::Current(offset) => (offset, Origin::Current),
            SeekFrom::End(offset) => (offset, Origin::End),
        };
        self.point_to(offset, origin)?;
        Ok(self.position()?)
    }
}
