use std::any;
use std::fmt::{self, Debug, Formatter};

pub struct DebugRaw(pub String);

impl Debug for DebugRaw {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The name of `T` without its module path, wrapped so that Debug doesn't quote it.
pub fn raw_type_name<T: ?Sized>() -> DebugRaw {
    let full = any::type_name::<T>();
    DebugRaw(full.rsplit("::").next().unwrap_or(full).to_owned())
}
