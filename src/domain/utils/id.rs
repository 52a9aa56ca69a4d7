use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// Numeric identity of a worker, tagged with the kind of worker it names.
///
/// Identities are 1-based like the console output of the ports; `index()`
/// gives the 0-based position used for the per-worker signal tables.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash, Serialize, Deserialize)]
pub struct Id<T> {
    pub id: usize,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T> Id<T> {
    pub fn new(id: usize) -> Self {
        Id { id, _marker: PhantomData }
    }

    pub fn from_index(index: usize) -> Self {
        Id::new(index + 1)
    }

    pub fn index(&self) -> usize {
        self.id - 1
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:2}", self.id)
    }
}

impl<T> From<Id<T>> for usize {
    fn from(id_wrapper: Id<T>) -> Self {
        id_wrapper.id
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let full_name = std::any::type_name::<T>();
        let clean_name = full_name.split("::").last().unwrap_or(full_name);
        let display_name = clean_name.replace("Tag", "Id");

        write!(f, "{}: {}", display_name, self.id)
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Hash, Copy, Serialize, Deserialize)]
pub struct VesselTag;
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Hash, Copy, Serialize, Deserialize)]
pub struct CraneTag;

pub type VesselId = Id<VesselTag>;
pub type CraneId = Id<CraneTag>;
